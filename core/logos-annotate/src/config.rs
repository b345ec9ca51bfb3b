use logos_protocol::{AnalysisLine, LineConfig, LineKind, WsId};
use serde::{Deserialize, Serialize};

/// Line layout and default writing systems of an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub lines: LineConfig,
    pub vernacular: WsId,
    pub analysis: WsId,
    /// Lower-case a Title-case word at the start of a sentence when the
    /// lower-case wordform exists.
    #[serde(default = "default_fold")]
    pub fold_sentence_initial_case: bool,
}

fn default_fold() -> bool {
    true
}

impl SessionConfig {
    pub fn new(vernacular: WsId, analysis: WsId) -> Self {
        Self {
            lines: LineConfig::standard(),
            vernacular,
            analysis,
            fold_sentence_initial_case: true,
        }
    }

    pub fn with_lines(mut self, lines: LineConfig) -> Self {
        self.lines = lines;
        self
    }

    pub fn ws_of(&self, line: &AnalysisLine) -> WsId {
        line.ws.resolve(self.vernacular, self.analysis)
    }

    /// Writing systems shown by the lines of the given kinds, in line order.
    pub fn writing_systems(&self, kinds: &[LineKind]) -> Vec<WsId> {
        let mut found = Vec::new();
        for line in self.lines.lines.iter().filter(|l| kinds.contains(&l.kind)) {
            let ws = self.ws_of(line);
            if !found.contains(&ws) {
                found.push(ws);
            }
        }
        found
    }

    /// Where entry headwords are written. Never empty.
    pub fn entry_ws(&self) -> Vec<WsId> {
        self.or_default(
            self.writing_systems(&[LineKind::Morphemes, LineKind::LexEntries]),
            self.vernacular,
        )
    }

    /// Where word glosses are staged. Never empty.
    pub fn gloss_ws(&self) -> Vec<WsId> {
        self.or_default(self.writing_systems(&[LineKind::WordGloss]), self.analysis)
    }

    fn or_default(&self, mut found: Vec<WsId>, fallback: WsId) -> Vec<WsId> {
        if found.is_empty() {
            found.push(fallback);
        }
        found
    }
}
