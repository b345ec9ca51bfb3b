use alloc::vec::Vec;

use bitflags::bitflags;

use crate::ids::WsId;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One row of the interlinear display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineKind {
    Word,
    Morphemes,
    LexEntries,
    LexGloss,
    LexPos,
    WordGloss,
    WordPos,
    FreeTranslation,
    LiteralTranslation,
    Note,
}

impl LineKind {
    /// Segment-level lines (translations and notes).
    pub fn is_annotation(self) -> bool {
        matches!(
            self,
            LineKind::FreeTranslation | LineKind::LiteralTranslation | LineKind::Note
        )
    }

    pub fn is_word_level(self) -> bool {
        !self.is_annotation()
    }

    pub fn flag(self) -> LineKinds {
        match self {
            LineKind::Word => LineKinds::WORD,
            LineKind::Morphemes => LineKinds::MORPHEMES,
            LineKind::LexEntries => LineKinds::LEX_ENTRIES,
            LineKind::LexGloss => LineKinds::LEX_GLOSS,
            LineKind::LexPos => LineKinds::LEX_POS,
            LineKind::WordGloss => LineKinds::WORD_GLOSS,
            LineKind::WordPos => LineKinds::WORD_POS,
            LineKind::FreeTranslation => LineKinds::FREE_TRANSLATION,
            LineKind::LiteralTranslation => LineKinds::LITERAL_TRANSLATION,
            LineKind::Note => LineKinds::NOTE,
        }
    }
}

bitflags! {
    /// A set of line kinds, e.g. the lines an occurrence still fails.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
    pub struct LineKinds: u16 {
        const WORD = 1;
        const MORPHEMES = 2;
        const LEX_ENTRIES = 4;
        const LEX_GLOSS = 8;
        const LEX_POS = 16;
        const WORD_GLOSS = 32;
        const WORD_POS = 64;

        const FREE_TRANSLATION = 128;
        const LITERAL_TRANSLATION = 256;
        const NOTE = 512;

        const ANNOTATIONS = Self::FREE_TRANSLATION.bits()
            | Self::LITERAL_TRANSLATION.bits()
            | Self::NOTE.bits();
    }
}

/// Which writing system a line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WsSelector {
    /// The text's default vernacular writing system.
    Vernacular,
    /// The default analysis writing system.
    Analysis,
    Ws(WsId),
}

impl WsSelector {
    pub fn resolve(self, vernacular: WsId, analysis: WsId) -> WsId {
        match self {
            WsSelector::Vernacular => vernacular,
            WsSelector::Analysis => analysis,
            WsSelector::Ws(ws) => ws,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct AnalysisLine {
    pub kind: LineKind,
    pub ws: WsSelector,
}

impl AnalysisLine {
    pub const fn new(kind: LineKind, ws: WsSelector) -> Self {
        Self { kind, ws }
    }
}

/// Ordered, read-only list of configured lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct LineConfig {
    pub lines: Vec<AnalysisLine>,
}

impl LineConfig {
    pub fn new(lines: Vec<AnalysisLine>) -> Self {
        Self { lines }
    }

    /// Word, morphemes, lex entries, lex gloss, lex POS, word gloss, word POS,
    /// free translation.
    pub fn standard() -> Self {
        use LineKind::*;
        use WsSelector::{Analysis, Vernacular};
        Self::new(alloc::vec![
            AnalysisLine::new(Word, Vernacular),
            AnalysisLine::new(Morphemes, Vernacular),
            AnalysisLine::new(LexEntries, Vernacular),
            AnalysisLine::new(LexGloss, Analysis),
            AnalysisLine::new(LexPos, Analysis),
            AnalysisLine::new(WordGloss, Analysis),
            AnalysisLine::new(WordPos, Analysis),
            AnalysisLine::new(FreeTranslation, Analysis),
        ])
    }

    pub fn with(mut self, line: AnalysisLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn contains(&self, kind: LineKind) -> bool {
        self.lines.iter().any(|l| l.kind == kind)
    }

    pub fn kinds(&self) -> LineKinds {
        self.lines
            .iter()
            .fold(LineKinds::empty(), |acc, l| acc | l.kind.flag())
    }

    pub fn lines_of(&self, kind: LineKind) -> impl Iterator<Item = &AnalysisLine> + '_ {
        self.lines.iter().filter(move |l| l.kind == kind)
    }

    pub fn word_lines(&self) -> impl Iterator<Item = &AnalysisLine> + '_ {
        self.lines.iter().filter(|l| l.kind.is_word_level())
    }

    pub fn annotation_lines(&self) -> impl Iterator<Item = &AnalysisLine> + '_ {
        self.lines.iter().filter(|l| l.kind.is_annotation())
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::standard()
    }
}
