use std::collections::HashMap;

use anyhow::{Context, Result};
use logos_annotate::{AnnotationSession, SessionConfig};
use logos_protocol::{AnalysisLine, LineConfig, MorphType, MultiString, PosId, TextId, WsId};
use logos_store::{Store, StoreData};
use serde::Deserialize;
use tracing::info;

/// A project file: writing systems, a small lexicon and the texts to import.
#[derive(Debug, Deserialize)]
pub struct Project {
    /// Tag of the vernacular writing system.
    pub vernacular: String,
    /// Tag of the analysis writing system.
    pub analysis: String,
    #[serde(default = "default_separator")]
    pub word_separator: String,
    #[serde(default)]
    pub lexicon: Vec<LexiconEntry>,
    pub texts: Vec<TextSource>,
}

#[derive(Debug, Deserialize)]
pub struct LexiconEntry {
    /// Form with optional markers ("-s", "un-").
    pub form: String,
    /// Overrides the type read from the markers.
    #[serde(default)]
    pub morph_type: Option<MorphType>,
    /// Category name shared by all senses of the entry.
    #[serde(default)]
    pub pos: Option<String>,
    /// One gloss per sense.
    #[serde(default)]
    pub senses: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextSource {
    pub title: String,
    pub content: String,
}

/// Line layout read from TOML. Empty `lines` keeps the standard layout.
#[derive(Debug, Default, Deserialize)]
pub struct LinesFile {
    #[serde(default)]
    pub lines: Vec<AnalysisLine>,
    pub fold_sentence_initial_case: Option<bool>,
}

impl LinesFile {
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).context("invalid lines file")
    }
}

pub struct Loaded {
    pub session: AnnotationSession,
    pub texts: Vec<TextId>,
}

fn default_separator() -> String {
    " ".to_string()
}

impl Project {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("invalid project file")
    }

    /// Builds a store from the project and opens a session over it.
    pub fn build(&self, lines: Option<LinesFile>) -> Result<Loaded> {
        let mut store = Store::new();
        let (vernacular, analysis, texts) = store.setup(|d| self.populate(d))?;
        store.take_changes();

        let mut config = SessionConfig::new(vernacular, analysis);
        if let Some(file) = lines {
            if !file.lines.is_empty() {
                config = config.with_lines(LineConfig::new(file.lines));
            }
            if let Some(fold) = file.fold_sentence_initial_case {
                config.fold_sentence_initial_case = fold;
            }
        }
        info!(texts = texts.len(), entries = self.lexicon.len(), "project loaded");
        Ok(Loaded {
            session: AnnotationSession::new(store, config),
            texts,
        })
    }

    fn populate(&self, d: &mut StoreData) -> Result<(WsId, WsId, Vec<TextId>)> {
        let vernacular =
            d.add_writing_system(self.vernacular.as_str(), true, self.word_separator.as_str());
        let analysis = d.add_writing_system(self.analysis.as_str(), false, " ");

        let mut categories: HashMap<&str, PosId> = HashMap::new();
        for item in &self.lexicon {
            let (marked, bare) = MorphType::parse_marked(&item.form);
            let entry = d.create_entry(
                MultiString::single(vernacular, bare),
                item.morph_type.unwrap_or(marked),
            );
            let msa = match item.pos.as_deref() {
                Some(name) => {
                    let pos = *categories.entry(name).or_insert_with(|| {
                        d.create_pos(
                            MultiString::single(analysis, name),
                            MultiString::single(analysis, name),
                        )
                    });
                    Some(d.create_msa(entry, Some(pos))?)
                }
                None => None,
            };
            for gloss in &item.senses {
                d.create_sense(entry, MultiString::single(analysis, gloss.as_str()), msa)?;
            }
        }

        let mut texts = Vec::new();
        for text in &self.texts {
            let id = logos_parser::import_text(d, &text.title, vernacular, &text.content)
                .with_context(|| format!("importing {:?}", text.title))?;
            texts.push(id);
        }
        Ok((vernacular, analysis, texts))
    }
}
