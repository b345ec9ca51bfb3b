use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::ids::{AnalysisId, BundleId, EntryId, GlossId, MorphId, MsaId, PosId, SenseId, WordformId, WsId};
use crate::morphology::{Agent, Evaluation, MorphType, Opinion, VariantType};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One string per writing system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct MultiString(BTreeMap<WsId, String>);

impl MultiString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(ws: WsId, text: impl Into<String>) -> Self {
        let mut ms = Self::new();
        ms.set(ws, text);
        ms
    }

    pub fn get(&self, ws: WsId) -> Option<&str> {
        self.0.get(&ws).map(String::as_str)
    }

    /// Non-empty text in `ws`, if any.
    pub fn text(&self, ws: WsId) -> Option<&str> {
        self.get(ws).filter(|s| !s.trim().is_empty())
    }

    pub fn has_text(&self, ws: WsId) -> bool {
        self.text(ws).is_some()
    }

    /// Setting an empty string removes the alternative.
    pub fn set(&mut self, ws: WsId, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.0.remove(&ws);
        } else {
            self.0.insert(ws, text);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|s| s.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (WsId, &str)> + '_ {
        self.0.iter().map(|(ws, s)| (*ws, s.as_str()))
    }

    /// True when every alternative of `other` is present with the same text here.
    pub fn covers(&self, other: &MultiString) -> bool {
        other.iter().all(|(ws, s)| self.get(ws) == Some(s))
    }
}

impl FromIterator<(WsId, String)> for MultiString {
    fn from_iter<I: IntoIterator<Item = (WsId, String)>>(iter: I) -> Self {
        let mut ms = MultiString::new();
        for (ws, text) in iter {
            ms.set(ws, text);
        }
        ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct WritingSystem {
    pub id: WsId,
    /// Language tag ("en", "seh").
    pub tag: String,
    pub vernacular: bool,
    /// Inserted between the parts of a joined phrase. Empty for scripts without spaces.
    pub word_separator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum WordformOrigin {
    /// Produced by tokenizing a text.
    Token,
    /// Produced by joining occurrences into a phrase; holds the joined parts in order.
    Joined(Vec<WordformId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Wordform {
    pub id: WordformId,
    pub form: MultiString,
    pub analyses: Vec<AnalysisId>,
    pub origin: WordformOrigin,
}

impl Wordform {
    pub fn is_phrase(&self) -> bool {
        matches!(self.origin, WordformOrigin::Joined(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Analysis {
    pub id: AnalysisId,
    pub owner: WordformId,
    pub bundles: Vec<BundleId>,
    pub glosses: Vec<GlossId>,
    pub category: Option<PosId>,
    pub human: Option<Evaluation>,
    pub parser: Option<Evaluation>,
}

impl Analysis {
    pub fn evaluation(&self, agent: Agent) -> Option<Evaluation> {
        match agent {
            Agent::Human => self.human,
            Agent::Parser => self.parser,
        }
    }

    pub fn is_approved_by(&self, agent: Agent) -> bool {
        self.evaluation(agent).map_or(false, |e| e.is_approval())
    }

    pub fn is_disapproved_by_human(&self) -> bool {
        matches!(
            self.human,
            Some(Evaluation { opinion: Opinion::Disapproves, .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Gloss {
    pub id: GlossId,
    pub owner: AnalysisId,
    pub form: MultiString,
    /// Store clock the last time an occurrence was committed to this gloss.
    pub last_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct MorphBundle {
    pub id: BundleId,
    pub owner: AnalysisId,
    /// Form text as typed, used when no morph form is linked.
    pub form: MultiString,
    pub morph: Option<MorphId>,
    pub sense: Option<SenseId>,
    pub msa: Option<MsaId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum VariantTarget {
    Entry(EntryId),
    Sense(SenseId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct VariantLink {
    pub target: VariantTarget,
    pub kind: VariantType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct LexEntry {
    pub id: EntryId,
    pub lexeme: MorphId,
    pub alternates: Vec<MorphId>,
    pub citation: MultiString,
    /// 0 when the headword is unique.
    pub homograph: u32,
    pub senses: Vec<SenseId>,
    pub msas: Vec<MsaId>,
    pub variant_of: Vec<VariantLink>,
}

impl LexEntry {
    /// Lexeme form first, then alternates.
    pub fn morphs(&self) -> impl Iterator<Item = MorphId> + '_ {
        core::iter::once(self.lexeme).chain(self.alternates.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct MorphForm {
    pub id: MorphId,
    pub owner: EntryId,
    pub form: MultiString,
    pub morph_type: MorphType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct LexSense {
    pub id: SenseId,
    pub owner: EntryId,
    pub gloss: MultiString,
    pub msa: Option<MsaId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Msa {
    pub id: MsaId,
    pub owner: EntryId,
    pub pos: Option<PosId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct PartOfSpeech {
    pub id: PosId,
    pub name: MultiString,
    pub abbreviation: MultiString,
}
