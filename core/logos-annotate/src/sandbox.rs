//! The staging record: one occurrence's analysis, edited in isolation
//! until it is committed or discarded.

use logos_guess::Guess;
use logos_protocol::{
    Agent, EntryId, Interpretation, MorphId, MorphType, MsaId, MultiString, OccurrenceRef, PosId,
    SenseId, WordformId, WsId,
};
use logos_store::{StoreData, VariantGraph};
use tracing::debug;

use crate::config::SessionConfig;
use crate::defaults::{establish_default_entry, establish_default_sense, msa_choice};
use crate::error::{AnnotateError, AnnotateResult};

/// Content of one staged field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Empty,
    /// Filled in by a guess or a lexicon default.
    Guessed(T, Agent),
    /// Typed by the user or copied from the occurrence's own analysis.
    Edited(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Empty
    }
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Empty => None,
            Field::Guessed(v, _) | Field::Edited(v) => Some(v),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Field::Empty)
    }

    pub fn is_guess(&self) -> bool {
        matches!(self, Field::Guessed(..))
    }

    pub fn edited(value: Option<T>) -> Self {
        value.map_or(Field::Empty, Field::Edited)
    }

    pub fn guessed(value: Option<T>, agent: Agent) -> Self {
        value.map_or(Field::Empty, |v| Field::Guessed(v, agent))
    }

    /// Same content, marked as a guess by `agent`.
    pub fn into_guess(self, agent: Agent) -> Self {
        match self {
            Field::Edited(v) | Field::Guessed(v, _) => Field::Guessed(v, agent),
            Field::Empty => Field::Empty,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Field<U> {
        match self {
            Field::Empty => Field::Empty,
            Field::Guessed(v, agent) => Field::Guessed(f(v), *agent),
            Field::Edited(v) => Field::Edited(f(v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChoice {
    pub entry: EntryId,
    /// The morph form the user picked, when known.
    pub morph: Option<MorphId>,
    /// Headword per entry writing system.
    pub display: MultiString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenseChoice {
    pub sense: SenseId,
    pub gloss: MultiString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsaChoice {
    pub msa: MsaId,
    pub pos: Option<PosId>,
    pub abbreviation: MultiString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosChoice {
    pub pos: PosId,
    pub abbreviation: MultiString,
}

/// One morpheme of the staged analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorphSlot {
    /// Form without markers, per vernacular writing system.
    pub form: Field<MultiString>,
    pub morph_type: MorphType,
    pub entry: Field<EntryChoice>,
    pub sense: Field<SenseChoice>,
    pub msa: Field<MsaChoice>,
    /// Set when a referenced lexicon object disappeared.
    pub missing: bool,
}

impl MorphSlot {
    /// A slot with only form text: the courtesy slot of an unanalyzed word.
    pub fn courtesy(form: MultiString) -> Self {
        Self {
            form: Field::Edited(form),
            ..Self::default()
        }
    }

    pub fn prefix_marker(&self) -> &'static str {
        self.morph_type.prefix_marker()
    }

    pub fn postfix_marker(&self) -> &'static str {
        self.morph_type.postfix_marker()
    }

    pub fn form_text(&self, ws: WsId) -> Option<&str> {
        self.form.value().and_then(|f| f.text(ws))
    }

    /// Form with its morph type markers, as shown on the morphemes line.
    pub fn marked_form(&self, ws: WsId) -> Option<String> {
        self.form_text(ws).map(|form| {
            format!("{}{}{}", self.prefix_marker(), form, self.postfix_marker())
        })
    }

    pub fn has_lexical_content(&self) -> bool {
        !(self.entry.is_empty() && self.sense.is_empty() && self.msa.is_empty())
    }

    fn into_guess(self, agent: Agent) -> Self {
        Self {
            form: self.form.into_guess(agent),
            morph_type: self.morph_type,
            entry: self.entry.into_guess(agent),
            sense: self.sense.into_guess(agent),
            msa: self.msa.into_guess(agent),
            missing: self.missing,
        }
    }
}

/// Everything a staging record can hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedContents {
    /// Word text per writing system, from the wordform.
    pub word: MultiString,
    pub morphemes: Vec<MorphSlot>,
    pub word_gloss: Field<MultiString>,
    pub word_pos: Field<PosChoice>,
}

impl StagedContents {
    /// One courtesy slot holding the word text.
    pub fn courtesy(word: MultiString) -> Self {
        Self {
            morphemes: vec![MorphSlot::courtesy(word.clone())],
            word,
            ..Self::default()
        }
    }

    /// Only the courtesy slot: no morpheme breakdown, gloss or category.
    pub fn is_trivial(&self) -> bool {
        self.word_gloss.value().map_or(true, |g| g.is_empty())
            && self.word_pos.is_empty()
            && self.has_courtesy_morphemes()
    }

    /// The morpheme line holds nothing beyond the word itself.
    pub fn has_courtesy_morphemes(&self) -> bool {
        match self.morphemes.as_slice() {
            [] => true,
            [slot] => {
                !slot.has_lexical_content()
                    && slot.morph_type == MorphType::Stem
                    && slot.form.value().map_or(true, |f| self.word.covers(f))
            }
            _ => false,
        }
    }

    pub(crate) fn into_guess(self, agent: Agent) -> Self {
        Self {
            word: self.word,
            morphemes: self
                .morphemes
                .into_iter()
                .map(|s| s.into_guess(agent))
                .collect(),
            word_gloss: self.word_gloss.into_guess(agent),
            word_pos: self.word_pos.into_guess(agent),
        }
    }
}

/// Where a record's initial content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    /// The occurrence's own analysis or gloss.
    Existing(Interpretation),
    Guess(Guess),
    /// Nothing known: the courtesy slot.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRecord {
    pub(crate) occurrence: OccurrenceRef,
    pub(crate) loaded_wordform: WordformId,
    pub(crate) wordform: WordformId,
    pub(crate) source: RecordSource,
    pub(crate) contents: StagedContents,
    pub(crate) initial: StagedContents,
}

impl StagingRecord {
    pub(crate) fn new(
        occurrence: OccurrenceRef,
        loaded_wordform: WordformId,
        wordform: WordformId,
        source: RecordSource,
        contents: StagedContents,
    ) -> Self {
        Self {
            occurrence,
            loaded_wordform,
            wordform,
            source,
            initial: contents.clone(),
            contents,
        }
    }

    pub fn occurrence(&self) -> OccurrenceRef {
        self.occurrence
    }

    /// The wordform that occupied the position when the record was loaded.
    pub fn loaded_wordform(&self) -> WordformId {
        self.loaded_wordform
    }

    /// The wordform the record commits to; differs from
    /// [`StagingRecord::loaded_wordform`] after case folding.
    pub fn wordform(&self) -> WordformId {
        self.wordform
    }

    pub fn is_case_rebound(&self) -> bool {
        self.wordform != self.loaded_wordform
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    pub fn contents(&self) -> &StagedContents {
        &self.contents
    }

    pub fn is_guess_loaded(&self) -> bool {
        matches!(self.source, RecordSource::Guess(_))
    }

    pub fn is_dirty(&self) -> bool {
        self.contents != self.initial
    }

    pub fn should_save(&self, save_guess: bool) -> bool {
        self.is_dirty() || (save_guess && self.is_guess_loaded())
    }

    /// Back to the content the record was loaded with.
    pub fn reset(&mut self) {
        self.contents = self.initial.clone();
    }
}

/// Edit handle over the active record.
pub struct Stage<'a> {
    data: &'a StoreData,
    config: &'a SessionConfig,
    record: &'a mut StagingRecord,
    graph: VariantGraph,
}

impl<'a> Stage<'a> {
    pub(crate) fn new(
        data: &'a StoreData,
        config: &'a SessionConfig,
        record: &'a mut StagingRecord,
    ) -> Self {
        Self {
            data,
            config,
            record,
            graph: VariantGraph::build(data),
        }
    }

    pub fn record(&self) -> &StagingRecord {
        self.record
    }

    fn slot_mut(&mut self, index: usize) -> AnnotateResult<&mut MorphSlot> {
        self.record
            .contents
            .morphemes
            .get_mut(index)
            .ok_or(AnnotateError::NoSuchSlot(index))
    }

    fn slot_with_graph(&mut self, index: usize) -> AnnotateResult<(&VariantGraph, &mut MorphSlot)> {
        let slot = self
            .record
            .contents
            .morphemes
            .get_mut(index)
            .ok_or(AnnotateError::NoSuchSlot(index))?;
        Ok((&self.graph, slot))
    }

    fn is_monomorphemic(&self) -> bool {
        self.record.contents.morphemes.len() == 1
    }

    /// Sets a morpheme's text, markers included ("-s", "un-"), and looks
    /// up the entry it most likely belongs to.
    pub fn set_morpheme_form(&mut self, index: usize, text: &str) -> AnnotateResult<()> {
        let (data, config) = (self.data, self.config);
        let monomorphemic = self.is_monomorphemic();
        let (morph_type, bare) = MorphType::parse_marked(text);
        let (graph, slot) = self.slot_with_graph(index)?;
        let mut form = slot.form.value().cloned().unwrap_or_default();
        form.set(config.vernacular, bare);
        slot.form = if form.is_empty() {
            Field::Empty
        } else {
            Field::Edited(form)
        };
        slot.morph_type = morph_type;
        slot.missing = false;
        establish_default_entry(data, config, slot, graph, bare, morph_type, monomorphemic);
        Ok(())
    }

    /// Links a morpheme to an entry, with an optional explicit sense.
    pub fn set_morph_entry(
        &mut self,
        index: usize,
        entry: EntryId,
        sense: Option<SenseId>,
    ) -> AnnotateResult<()> {
        let (data, config) = (self.data, self.config);
        let lexeme = data.require_entry(entry)?;
        let (graph, slot) = self.slot_with_graph(index)?;

        let form = slot.form_text(config.vernacular).map(str::to_string);
        let morph = lexeme
            .morphs()
            .filter_map(|m| data.morph(m))
            .find(|m| form.is_some() && m.form.get(config.vernacular) == form.as_deref())
            .map(|m| m.id);
        let display = config
            .entry_ws()
            .into_iter()
            .filter_map(|ws| data.headword(entry, ws).map(|h| (ws, h)))
            .collect();
        // A rejected sense leaves the slot as it was.
        let mut updated = slot.clone();
        updated.entry = Field::Edited(EntryChoice {
            entry,
            morph,
            display,
        });
        updated.missing = false;
        establish_default_sense(data, graph, &mut updated, entry, sense, None)?;
        *slot = updated;
        Ok(())
    }

    pub fn set_morph_sense(&mut self, index: usize, sense: SenseId) -> AnnotateResult<()> {
        let data = self.data;
        let owner = data
            .sense(sense)
            .ok_or(logos_store::StoreError::Missing(logos_protocol::ObjectId::Sense(sense)))?
            .owner;
        let entry = self
            .slot_mut(index)?
            .entry
            .value()
            .map(|e| e.entry);
        match entry {
            Some(entry) => {
                let (graph, slot) = self.slot_with_graph(index)?;
                establish_default_sense(data, graph, slot, entry, Some(sense), None)
            }
            // No entry yet: the sense brings its own
            None => self.set_morph_entry(index, owner, Some(sense)),
        }
    }

    pub fn set_morph_msa(&mut self, index: usize, msa: Option<MsaId>) -> AnnotateResult<()> {
        let data = self.data;
        let choice = match msa {
            Some(id) => Some(msa_choice(data, id).ok_or(logos_store::StoreError::Missing(
                logos_protocol::ObjectId::Msa(id),
            ))?),
            None => None,
        };
        self.slot_mut(index)?.msa = Field::edited(choice);
        Ok(())
    }

    /// Sets the word gloss in one writing system; empty text removes it.
    pub fn set_word_gloss(&mut self, ws: WsId, text: &str) {
        let mut gloss = self
            .record
            .contents
            .word_gloss
            .value()
            .cloned()
            .unwrap_or_default();
        gloss.set(ws, text);
        self.record.contents.word_gloss = if gloss.is_empty() {
            Field::Empty
        } else {
            Field::Edited(gloss)
        };
    }

    pub fn set_word_pos(&mut self, pos: Option<PosId>) -> AnnotateResult<()> {
        let choice = match pos {
            Some(id) => {
                let category = self.data.pos(id).ok_or(logos_store::StoreError::Missing(
                    logos_protocol::ObjectId::Pos(id),
                ))?;
                Some(PosChoice {
                    pos: id,
                    abbreviation: category.abbreviation.clone(),
                })
            }
            None => None,
        };
        self.record.contents.word_pos = Field::edited(choice);
        Ok(())
    }

    /// Inserts a slot before `index` (`index == len` appends).
    pub fn insert_slot(&mut self, index: usize, text: &str) -> AnnotateResult<()> {
        if index > self.record.contents.morphemes.len() {
            return Err(AnnotateError::NoSuchSlot(index));
        }
        self.record
            .contents
            .morphemes
            .insert(index, MorphSlot::default());
        self.set_morpheme_form(index, text)
    }

    pub fn remove_slot(&mut self, index: usize) -> AnnotateResult<MorphSlot> {
        if index >= self.record.contents.morphemes.len() {
            return Err(AnnotateError::NoSuchSlot(index));
        }
        Ok(self.record.contents.morphemes.remove(index))
    }

    /// Splits a slot's vernacular text at character `at` into two slots.
    pub fn split_slot(&mut self, index: usize, at: usize) -> AnnotateResult<()> {
        let vernacular = self.config.vernacular;
        let slot = self
            .record
            .contents
            .morphemes
            .get(index)
            .ok_or(AnnotateError::NoSuchSlot(index))?;
        let text = slot.marked_form(vernacular).unwrap_or_default();
        let split = text
            .char_indices()
            .nth(at)
            .map_or(text.len(), |(offset, _)| offset);
        let (left, right) = text.split_at(split);
        let (left, right) = (left.to_string(), right.to_string());

        self.record
            .contents
            .morphemes
            .insert(index + 1, MorphSlot::default());
        self.set_morpheme_form(index, &left)?;
        self.set_morpheme_form(index + 1, &right)?;
        debug!(slot = index, left = %left, right = %right, "split morpheme");
        Ok(())
    }

    /// Merges a slot with the one after it, concatenating their forms.
    pub fn merge_slot_with_next(&mut self, index: usize) -> AnnotateResult<()> {
        let vernacular = self.config.vernacular;
        let morphemes = &self.record.contents.morphemes;
        if index + 1 >= morphemes.len() {
            return Err(AnnotateError::NoSuchSlot(index + 1));
        }
        let joined = format!(
            "{}{}",
            morphemes[index].form_text(vernacular).unwrap_or_default(),
            morphemes[index + 1].form_text(vernacular).unwrap_or_default()
        );
        self.record.contents.morphemes.remove(index + 1);
        self.set_morpheme_form(index, &joined)
    }

    pub fn reset(&mut self) {
        self.record.reset();
    }
}
