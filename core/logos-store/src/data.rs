use std::collections::BTreeSet;

use im::OrdMap;
use logos_protocol::{
    Agent, Analysis, AnalysisId, BundleId, EntryId, Evaluation, Gloss, GlossId, Interpretation,
    LexEntry, LexSense, MorphBundle, MorphForm, MorphId, MorphType, Msa, MsaId, MultiString,
    ObjectId, Occurrence, OccurrenceRef, Paragraph, PartOfSpeech, PosId, Segment, SegmentRef,
    SenseId, Text, TextId, VariantLink, Wordform, WordformId, WordformOrigin, WritingSystem, WsId,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Content of a new morph bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBundle {
    pub form: MultiString,
    pub morph: Option<MorphId>,
    pub sense: Option<SenseId>,
    pub msa: Option<MsaId>,
}

/// Every object table of the store.
///
/// Tables are persistent maps, so cloning the whole value is cheap; the
/// store relies on this for rollback snapshots and the undo log.
#[derive(Debug, Clone, Default)]
pub struct StoreData {
    writing_systems: OrdMap<WsId, WritingSystem>,
    wordforms: OrdMap<WordformId, Wordform>,
    analyses: OrdMap<AnalysisId, Analysis>,
    glosses: OrdMap<GlossId, Gloss>,
    bundles: OrdMap<BundleId, MorphBundle>,
    entries: OrdMap<EntryId, LexEntry>,
    morphs: OrdMap<MorphId, MorphForm>,
    senses: OrdMap<SenseId, LexSense>,
    msas: OrdMap<MsaId, Msa>,
    parts_of_speech: OrdMap<PosId, PartOfSpeech>,
    texts: OrdMap<TextId, Text>,

    // Ids come from one counter, so their order is creation order.
    pub(crate) next_id: u32,
    pub(crate) clock: u64,
    pub(crate) revision: u64,
    // Wordforms whose analysis set changed since the last drain.
    pub(crate) touched: BTreeSet<WordformId>,
}

impl StoreData {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn changed(&mut self) {
        self.revision += 1;
    }

    fn touch(&mut self, wordform: WordformId) {
        self.touched.insert(wordform);
        self.changed();
    }

    /// Advances the store clock and returns the new stamp.
    pub fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Writing systems ---

    pub fn add_writing_system(
        &mut self,
        tag: impl Into<String>,
        vernacular: bool,
        word_separator: impl Into<String>,
    ) -> WsId {
        let id = WsId(self.allocate());
        self.writing_systems.insert(
            id,
            WritingSystem {
                id,
                tag: tag.into(),
                vernacular,
                word_separator: word_separator.into(),
            },
        );
        self.changed();
        id
    }

    pub fn writing_system(&self, ws: WsId) -> Option<&WritingSystem> {
        self.writing_systems.get(&ws)
    }

    pub fn writing_system_by_tag(&self, tag: &str) -> Option<WsId> {
        self.writing_systems
            .values()
            .find(|w| w.tag == tag)
            .map(|w| w.id)
    }

    pub fn writing_systems(&self) -> impl Iterator<Item = &WritingSystem> + '_ {
        self.writing_systems.values()
    }

    /// Separator for joining phrase parts; a space unless configured otherwise.
    pub fn word_separator(&self, ws: WsId) -> &str {
        self.writing_systems
            .get(&ws)
            .map(|w| w.word_separator.as_str())
            .unwrap_or(" ")
    }

    // --- Wordforms ---

    pub fn wordform(&self, id: WordformId) -> Option<&Wordform> {
        self.wordforms.get(&id)
    }

    pub fn require_wordform(&self, id: WordformId) -> StoreResult<&Wordform> {
        self.wordform(id)
            .ok_or(StoreError::Missing(ObjectId::Wordform(id)))
    }

    pub fn wordforms(&self) -> impl Iterator<Item = &Wordform> + '_ {
        self.wordforms.values()
    }

    /// Exact-text lookup; the oldest match wins.
    pub fn find_wordform(&self, ws: WsId, text: &str) -> Option<WordformId> {
        self.wordforms
            .values()
            .find(|w| w.form.get(ws) == Some(text))
            .map(|w| w.id)
    }

    pub fn create_wordform(&mut self, form: MultiString, origin: WordformOrigin) -> WordformId {
        let id = WordformId(self.allocate());
        self.wordforms.insert(
            id,
            Wordform {
                id,
                form,
                analyses: Vec::new(),
                origin,
            },
        );
        self.touch(id);
        id
    }

    pub fn find_or_create_wordform(&mut self, ws: WsId, text: &str) -> WordformId {
        match self.find_wordform(ws, text) {
            Some(id) => id,
            None => self.create_wordform(MultiString::single(ws, text), WordformOrigin::Token),
        }
    }

    /// Deletes the wordform and every analysis it owns.
    pub fn delete_wordform(&mut self, id: WordformId) -> StoreResult<()> {
        let wordform = self.require_wordform(id)?.clone();
        for analysis in wordform.analyses {
            self.delete_analysis(analysis)?;
        }
        self.wordforms.remove(&id);
        debug!(wordform = %id, "deleted wordform");
        self.touch(id);
        Ok(())
    }

    // --- Analyses ---

    pub fn analysis(&self, id: AnalysisId) -> Option<&Analysis> {
        self.analyses.get(&id)
    }

    pub fn require_analysis(&self, id: AnalysisId) -> StoreResult<&Analysis> {
        self.analysis(id)
            .ok_or(StoreError::Missing(ObjectId::Analysis(id)))
    }

    pub fn analyses(&self) -> impl Iterator<Item = &Analysis> + '_ {
        self.analyses.values()
    }

    pub fn analyses_of(&self, wordform: WordformId) -> Vec<&Analysis> {
        self.wordform(wordform)
            .map(|w| w.analyses.iter().filter_map(|a| self.analysis(*a)).collect())
            .unwrap_or_default()
    }

    pub fn create_analysis(&mut self, owner: WordformId) -> StoreResult<AnalysisId> {
        self.require_wordform(owner)?;
        let id = AnalysisId(self.allocate());
        self.analyses.insert(
            id,
            Analysis {
                id,
                owner,
                bundles: Vec::new(),
                glosses: Vec::new(),
                category: None,
                human: None,
                parser: None,
            },
        );
        if let Some(wordform) = self.wordforms.get_mut(&owner) {
            wordform.analyses.push(id);
        }
        self.touch(owner);
        Ok(id)
    }

    fn analysis_mut(&mut self, id: AnalysisId) -> StoreResult<&mut Analysis> {
        self.analyses
            .get_mut(&id)
            .ok_or(StoreError::Missing(ObjectId::Analysis(id)))
    }

    pub fn set_category(&mut self, id: AnalysisId, category: Option<PosId>) -> StoreResult<()> {
        let analysis = self.analysis_mut(id)?;
        analysis.category = category;
        let owner = analysis.owner;
        self.touch(owner);
        Ok(())
    }

    pub fn set_evaluation(
        &mut self,
        id: AnalysisId,
        agent: Agent,
        evaluation: Option<Evaluation>,
    ) -> StoreResult<()> {
        let analysis = self.analysis_mut(id)?;
        match agent {
            Agent::Human => analysis.human = evaluation,
            Agent::Parser => analysis.parser = evaluation,
        }
        let owner = analysis.owner;
        self.touch(owner);
        Ok(())
    }

    /// Records `agent`'s approval, stamped with a fresh clock value.
    pub fn approve(&mut self, id: AnalysisId, agent: Agent) -> StoreResult<u64> {
        self.require_analysis(id)?;
        let stamp = self.tick();
        self.set_evaluation(id, agent, Some(Evaluation::approves(stamp)))?;
        Ok(stamp)
    }

    /// Deletes the analysis with its bundles and glosses.
    pub fn delete_analysis(&mut self, id: AnalysisId) -> StoreResult<()> {
        let analysis = self.require_analysis(id)?.clone();
        for bundle in &analysis.bundles {
            self.bundles.remove(bundle);
        }
        for gloss in &analysis.glosses {
            self.glosses.remove(gloss);
        }
        self.analyses.remove(&id);
        if let Some(wordform) = self.wordforms.get_mut(&analysis.owner) {
            wordform.analyses.retain(|a| *a != id);
        }
        debug!(analysis = %id, owner = %analysis.owner, "deleted analysis");
        self.touch(analysis.owner);
        Ok(())
    }

    // --- Glosses ---

    pub fn gloss(&self, id: GlossId) -> Option<&Gloss> {
        self.glosses.get(&id)
    }

    pub fn require_gloss(&self, id: GlossId) -> StoreResult<&Gloss> {
        self.gloss(id).ok_or(StoreError::Missing(ObjectId::Gloss(id)))
    }

    pub fn glosses_of(&self, analysis: AnalysisId) -> Vec<&Gloss> {
        self.analysis(analysis)
            .map(|a| a.glosses.iter().filter_map(|g| self.gloss(*g)).collect())
            .unwrap_or_default()
    }

    pub fn create_gloss(&mut self, owner: AnalysisId, form: MultiString) -> StoreResult<GlossId> {
        let wordform = self.require_analysis(owner)?.owner;
        let id = GlossId(self.allocate());
        let last_used = self.tick();
        self.glosses.insert(
            id,
            Gloss {
                id,
                owner,
                form,
                last_used,
            },
        );
        self.analysis_mut(owner)?.glosses.push(id);
        self.touch(wordform);
        Ok(id)
    }

    pub fn mark_gloss_used(&mut self, id: GlossId) -> StoreResult<()> {
        let owner = self.require_gloss(id)?.owner;
        let wordform = self.require_analysis(owner)?.owner;
        let stamp = self.tick();
        if let Some(gloss) = self.glosses.get_mut(&id) {
            gloss.last_used = stamp;
        }
        self.touch(wordform);
        Ok(())
    }

    // --- Morph bundles ---

    pub fn bundle(&self, id: BundleId) -> Option<&MorphBundle> {
        self.bundles.get(&id)
    }

    pub fn bundles(&self) -> impl Iterator<Item = &MorphBundle> + '_ {
        self.bundles.values()
    }

    pub fn bundles_of(&self, analysis: AnalysisId) -> Vec<&MorphBundle> {
        self.analysis(analysis)
            .map(|a| a.bundles.iter().filter_map(|b| self.bundle(*b)).collect())
            .unwrap_or_default()
    }

    pub fn create_bundle(&mut self, owner: AnalysisId, content: NewBundle) -> StoreResult<BundleId> {
        let wordform = self.require_analysis(owner)?.owner;
        let id = BundleId(self.allocate());
        self.bundles.insert(
            id,
            MorphBundle {
                id,
                owner,
                form: content.form,
                morph: content.morph,
                sense: content.sense,
                msa: content.msa,
            },
        );
        self.analysis_mut(owner)?.bundles.push(id);
        self.touch(wordform);
        Ok(id)
    }

    // --- Lexicon ---

    pub fn entry(&self, id: EntryId) -> Option<&LexEntry> {
        self.entries.get(&id)
    }

    pub fn require_entry(&self, id: EntryId) -> StoreResult<&LexEntry> {
        self.entry(id).ok_or(StoreError::Missing(ObjectId::Entry(id)))
    }

    pub fn entries(&self) -> impl Iterator<Item = &LexEntry> + '_ {
        self.entries.values()
    }

    pub fn morph(&self, id: MorphId) -> Option<&MorphForm> {
        self.morphs.get(&id)
    }

    pub fn morphs(&self) -> impl Iterator<Item = &MorphForm> + '_ {
        self.morphs.values()
    }

    pub fn sense(&self, id: SenseId) -> Option<&LexSense> {
        self.senses.get(&id)
    }

    pub fn msa(&self, id: MsaId) -> Option<&Msa> {
        self.msas.get(&id)
    }

    pub fn pos(&self, id: PosId) -> Option<&PartOfSpeech> {
        self.parts_of_speech.get(&id)
    }

    pub fn parts_of_speech(&self) -> impl Iterator<Item = &PartOfSpeech> + '_ {
        self.parts_of_speech.values()
    }

    /// Creates an entry together with its lexeme form.
    pub fn create_entry(&mut self, form: MultiString, morph_type: MorphType) -> EntryId {
        let id = EntryId(self.allocate());
        let lexeme = MorphId(self.allocate());
        self.morphs.insert(
            lexeme,
            MorphForm {
                id: lexeme,
                owner: id,
                form,
                morph_type,
            },
        );
        self.entries.insert(
            id,
            LexEntry {
                id,
                lexeme,
                alternates: Vec::new(),
                citation: MultiString::new(),
                homograph: 0,
                senses: Vec::new(),
                msas: Vec::new(),
                variant_of: Vec::new(),
            },
        );
        self.changed();
        id
    }

    fn entry_mut(&mut self, id: EntryId) -> StoreResult<&mut LexEntry> {
        self.entries
            .get_mut(&id)
            .ok_or(StoreError::Missing(ObjectId::Entry(id)))
    }

    pub fn add_allomorph(
        &mut self,
        entry: EntryId,
        form: MultiString,
        morph_type: MorphType,
    ) -> StoreResult<MorphId> {
        self.require_entry(entry)?;
        let id = MorphId(self.allocate());
        self.morphs.insert(
            id,
            MorphForm {
                id,
                owner: entry,
                form,
                morph_type,
            },
        );
        self.entry_mut(entry)?.alternates.push(id);
        self.changed();
        Ok(id)
    }

    pub fn set_citation(&mut self, entry: EntryId, citation: MultiString) -> StoreResult<()> {
        self.entry_mut(entry)?.citation = citation;
        self.changed();
        Ok(())
    }

    pub fn set_homograph(&mut self, entry: EntryId, number: u32) -> StoreResult<()> {
        self.entry_mut(entry)?.homograph = number;
        self.changed();
        Ok(())
    }

    pub fn create_msa(&mut self, entry: EntryId, pos: Option<PosId>) -> StoreResult<MsaId> {
        self.require_entry(entry)?;
        let id = MsaId(self.allocate());
        self.msas.insert(id, Msa { id, owner: entry, pos });
        self.entry_mut(entry)?.msas.push(id);
        self.changed();
        Ok(id)
    }

    pub fn create_sense(
        &mut self,
        entry: EntryId,
        gloss: MultiString,
        msa: Option<MsaId>,
    ) -> StoreResult<SenseId> {
        self.require_entry(entry)?;
        if let Some(msa) = msa {
            let owner = self.msa(msa).ok_or(StoreError::Missing(ObjectId::Msa(msa)))?.owner;
            if owner != entry {
                return Err(StoreError::OwnerMismatch {
                    child: ObjectId::Msa(msa),
                    owner: ObjectId::Entry(entry),
                });
            }
        }
        let id = SenseId(self.allocate());
        self.senses.insert(
            id,
            LexSense {
                id,
                owner: entry,
                gloss,
                msa,
            },
        );
        self.entry_mut(entry)?.senses.push(id);
        self.changed();
        Ok(id)
    }

    pub fn add_variant_link(&mut self, entry: EntryId, link: VariantLink) -> StoreResult<()> {
        self.entry_mut(entry)?.variant_of.push(link);
        self.changed();
        Ok(())
    }

    pub fn create_pos(&mut self, name: MultiString, abbreviation: MultiString) -> PosId {
        let id = PosId(self.allocate());
        self.parts_of_speech.insert(
            id,
            PartOfSpeech {
                id,
                name,
                abbreviation,
            },
        );
        self.changed();
        id
    }

    /// Deletes an entry and everything it owns. Bundles pointing at it are
    /// left as they are; readers treat those references as missing.
    pub fn delete_entry(&mut self, id: EntryId) -> StoreResult<()> {
        let entry = self.require_entry(id)?.clone();
        for morph in entry.morphs() {
            self.morphs.remove(&morph);
        }
        for sense in &entry.senses {
            self.senses.remove(sense);
        }
        for msa in &entry.msas {
            self.msas.remove(msa);
        }
        self.entries.remove(&id);
        self.changed();
        Ok(())
    }

    pub fn delete_sense(&mut self, id: SenseId) -> StoreResult<()> {
        let sense = self
            .senses
            .remove(&id)
            .ok_or(StoreError::Missing(ObjectId::Sense(id)))?;
        if let Some(entry) = self.entries.get_mut(&sense.owner) {
            entry.senses.retain(|s| *s != id);
        }
        self.changed();
        Ok(())
    }

    /// Deletes a category. Analyses and grammatical info still naming it
    /// keep the dangling id.
    pub fn delete_pos(&mut self, id: PosId) -> StoreResult<()> {
        self.parts_of_speech
            .remove(&id)
            .ok_or(StoreError::Missing(ObjectId::Pos(id)))?;
        self.changed();
        Ok(())
    }

    /// Citation form, else lexeme form; homograph number appended.
    pub fn headword(&self, entry: EntryId, ws: WsId) -> Option<String> {
        let entry = self.entry(entry)?;
        let base = entry
            .citation
            .text(ws)
            .or_else(|| self.morph(entry.lexeme).and_then(|m| m.form.text(ws)))?;
        Some(if entry.homograph > 0 {
            format!("{}{}", base, entry.homograph)
        } else {
            base.to_string()
        })
    }

    // --- Texts ---

    pub fn insert_text(
        &mut self,
        title: impl Into<String>,
        vernacular: WsId,
        paragraphs: Vec<Paragraph>,
    ) -> TextId {
        let id = TextId(self.allocate());
        self.texts.insert(
            id,
            Text {
                id,
                title: title.into(),
                vernacular,
                paragraphs,
            },
        );
        self.changed();
        id
    }

    pub fn text(&self, id: TextId) -> Option<&Text> {
        self.texts.get(&id)
    }

    pub fn require_text(&self, id: TextId) -> StoreResult<&Text> {
        self.text(id).ok_or(StoreError::MissingText(id))
    }

    pub fn texts(&self) -> impl Iterator<Item = &Text> + '_ {
        self.texts.values()
    }

    pub fn segment(&self, at: SegmentRef) -> Option<&Segment> {
        self.text(at.text)?.segment(at)
    }

    fn segment_mut(&mut self, at: SegmentRef) -> StoreResult<&mut Segment> {
        self.texts
            .get_mut(&at.text)
            .ok_or(StoreError::MissingText(at.text))?
            .segment_mut(at)
            .ok_or(StoreError::MissingSegment(at))
    }

    pub fn occurrence(&self, at: OccurrenceRef) -> Option<&Occurrence> {
        self.text(at.text)?.occurrence(at)
    }

    pub fn require_occurrence(&self, at: OccurrenceRef) -> StoreResult<&Occurrence> {
        self.occurrence(at)
            .ok_or(StoreError::MissingOccurrence(at))
    }

    /// The wordform an interpretation belongs to.
    pub fn interpretation_wordform(&self, interpretation: &Interpretation) -> Option<WordformId> {
        match interpretation {
            Interpretation::Wordform(id) => Some(*id),
            Interpretation::Analysis(id) => self.analysis(*id).map(|a| a.owner),
            Interpretation::Gloss(id) => self
                .gloss(*id)
                .and_then(|g| self.analysis(g.owner))
                .map(|a| a.owner),
            Interpretation::Punctuation(_) => None,
        }
    }

    /// The analysis an interpretation carries, if it is analysis-level.
    pub fn interpretation_analysis(&self, interpretation: &Interpretation) -> Option<AnalysisId> {
        match interpretation {
            Interpretation::Analysis(id) => Some(*id),
            Interpretation::Gloss(id) => self.gloss(*id).map(|g| g.owner),
            _ => None,
        }
    }

    pub fn occurrence_wordform(&self, at: OccurrenceRef) -> Option<WordformId> {
        self.occurrence(at)
            .and_then(|o| self.interpretation_wordform(&o.interpretation))
    }

    /// Rewrites an occurrence's interpretation and returns the previous one.
    pub fn set_interpretation(
        &mut self,
        at: OccurrenceRef,
        interpretation: Interpretation,
    ) -> StoreResult<Interpretation> {
        let segment = self.segment_mut(at.segment_ref())?;
        let occurrence = segment
            .occurrences
            .get_mut(at.index)
            .ok_or(StoreError::MissingOccurrence(at))?;
        let previous = std::mem::replace(&mut occurrence.interpretation, interpretation);
        self.changed();
        Ok(previous)
    }

    /// Replaces `remove` occurrences starting at `start` with `replacement`.
    pub fn splice_occurrences(
        &mut self,
        at: SegmentRef,
        start: usize,
        remove: usize,
        replacement: Vec<Occurrence>,
    ) -> StoreResult<Vec<Occurrence>> {
        let segment = self.segment_mut(at)?;
        if start + remove > segment.occurrences.len() {
            return Err(StoreError::MissingOccurrence(at.occurrence(start + remove)));
        }
        let removed: Vec<Occurrence> = segment
            .occurrences
            .splice(start..start + remove, replacement)
            .collect();
        self.changed();
        Ok(removed)
    }

    pub fn set_free_translation(&mut self, at: SegmentRef, ws: WsId, text: &str) -> StoreResult<()> {
        self.segment_mut(at)?.free_translation.set(ws, text);
        self.changed();
        Ok(())
    }

    pub fn set_literal_translation(
        &mut self,
        at: SegmentRef,
        ws: WsId,
        text: &str,
    ) -> StoreResult<()> {
        self.segment_mut(at)?.literal_translation.set(ws, text);
        self.changed();
        Ok(())
    }

    pub fn add_note(&mut self, at: SegmentRef, note: MultiString) -> StoreResult<()> {
        self.segment_mut(at)?.notes.push(note);
        self.changed();
        Ok(())
    }
}
