use logos_guess::{Guess, GuessService};
use logos_protocol::{
    Agent, CaseClass, Interpretation, LineKinds, OccurrenceRef, TextId, WordformId,
};
use logos_store::{FocusChange, Obsolete, Store, StoreData, UndoOutcome};
use tracing::{debug, info};

use crate::commit::{commit, CommitOutcome};
use crate::completeness::missing_lines;
use crate::config::SessionConfig;
use crate::error::{AnnotateError, AnnotateResult};
use crate::loader::load;
use crate::navigation::{first_occurrence, next_target, Direction, NavFilter, NavPosition, NavTarget};
use crate::phrase;
use crate::sandbox::{Stage, StagingRecord};
use crate::undo::{replay_focus, Replay};

/// One user's editing session over a store.
///
/// Holds at most one staging record, bound to the focused occurrence.
/// Every change to the store goes through a unit and is followed by guess
/// invalidation, so cached guesses never outlive the data they came from.
#[derive(Debug)]
pub struct AnnotationSession {
    store: Store,
    guesses: GuessService,
    config: SessionConfig,
    active: Option<StagingRecord>,
    position: Option<NavPosition>,
}

impl AnnotationSession {
    pub fn new(store: Store, config: SessionConfig) -> Self {
        Self {
            store,
            guesses: GuessService::new(),
            config,
            active: None,
            position: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn data(&self) -> &StoreData {
        self.store.data()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn guesses(&self) -> &GuessService {
        &self.guesses
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn active(&self) -> Option<&StagingRecord> {
        self.active.as_ref()
    }

    pub fn position(&self) -> Option<NavPosition> {
        self.position
    }

    pub fn focused(&self) -> Option<OccurrenceRef> {
        match self.position {
            Some(NavPosition::Occurrence(at)) => Some(at),
            _ => None,
        }
    }

    /// Changes outside the undo log, such as lexicon maintenance. Undo
    /// history does not survive a setup that changed anything.
    pub fn setup<T>(&mut self, f: impl FnOnce(&mut StoreData) -> T) -> T {
        let result = self.store.setup(f);
        self.sync_guesses();
        result
    }

    /// Forwards the store's change notifications to the guess cache.
    pub fn sync_guesses(&mut self) {
        self.guesses.apply_changes(self.store.take_changes());
    }

    pub fn guess(&mut self, wordform: WordformId) -> Option<Guess> {
        self.guesses
            .guess(self.store.data(), wordform, self.config.analysis)
    }

    pub fn missing_lines(&self, at: OccurrenceRef) -> LineKinds {
        missing_lines(self.store.data(), &self.config, at)
    }

    /// Focuses `at` and loads its staging record.
    ///
    /// Fails with [`AnnotateError::DirtyRecord`] while another occurrence
    /// has unsaved edits.
    pub fn focus(&mut self, at: OccurrenceRef) -> AnnotateResult<&StagingRecord> {
        let reuse = match &self.active {
            Some(active) if active.occurrence() == at => true,
            Some(active) if active.is_dirty() => {
                return Err(AnnotateError::DirtyRecord(active.occurrence()))
            }
            _ => false,
        };
        if !reuse {
            self.load(at, true)?;
        }
        self.position = Some(NavPosition::Occurrence(at));
        self.active.as_ref().ok_or(AnnotateError::NoActiveRecord)
    }

    fn load(&mut self, at: OccurrenceRef, adjust_case: bool) -> AnnotateResult<()> {
        self.active = None;
        let record = load(
            self.store.data(),
            &mut self.guesses,
            &self.config,
            at,
            true,
            adjust_case,
        )?;
        self.active = Some(record);
        Ok(())
    }

    /// Drops the active record and its edits.
    pub fn discard(&mut self) {
        if let Some(record) = self.active.take() {
            debug!(occurrence = %record.occurrence(), dirty = record.is_dirty(), "discarded record");
        }
    }

    pub fn stage(&mut self) -> AnnotateResult<Stage<'_>> {
        let record = self.active.as_mut().ok_or(AnnotateError::NoActiveRecord)?;
        Ok(Stage::new(self.store.data(), &self.config, record))
    }

    fn active_record(&self) -> AnnotateResult<StagingRecord> {
        self.active.clone().ok_or(AnnotateError::NoActiveRecord)
    }

    /// Commits the active record when it should be saved and reloads it.
    pub fn commit_active(&mut self, save_guess: bool) -> AnnotateResult<Option<CommitOutcome>> {
        let record = self.active_record()?;
        if !record.should_save(save_guess) {
            return Ok(None);
        }
        let at = record.occurrence();
        let config = &self.config;
        let outcome = self.store.unit("Commit", |tx| {
            let outcome = commit(tx, config, &record)?;
            tx.delete_obsolete(&outcome.obsolete)?;
            tx.set_focus(FocusChange::new(Some(at), Some(at)));
            Ok::<_, AnnotateError>(outcome)
        })?;
        self.sync_guesses();
        self.load(at, false)?;
        Ok(Some(outcome))
    }

    /// Saves the active record if needed and moves to the next word or
    /// annotation stop.
    pub fn approve_and_advance(
        &mut self,
        save_guess: bool,
        direction: Direction,
    ) -> AnnotateResult<NavTarget> {
        self.navigate("Approve", save_guess, direction, NavFilter::Analyzable)
    }

    /// Saves edits and moves to the next occurrence still missing a line.
    pub fn skip_to_incomplete(&mut self, direction: Direction) -> AnnotateResult<NavTarget> {
        self.navigate("Skip", false, direction, NavFilter::Incomplete)
    }

    fn navigate(
        &mut self,
        label: &str,
        save_guess: bool,
        direction: Direction,
        filter: NavFilter,
    ) -> AnnotateResult<NavTarget> {
        let (from, text, record) = match (&self.active, self.position) {
            (Some(record), _) => {
                let at = record.occurrence();
                (NavPosition::Occurrence(at), at.text, Some(record.clone()))
            }
            (None, Some(NavPosition::Annotation(segment))) => {
                (NavPosition::Annotation(segment), segment.text, None)
            }
            (None, _) => return Err(AnnotateError::NoActiveRecord),
        };
        let before = match from {
            NavPosition::Occurrence(at) => Some(at),
            NavPosition::Annotation(_) => None,
        };

        // The focused position must still hold what was loaded.
        if let Some(record) = &record {
            let at = record.occurrence();
            if self.store.data().occurrence_wordform(at) != Some(record.loaded_wordform()) {
                return Err(AnnotateError::StaleOccurrence(at));
            }
        }

        let config = &self.config;
        let target = self.store.unit(label, |tx| {
            if let Some(record) = record.as_ref().filter(|r| r.should_save(save_guess)) {
                let outcome = commit(tx, config, record)?;
                tx.delete_obsolete(&outcome.obsolete)?;
            }
            let target = next_target(tx, config, text, from, direction, filter);
            tx.set_focus(FocusChange::new(before, target.occurrence()));
            Ok::<_, AnnotateError>(target)
        })?;
        self.sync_guesses();
        self.move_to(target)?;
        Ok(target)
    }

    fn move_to(&mut self, target: NavTarget) -> AnnotateResult<()> {
        self.active = None;
        match target {
            NavTarget::Occurrence(at) => {
                self.load(at, true)?;
                self.position = Some(NavPosition::Occurrence(at));
            }
            NavTarget::Annotation(annotation) => {
                self.position = Some(NavPosition::Annotation(annotation.segment));
            }
            NavTarget::EndOfText => self.position = None,
        }
        Ok(())
    }

    /// Commits the active record and gives every other occurrence of the
    /// same word in the text the same interpretation. Occurrences already
    /// bound to an analysis keep it. Returns how many were rewritten.
    pub fn approve_for_whole_text(&mut self) -> AnnotateResult<usize> {
        let record = self.active_record()?;
        let at = record.occurrence();
        let config = &self.config;
        let rewritten = self.store.unit("Approve Throughout Text", |tx| {
            let targets = same_word_occurrences(tx, &record);
            let outcome = commit(tx, config, &record)?;
            let mut obsolete = outcome.obsolete.clone();
            let mut rewritten = 0;
            if outcome.analysis(tx).is_some() {
                for other in targets {
                    let previous = tx.set_interpretation(other, outcome.interpretation.clone())?;
                    match tx.interpretation_wordform(&previous) {
                        Some(w) if w != record.wordform() => obsolete.push(Obsolete::Wordform(w)),
                        _ => {}
                    }
                    rewritten += 1;
                }
            }
            tx.delete_obsolete(&obsolete)?;
            tx.set_focus(FocusChange::new(Some(at), Some(at)));
            Ok::<_, AnnotateError>(rewritten)
        })?;
        info!(occurrence = %at, rewritten, "approved throughout text");
        self.sync_guesses();
        self.load(at, false)?;
        Ok(rewritten)
    }

    /// Stores the guess of every unanalyzed occurrence of `text`, and the
    /// gloss guess of every occurrence bound to a bare analysis, approving
    /// each as the human's choice. Returns how many were replaced.
    pub fn approve_all(&mut self, text: TextId) -> AnnotateResult<usize> {
        if let Some(active) = self.active.as_ref().filter(|r| r.is_dirty()) {
            return Err(AnnotateError::DirtyRecord(active.occurrence()));
        }
        let prior = self.position;
        let before = self.focused();
        self.active = None;

        let ws = self.config.analysis;
        let config = &self.config;
        let guesses = &mut self.guesses;
        let (replaced, after) = self.store.unit("Approve All", |tx| {
            let start = first_occurrence(tx, config, text);
            let refs = tx.require_text(text)?.occurrence_refs();
            let mut obsolete = Vec::new();
            let mut replaced = 0;

            for at in refs.into_iter().skip_while(|r| Some(*r) != start) {
                let current = match tx.occurrence(at) {
                    Some(o) if !o.is_punctuation() => o.interpretation.clone(),
                    _ => continue,
                };
                let found = match current {
                    Interpretation::Wordform(_) | Interpretation::Analysis(_) => {
                        guesses.record_guess_if_not_known(tx, at, ws)
                    }
                    _ => None,
                };
                let found = match found {
                    Some(found) => found,
                    None => continue,
                };
                let chosen = if found.guess.target.exists(tx) {
                    found.guess.target.interpretation()
                } else {
                    match tx.analyses_of(found.wordform).first() {
                        Some(first) => Interpretation::Analysis(first.id),
                        None => continue,
                    }
                };
                if chosen == current {
                    continue;
                }

                if let Some(analysis) = tx.interpretation_analysis(&chosen) {
                    tx.approve(analysis, Agent::Human)?;
                }
                let previous = tx.set_interpretation(at, chosen)?;
                match tx.interpretation_wordform(&previous) {
                    Some(w) if w != found.wordform => obsolete.push(Obsolete::Wordform(w)),
                    _ => {}
                }
                guesses.invalidate(found.wordform);
                replaced += 1;
            }
            tx.delete_obsolete(&obsolete)?;

            let after = before
                .filter(|b| tx.occurrence(*b).map_or(false, |o| !o.is_punctuation()))
                .or(start);
            tx.set_focus(FocusChange::new(before, after));
            Ok::<_, AnnotateError>((replaced, after))
        })?;
        info!(text = %text, replaced, "approved all guesses");
        self.sync_guesses();

        match (after, prior) {
            (Some(at), Some(NavPosition::Occurrence(_)) | None) => {
                self.move_to(NavTarget::Occurrence(at))?
            }
            (_, Some(annotation @ NavPosition::Annotation(_))) => {
                self.position = Some(annotation)
            }
            _ => self.position = None,
        }
        Ok(replaced)
    }

    /// Joins the focused word with the next one and focuses the phrase.
    pub fn join_with_next(&mut self) -> AnnotateResult<OccurrenceRef> {
        let at = self.clean_focus()?;
        let joined = self.store.unit("Join Words", |tx| {
            let joined = phrase::join_with_next(tx, at)?;
            tx.set_focus(FocusChange::new(Some(at), Some(joined)));
            Ok::<_, AnnotateError>(joined)
        })?;
        self.sync_guesses();
        self.move_to(NavTarget::Occurrence(joined))?;
        Ok(joined)
    }

    /// Breaks the focused phrase into its words and focuses the first one.
    pub fn break_phrase(&mut self) -> AnnotateResult<Vec<OccurrenceRef>> {
        let at = self.clean_focus()?;
        let parts = self.store.unit("Break Phrase", |tx| {
            let parts = phrase::break_phrase(tx, at)?;
            tx.set_focus(FocusChange::new(Some(at), parts.first().copied()));
            Ok::<_, AnnotateError>(parts)
        })?;
        self.sync_guesses();
        if let Some(first) = parts.first() {
            self.move_to(NavTarget::Occurrence(*first))?;
        }
        Ok(parts)
    }

    fn clean_focus(&self) -> AnnotateResult<OccurrenceRef> {
        let record = self.active.as_ref().ok_or(AnnotateError::NoActiveRecord)?;
        if record.is_dirty() {
            return Err(AnnotateError::DirtyRecord(record.occurrence()));
        }
        Ok(record.occurrence())
    }

    /// Reverts the last unit. The active record is discarded and focus
    /// returns to where the unit started, if that position still exists.
    pub fn undo(&mut self) -> AnnotateResult<Option<UndoOutcome>> {
        match self.store.undo() {
            Some(outcome) => {
                self.replay(&outcome, Replay::Undo)?;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }

    pub fn redo(&mut self) -> AnnotateResult<Option<UndoOutcome>> {
        match self.store.redo() {
            Some(outcome) => {
                self.replay(&outcome, Replay::Redo)?;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }

    fn replay(&mut self, outcome: &UndoOutcome, replay: Replay) -> AnnotateResult<()> {
        self.sync_guesses();
        self.active = None;
        self.position = None;
        if let Some(at) = replay_focus(self.store.data(), outcome, replay) {
            self.move_to(NavTarget::Occurrence(at))?;
        }
        debug!(label = %outcome.label, focus = ?self.focused(), "replayed unit");
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }
}

/// Other occurrences of the record's text that show the record's word
/// unanalyzed: the loaded wordform, the case-folded one, or a
/// sentence-initial capitalized variant of it.
fn same_word_occurrences(data: &StoreData, record: &StagingRecord) -> Vec<OccurrenceRef> {
    let at = record.occurrence();
    let text = match data.text(at.text) {
        Some(t) => t,
        None => return Vec::new(),
    };
    let folded = data
        .wordform(record.wordform())
        .and_then(|w| w.form.get(text.vernacular))
        .map(CaseClass::fold);

    text.occurrence_refs()
        .into_iter()
        .filter(|other| *other != at)
        .filter(|other| {
            let wordform = match text.occurrence(*other).map(|o| &o.interpretation) {
                Some(Interpretation::Wordform(w)) => *w,
                _ => return false,
            };
            if wordform == record.loaded_wordform() || wordform == record.wordform() {
                return true;
            }
            let initial = text
                .segment(other.segment_ref())
                .map_or(false, |s| s.is_sentence_initial(other.index));
            let form = data.wordform(wordform).and_then(|w| w.form.get(text.vernacular));
            match (initial, form, &folded) {
                (true, Some(form), Some(folded)) => {
                    CaseClass::of(form) == CaseClass::Title && CaseClass::fold(form) == *folded
                }
                _ => false,
            }
        })
        .collect()
}
