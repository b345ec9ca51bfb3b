pub mod guess;

use std::collections::HashMap;

use logos_protocol::{CaseClass, Interpretation, OccurrenceRef, WordformId, WsId};
use logos_store::StoreData;
use tracing::trace;

pub use guess::{
    compute_gloss_guess, compute_guess, has_multiple_relevant_analyses, Guess, GuessTarget,
};

/// A guess for one occurrence, with the wordform it was computed for. That
/// wordform differs from the occurrence's own when a sentence-initial
/// capital was folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceGuess {
    pub wordform: WordformId,
    pub guess: Guess,
}

/// Computes guesses and caches them per (wordform, writing system).
///
/// Entries are dropped through [`GuessService::invalidate`], which callers
/// feed from the store's change notifications.
#[derive(Debug, Default)]
pub struct GuessService {
    cache: HashMap<(WordformId, WsId), Option<Guess>>,
}

impl GuessService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`compute_guess`]. A cached guess whose object has since
    /// been deleted is recomputed, never returned.
    pub fn guess(&mut self, data: &StoreData, wordform: WordformId, ws: WsId) -> Option<Guess> {
        if let Some(cached) = self.cache.get(&(wordform, ws)) {
            match cached {
                Some(g) if g.target.exists(data) => return Some(*g),
                None => return None,
                Some(_) => trace!(wordform = %wordform, "cached guess went stale"),
            }
        }
        let computed = compute_guess(data, wordform, ws);
        self.cache.insert((wordform, ws), computed);
        computed
    }

    /// Guess for the occurrence at `at`, cached for later queries.
    ///
    /// Unanalyzed occurrences get their wordform's guess; a Title-case,
    /// sentence-initial one with no guess of its own falls back to the
    /// guess of its lower-case wordform. Occurrences bound to an analysis
    /// get a guess only when that analysis has a gloss to suggest.
    pub fn record_guess_if_not_known(
        &mut self,
        data: &StoreData,
        at: OccurrenceRef,
        ws: WsId,
    ) -> Option<OccurrenceGuess> {
        let text = data.text(at.text)?;
        let occurrence = text.occurrence(at)?;
        match &occurrence.interpretation {
            Interpretation::Wordform(wordform) => {
                if let Some(guess) = self.guess(data, *wordform, ws) {
                    return Some(OccurrenceGuess {
                        wordform: *wordform,
                        guess,
                    });
                }
                let folded = Self::folded_wordform(data, at, *wordform)?;
                self.guess(data, folded, ws).map(|guess| OccurrenceGuess {
                    wordform: folded,
                    guess,
                })
            }
            Interpretation::Analysis(analysis) => {
                let owner = data.analysis(*analysis)?.owner;
                compute_gloss_guess(data, *analysis, ws).map(|guess| OccurrenceGuess {
                    wordform: owner,
                    guess,
                })
            }
            Interpretation::Gloss(_) | Interpretation::Punctuation(_) => None,
        }
    }

    /// The existing lower-case wordform for a Title-case, sentence-initial occurrence.
    pub fn folded_wordform(
        data: &StoreData,
        at: OccurrenceRef,
        wordform: WordformId,
    ) -> Option<WordformId> {
        let text = data.text(at.text)?;
        if !text.segment(at.segment_ref())?.is_sentence_initial(at.index) {
            return None;
        }
        let form = data.wordform(wordform)?.form.get(text.vernacular)?;
        if CaseClass::of(form) != CaseClass::Title {
            return None;
        }
        data.find_wordform(text.vernacular, &CaseClass::fold(form))
            .filter(|w| *w != wordform)
    }

    pub fn is_cached(&self, wordform: WordformId) -> bool {
        self.cache.keys().any(|(w, _)| *w == wordform)
    }

    pub fn invalidate(&mut self, wordform: WordformId) {
        let before = self.cache.len();
        self.cache.retain(|(w, _), _| *w != wordform);
        if self.cache.len() != before {
            trace!(wordform = %wordform, "guess invalidated");
        }
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Applies a batch of store change notifications.
    pub fn apply_changes(&mut self, changed: impl IntoIterator<Item = WordformId>) {
        for wordform in changed {
            self.invalidate(wordform);
        }
    }
}
