//! "Is this still referenced?" queries and deferred deletion.

use logos_protocol::{
    AnalysisId, EntryId, Interpretation, MorphType, Occurrence, OccurrenceRef, WordformId,
    WordformOrigin, WsId,
};
use tracing::debug;

use crate::data::StoreData;
use crate::error::StoreResult;

/// An object a commit stopped pointing at. Deleted at the end of the batch
/// if nothing references it any more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Obsolete {
    Analysis(AnalysisId),
    Wordform(WordformId),
}

/// A morph form matching a lookup, with the number of bundles using its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCandidate {
    pub entry: EntryId,
    pub morph: logos_protocol::MorphId,
    pub morph_type: MorphType,
    pub usage: usize,
}

impl StoreData {
    /// Calls `visit` for every occurrence in every text, descending into
    /// the parts of joined phrases.
    fn for_each_occurrence(&self, mut visit: impl FnMut(Option<OccurrenceRef>, &Occurrence)) {
        fn walk(
            occurrence: &Occurrence,
            at: Option<OccurrenceRef>,
            visit: &mut dyn FnMut(Option<OccurrenceRef>, &Occurrence),
        ) {
            visit(at, occurrence);
            for part in &occurrence.merged {
                walk(part, None, visit);
            }
        }

        for text in self.texts() {
            for at in text.occurrence_refs() {
                if let Some(occurrence) = text.occurrence(at) {
                    walk(occurrence, Some(at), &mut visit);
                }
            }
        }
    }

    /// Live text positions whose interpretation is `interpretation`.
    pub fn occurrences_with(&self, interpretation: &Interpretation) -> Vec<OccurrenceRef> {
        let mut found = Vec::new();
        self.for_each_occurrence(|at, o| {
            if let Some(at) = at {
                if &o.interpretation == interpretation {
                    found.push(at);
                }
            }
        });
        found
    }

    /// Occurrences (folded phrase parts included) interpreted as the
    /// analysis or one of its glosses.
    pub fn analysis_reference_count(&self, analysis: AnalysisId) -> usize {
        let mut count = 0;
        self.for_each_occurrence(|_, o| {
            if self.interpretation_analysis(&o.interpretation) == Some(analysis) {
                count += 1;
            }
        });
        count
    }

    /// Occurrences resolving to the wordform, plus joined phrases listing it as a part.
    pub fn wordform_reference_count(&self, wordform: WordformId) -> usize {
        let mut count = 0;
        self.for_each_occurrence(|_, o| {
            if self.interpretation_wordform(&o.interpretation) == Some(wordform) {
                count += 1;
            }
        });
        count += self
            .wordforms()
            .filter(|w| match &w.origin {
                WordformOrigin::Joined(parts) => parts.contains(&wordform),
                WordformOrigin::Token => false,
            })
            .count();
        count
    }

    pub fn is_referenced(&self, object: Obsolete) -> bool {
        match object {
            Obsolete::Analysis(id) => self.analysis_reference_count(id) > 0,
            Obsolete::Wordform(id) => {
                self.wordform_reference_count(id) > 0
                    || self.wordform(id).map_or(false, |w| !w.analyses.is_empty())
            }
        }
    }

    /// Deletes each object that still exists and is no longer referenced.
    /// Returns how many were deleted.
    pub fn delete_obsolete(&mut self, objects: &[Obsolete]) -> StoreResult<usize> {
        let mut deleted = 0;
        // Analyses first: removing them may leave their wordform unreferenced.
        let mut ordered = objects.to_vec();
        ordered.sort();
        ordered.dedup();
        for object in ordered {
            let exists = match object {
                Obsolete::Analysis(id) => self.analysis(id).is_some(),
                Obsolete::Wordform(id) => self.wordform(id).is_some(),
            };
            if !exists || self.is_referenced(object) {
                continue;
            }
            match object {
                Obsolete::Analysis(id) => self.delete_analysis(id)?,
                Obsolete::Wordform(id) => self.delete_wordform(id)?,
            }
            deleted += 1;
        }
        if deleted > 0 {
            debug!(deleted, "deleted obsolete objects");
        }
        Ok(deleted)
    }

    /// Number of bundles whose morph form belongs to `entry`.
    pub fn entry_usage(&self, entry: EntryId) -> usize {
        self.bundles()
            .filter(|b| {
                b.morph
                    .and_then(|m| self.morph(m))
                    .map_or(false, |m| m.owner == entry)
            })
            .count()
    }

    /// Morph forms whose text in `ws` equals `form` and whose type fits
    /// `morph_type`. One candidate per entry, in entry creation order.
    pub fn entry_candidates(
        &self,
        ws: WsId,
        form: &str,
        morph_type: MorphType,
        monomorphemic: bool,
    ) -> Vec<EntryCandidate> {
        let mut candidates: Vec<EntryCandidate> = Vec::new();
        for entry in self.entries() {
            let matching = entry.morphs().filter_map(|id| self.morph(id)).find(|m| {
                m.form.get(ws) == Some(form) && m.morph_type.satisfies(morph_type, monomorphemic)
            });
            if let Some(morph) = matching {
                candidates.push(EntryCandidate {
                    entry: entry.id,
                    morph: morph.id,
                    morph_type: morph.morph_type,
                    usage: self.entry_usage(entry.id),
                });
            }
        }
        candidates
    }
}
