//! Turns a staging record into persistent analysis objects.

use logos_protocol::{
    Agent, Analysis, AnalysisId, EntryId, GlossId, Interpretation, MorphBundle, MorphId, MsaId, MultiString,
    PosId, SenseId,
};
use logos_store::{NewBundle, Obsolete, StoreData, Transaction};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{AnnotateError, AnnotateResult};
use crate::sandbox::{MorphSlot, RecordSource, StagingRecord};

/// What a commit wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub interpretation: Interpretation,
    /// Objects the occurrence stopped pointing at. The caller deletes them
    /// once the whole batch is written, if nothing references them.
    pub obsolete: Vec<Obsolete>,
    /// Slots whose lexicon references had vanished and were dropped.
    pub degraded: Vec<usize>,
    /// The staged word category had been deleted and was dropped.
    pub category_lost: bool,
    /// Whether a new analysis or gloss was created.
    pub created: bool,
}

impl CommitOutcome {
    pub fn analysis(&self, data: &StoreData) -> Option<AnalysisId> {
        data.interpretation_analysis(&self.interpretation)
    }
}

/// A slot with every reference checked against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedSlot {
    form: MultiString,
    morph: Option<MorphId>,
    sense: Option<SenseId>,
    msa: Option<MsaId>,
}

impl ResolvedSlot {
    fn matches(&self, bundle: &MorphBundle) -> bool {
        self.morph == bundle.morph
            && self.sense == bundle.sense
            && self.msa == bundle.msa
            && (self.morph.is_some() || self.form == bundle.form)
    }

    fn into_bundle(self) -> NewBundle {
        NewBundle {
            form: self.form,
            morph: self.morph,
            sense: self.sense,
            msa: self.msa,
        }
    }
}

/// The morph form a slot stands for: the picked one, else the entry's form
/// with the slot's text, else the lexeme form.
fn resolve_morph(
    data: &StoreData,
    config: &SessionConfig,
    slot: &MorphSlot,
    entry: EntryId,
    picked: Option<MorphId>,
) -> Option<MorphId> {
    let lexeme = data.entry(entry)?;
    if let Some(picked) = picked.filter(|m| data.morph(*m).map_or(false, |m| m.owner == entry)) {
        return Some(picked);
    }
    let text = slot.form_text(config.vernacular);
    lexeme
        .morphs()
        .find(|m| {
            text.is_some()
                && data
                    .morph(*m)
                    .map_or(false, |m| m.form.get(config.vernacular) == text)
        })
        .or(Some(lexeme.lexeme))
}

fn resolve_slot(
    data: &StoreData,
    config: &SessionConfig,
    index: usize,
    slot: &MorphSlot,
    degraded: &mut Vec<usize>,
) -> ResolvedSlot {
    let mut lost = slot.missing;
    let morph = match slot.entry.value() {
        Some(choice) => {
            let morph = resolve_morph(data, config, slot, choice.entry, choice.morph);
            lost |= morph.is_none();
            morph
        }
        None => None,
    };
    let sense = slot.sense.value().map(|s| s.sense);
    let sense = match sense {
        Some(s) if data.sense(s).is_none() => {
            lost = true;
            None
        }
        other => other,
    };
    let msa = slot.msa.value().map(|m| m.msa);
    let msa = match msa {
        Some(m) if data.msa(m).is_none() => {
            lost = true;
            None
        }
        other => other,
    };
    if lost {
        warn!(slot = index, "lexicon reference vanished, slot degraded");
        degraded.push(index);
    }
    ResolvedSlot {
        form: slot.form.value().cloned().unwrap_or_default(),
        morph,
        sense,
        msa,
    }
}

/// The interpretation the record was loaded from, when it names an analysis.
fn loaded_interpretation(record: &StagingRecord) -> Option<Interpretation> {
    match &record.source {
        RecordSource::Existing(interpretation) => Some(interpretation.clone()),
        RecordSource::Guess(guess) => Some(guess.target.interpretation()),
        RecordSource::Empty => None,
    }
}

/// An analysis of the record's wordform with exactly these slots and
/// category. The one the record was loaded from wins over older matches.
fn matching_analysis(
    data: &StoreData,
    record: &StagingRecord,
    slots: &[ResolvedSlot],
    category: Option<PosId>,
) -> Option<AnalysisId> {
    let loaded = loaded_interpretation(record).and_then(|i| data.interpretation_analysis(&i));
    let fits = |a: &Analysis| {
        a.category == category && {
            let bundles = data.bundles_of(a.id);
            bundles.len() == slots.len() && bundles.iter().zip(slots).all(|(b, s)| s.matches(b))
        }
    };
    let analyses = data.analyses_of(record.wordform);
    analyses
        .iter()
        .find(|a| Some(a.id) == loaded && fits(**a))
        .or_else(|| analyses.iter().find(|a| fits(**a)))
        .map(|a| a.id)
}

/// A gloss of `analysis` covering the staged text, the loaded one first.
fn matching_gloss(
    data: &StoreData,
    record: &StagingRecord,
    analysis: AnalysisId,
    staged: &MultiString,
) -> Option<GlossId> {
    let loaded = match loaded_interpretation(record) {
        Some(Interpretation::Gloss(id)) => Some(id),
        _ => None,
    };
    let glosses = data.glosses_of(analysis);
    glosses
        .iter()
        .find(|g| Some(g.id) == loaded && g.form.covers(staged))
        .or_else(|| glosses.iter().find(|g| g.form.covers(staged)))
        .map(|g| g.id)
}

/// Writes `record` into the store.
///
/// Runs inside the caller's unit, so a failure anywhere leaves nothing
/// behind. Fails with [`AnnotateError::StaleOccurrence`] before any change
/// when the position no longer holds the loaded wordform.
pub fn commit(
    tx: &mut Transaction<'_>,
    config: &SessionConfig,
    record: &StagingRecord,
) -> AnnotateResult<CommitOutcome> {
    let at = record.occurrence;
    let current = tx
        .occurrence(at)
        .map(|o| o.interpretation.clone())
        .ok_or(AnnotateError::StaleOccurrence(at))?;
    if tx.interpretation_wordform(&current) != Some(record.loaded_wordform)
        || tx.wordform(record.wordform).is_none()
    {
        return Err(AnnotateError::StaleOccurrence(at));
    }

    let contents = &record.contents;
    // A record showing an analysis commits to one, even with nothing staged.
    let shows_analysis = matches!(
        &record.source,
        RecordSource::Existing(Interpretation::Analysis(_) | Interpretation::Gloss(_))
            | RecordSource::Guess(_)
    );

    let mut degraded = Vec::new();
    let mut created = false;
    let mut category_lost = false;
    let interpretation = if contents.is_trivial() && !shows_analysis {
        Interpretation::Wordform(record.wordform)
    } else {
        let data: &StoreData = &**tx;
        let slots: Vec<ResolvedSlot> = if contents.has_courtesy_morphemes() {
            Vec::new()
        } else {
            contents
                .morphemes
                .iter()
                .enumerate()
                .map(|(i, s)| resolve_slot(data, config, i, s, &mut degraded))
                .collect()
        };
        let category = match contents.word_pos.value().map(|p| p.pos) {
            Some(pos) if data.pos(pos).is_none() => {
                warn!(occurrence = %at, pos = %pos, "word category vanished, dropped");
                category_lost = true;
                None
            }
            other => other,
        };

        let analysis = match matching_analysis(data, record, &slots, category) {
            Some(existing) => {
                debug!(analysis = %existing, "reusing matching analysis");
                existing
            }
            None => {
                let id = tx.create_analysis(record.wordform)?;
                for slot in slots {
                    tx.create_bundle(id, slot.into_bundle())?;
                }
                if category.is_some() {
                    tx.set_category(id, category)?;
                }
                created = true;
                id
            }
        };

        let staged_gloss = contents.word_gloss.value().filter(|g| !g.is_empty());
        let interpretation = match staged_gloss {
            Some(staged) => {
                let gloss = match matching_gloss(tx, record, analysis, staged) {
                    Some(existing) => {
                        tx.mark_gloss_used(existing)?;
                        existing
                    }
                    None => {
                        created = true;
                        tx.create_gloss(analysis, staged.clone())?
                    }
                };
                Interpretation::Gloss(gloss)
            }
            None => Interpretation::Analysis(analysis),
        };
        tx.approve(analysis, Agent::Human)?;
        interpretation
    };

    let previous = tx.set_interpretation(at, interpretation.clone())?;
    let mut obsolete = Vec::new();
    if let Some(old) = tx.interpretation_analysis(&previous) {
        if tx.interpretation_analysis(&interpretation) != Some(old) {
            obsolete.push(Obsolete::Analysis(old));
        }
    }
    if record.is_case_rebound() {
        obsolete.push(Obsolete::Wordform(record.loaded_wordform));
    }

    debug!(occurrence = %at, created, degraded = degraded.len(), "committed record");
    Ok(CommitOutcome {
        interpretation,
        obsolete,
        degraded,
        category_lost,
        created,
    })
}
