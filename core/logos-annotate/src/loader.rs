use logos_guess::{GuessService, GuessTarget};
use logos_protocol::{
    AnalysisId, GlossId, Interpretation, MorphBundle, MorphType, MultiString, OccurrenceRef,
};
use logos_store::StoreData;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::defaults::{msa_choice, sense_choice};
use crate::error::{AnnotateError, AnnotateResult};
use crate::sandbox::{
    EntryChoice, Field, MorphSlot, PosChoice, RecordSource, StagedContents, StagingRecord,
};

/// Builds the staging record for the occurrence at `at`.
///
/// An occurrence bound to an analysis or gloss loads that content as is.
/// Otherwise the guess is loaded when `look_for_defaults` is set, else the
/// courtesy slot. With `adjust_case`, an unanalyzed Title-case word that
/// starts a sentence is rebound to its existing lower-case wordform.
pub fn load(
    data: &StoreData,
    guesses: &mut GuessService,
    config: &SessionConfig,
    at: OccurrenceRef,
    look_for_defaults: bool,
    adjust_case: bool,
) -> AnnotateResult<StagingRecord> {
    let occurrence = data
        .occurrence(at)
        .ok_or(AnnotateError::StaleOccurrence(at))?;
    if occurrence.is_punctuation() {
        return Err(AnnotateError::NotAnalyzable(at));
    }
    let loaded = data
        .interpretation_wordform(&occurrence.interpretation)
        .ok_or(AnnotateError::StaleOccurrence(at))?;

    match &occurrence.interpretation {
        Interpretation::Analysis(id) => {
            let contents = analysis_contents(data, config, loaded, *id, None);
            let source = RecordSource::Existing(occurrence.interpretation.clone());
            return Ok(StagingRecord::new(at, loaded, loaded, source, contents));
        }
        Interpretation::Gloss(id) => {
            let analysis = data.interpretation_analysis(&occurrence.interpretation);
            if let Some(analysis) = analysis {
                let contents = analysis_contents(data, config, loaded, analysis, Some(*id));
                let source = RecordSource::Existing(occurrence.interpretation.clone());
                return Ok(StagingRecord::new(at, loaded, loaded, source, contents));
            }
        }
        Interpretation::Wordform(_) | Interpretation::Punctuation(_) => {}
    }

    let mut wordform = loaded;
    if adjust_case
        && config.fold_sentence_initial_case
        && data.analyses_of(loaded).is_empty()
    {
        if let Some(folded) = GuessService::folded_wordform(data, at, loaded) {
            debug!(occurrence = %at, from = %loaded, to = %folded, "folded sentence-initial case");
            wordform = folded;
        }
    }

    if look_for_defaults {
        if let Some(guess) = guesses.guess(data, wordform, config.analysis) {
            let (analysis, gloss) = match guess.target {
                GuessTarget::Analysis(id) => (Some(id), None),
                GuessTarget::Gloss(id) => (data.gloss(id).map(|g| g.owner), Some(id)),
            };
            if let Some(analysis) = analysis {
                let contents = analysis_contents(data, config, wordform, analysis, gloss)
                    .into_guess(guess.agent);
                let source = RecordSource::Guess(guess);
                return Ok(StagingRecord::new(at, loaded, wordform, source, contents));
            }
        }
    }

    let word = word_text(data, wordform);
    Ok(StagingRecord::new(
        at,
        loaded,
        wordform,
        RecordSource::Empty,
        StagedContents::courtesy(word),
    ))
}

fn word_text(data: &StoreData, wordform: logos_protocol::WordformId) -> MultiString {
    data.wordform(wordform)
        .map(|w| w.form.clone())
        .unwrap_or_default()
}

fn analysis_contents(
    data: &StoreData,
    config: &SessionConfig,
    wordform: logos_protocol::WordformId,
    analysis: AnalysisId,
    gloss: Option<GlossId>,
) -> StagedContents {
    let word = word_text(data, wordform);
    let mut morphemes: Vec<MorphSlot> = data
        .bundles_of(analysis)
        .into_iter()
        .map(|b| bundle_slot(data, config, b))
        .collect();
    if morphemes.is_empty() {
        morphemes.push(MorphSlot::courtesy(word.clone()));
    }

    let word_gloss = Field::edited(gloss.and_then(|g| data.gloss(g)).map(|g| g.form.clone()));
    let word_pos = Field::edited(
        data.analysis(analysis)
            .and_then(|a| a.category)
            .and_then(|p| data.pos(p))
            .map(|p| PosChoice {
                pos: p.id,
                abbreviation: p.abbreviation.clone(),
            }),
    );
    StagedContents {
        word,
        morphemes,
        word_gloss,
        word_pos,
    }
}

fn bundle_slot(data: &StoreData, config: &SessionConfig, bundle: &MorphBundle) -> MorphSlot {
    let mut slot = MorphSlot::default();
    let morph = bundle.morph.and_then(|m| data.morph(m));
    slot.missing = bundle.morph.is_some() && morph.is_none();

    let form = match morph {
        Some(m) if bundle.form.is_empty() => m.form.clone(),
        _ => bundle.form.clone(),
    };
    slot.form = if form.is_empty() {
        Field::Empty
    } else {
        Field::Edited(form)
    };
    slot.morph_type = morph.map_or(MorphType::Stem, |m| m.morph_type);

    if let Some(m) = morph.filter(|m| data.entry(m.owner).is_some()) {
        let display = config
            .entry_ws()
            .into_iter()
            .filter_map(|ws| data.headword(m.owner, ws).map(|h| (ws, h)))
            .collect();
        slot.entry = Field::Edited(EntryChoice {
            entry: m.owner,
            morph: Some(m.id),
            display,
        });
    }
    if let Some(sense) = bundle.sense {
        match sense_choice(data, sense) {
            Some(choice) => slot.sense = Field::Edited(choice),
            None => slot.missing = true,
        }
    }
    if let Some(msa) = bundle.msa {
        match msa_choice(data, msa) {
            Some(choice) => slot.msa = Field::Edited(choice),
            None => slot.missing = true,
        }
    }
    if slot.missing {
        warn!(bundle = %bundle.id, "bundle refers to deleted lexicon objects");
    }
    slot
}
