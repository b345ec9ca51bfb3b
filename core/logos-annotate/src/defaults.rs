//! Lexicon defaults for a morpheme slot: which entry a form most likely
//! belongs to, and which sense and grammatical info follow from it.

use logos_protocol::{Agent, EntryId, MorphType, MsaId, SenseId, VariantType};
use logos_store::{StoreData, VariantGraph};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{AnnotateError, AnnotateResult};
use crate::sandbox::{EntryChoice, Field, MorphSlot, MsaChoice, SenseChoice};

/// Defaults come from the lexicon, not from a person.
const DEFAULT_AGENT: Agent = Agent::Parser;

pub(crate) fn msa_choice(data: &StoreData, msa: MsaId) -> Option<MsaChoice> {
    let found = data.msa(msa)?;
    let abbreviation = found
        .pos
        .and_then(|p| data.pos(p))
        .map(|p| p.abbreviation.clone())
        .unwrap_or_default();
    Some(MsaChoice {
        msa,
        pos: found.pos,
        abbreviation,
    })
}

pub(crate) fn sense_choice(data: &StoreData, sense: SenseId) -> Option<SenseChoice> {
    data.sense(sense).map(|s| SenseChoice {
        sense,
        gloss: s.gloss.clone(),
    })
}

/// Picks the entry for `form` used by the most morph bundles.
///
/// Equal usage goes to the oldest entry. Without a candidate the slot's
/// entry, sense and grammatical info are cleared.
pub fn establish_default_entry(
    data: &StoreData,
    config: &SessionConfig,
    slot: &mut MorphSlot,
    graph: &VariantGraph,
    form: &str,
    morph_type: MorphType,
    monomorphemic: bool,
) {
    let candidates = data.entry_candidates(config.vernacular, form, morph_type, monomorphemic);
    let mut best = match candidates.first() {
        Some(first) => *first,
        None => {
            slot.entry = Field::Empty;
            slot.sense = Field::Empty;
            slot.msa = Field::Empty;
            return;
        }
    };
    let mut tied = false;
    for candidate in &candidates[1..] {
        if candidate.usage > best.usage {
            best = *candidate;
            tied = false;
        } else if candidate.usage == best.usage {
            tied = true;
        }
    }
    if tied {
        debug!(form, entry = %best.entry, usage = best.usage, "equal usage, oldest entry wins");
    }

    let display = config
        .entry_ws()
        .into_iter()
        .filter_map(|ws| data.headword(best.entry, ws).map(|h| (ws, h)))
        .collect();
    slot.entry = Field::Guessed(
        EntryChoice {
            entry: best.entry,
            morph: Some(best.morph),
            display,
        },
        DEFAULT_AGENT,
    );
    // An entry found by lookup carries no explicit sense.
    if establish_default_sense(data, graph, slot, best.entry, None, None).is_err() {
        slot.sense = Field::Empty;
        slot.msa = Field::Empty;
    }
}

/// Fills the slot's sense and grammatical info for `entry`.
///
/// An explicit sense must belong to the entry's variant family and is kept
/// as an edit. Otherwise a variant entry takes its target's sense and any
/// other entry its first sense, marked as a guess. The grammatical info
/// follows the chosen sense.
pub fn establish_default_sense(
    data: &StoreData,
    graph: &VariantGraph,
    slot: &mut MorphSlot,
    entry: EntryId,
    explicit: Option<SenseId>,
    variant_type: Option<VariantType>,
) -> AnnotateResult<()> {
    let (sense, guessed) = match explicit {
        Some(sense) => {
            if !graph.sense_in_family(data, entry, sense) {
                return Err(AnnotateError::SenseOutsideFamily { sense, entry });
            }
            (Some(sense), false)
        }
        None => {
            let target = graph
                .target_sense(data, entry, variant_type)
                .or_else(|| data.entry(entry).and_then(|e| e.senses.first().copied()));
            (target, true)
        }
    };

    let sense_choice = sense.and_then(|s| sense_choice(data, s));
    let msa = sense
        .and_then(|s| data.sense(s))
        .and_then(|s| s.msa)
        .and_then(|m| msa_choice(data, m));
    if guessed {
        slot.sense = Field::guessed(sense_choice, DEFAULT_AGENT);
        slot.msa = Field::guessed(msa, DEFAULT_AGENT);
    } else {
        slot.sense = Field::edited(sense_choice);
        slot.msa = Field::edited(msa);
    }
    Ok(())
}
