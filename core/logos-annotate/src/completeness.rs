use logos_protocol::{Interpretation, LineKind, LineKinds, MorphBundle, OccurrenceRef};
use logos_store::StoreData;

use crate::config::SessionConfig;

fn bundle_has_entry(data: &StoreData, bundle: &MorphBundle) -> bool {
    bundle
        .morph
        .and_then(|m| data.morph(m))
        .map_or(false, |m| data.entry(m.owner).is_some())
}

fn bundle_has_sense(data: &StoreData, bundle: &MorphBundle) -> bool {
    bundle.sense.map_or(false, |s| data.sense(s).is_some())
}

fn bundle_has_pos(data: &StoreData, bundle: &MorphBundle) -> bool {
    bundle
        .msa
        .and_then(|m| data.msa(m))
        .map_or(false, |m| m.pos.map_or(false, |p| data.pos(p).is_some()))
}

/// Word-level lines the occurrence at `at` does not yet fill.
///
/// Punctuation and vanished positions miss nothing. Annotation lines are
/// never reported.
pub fn missing_lines(data: &StoreData, config: &SessionConfig, at: OccurrenceRef) -> LineKinds {
    let mut missing = LineKinds::empty();
    let occurrence = match data.occurrence(at) {
        Some(o) if !o.is_punctuation() => o,
        _ => return missing,
    };
    let interpretation = &occurrence.interpretation;
    let wordform = data
        .interpretation_wordform(interpretation)
        .and_then(|w| data.wordform(w));
    let analysis = data
        .interpretation_analysis(interpretation)
        .and_then(|a| data.analysis(a));
    let bundles = analysis.map(|a| data.bundles_of(a.id)).unwrap_or_default();
    let every_bundle = |check: fn(&StoreData, &MorphBundle) -> bool| {
        !bundles.is_empty() && bundles.iter().all(|b| check(data, b))
    };

    for line in config.lines.word_lines() {
        let ws = config.ws_of(line);
        let filled = match line.kind {
            LineKind::Word => wordform.map_or(false, |w| w.form.has_text(ws)),
            LineKind::Morphemes | LineKind::LexEntries => every_bundle(bundle_has_entry),
            LineKind::LexGloss => every_bundle(bundle_has_sense),
            LineKind::LexPos => every_bundle(bundle_has_pos),
            LineKind::WordGloss => match interpretation {
                Interpretation::Gloss(g) => data.gloss(*g).map_or(false, |g| g.form.has_text(ws)),
                _ => false,
            },
            LineKind::WordPos => analysis.map_or(false, |a| a.category.is_some()),
            LineKind::FreeTranslation | LineKind::LiteralTranslation | LineKind::Note => true,
        };
        if !filled {
            missing |= line.kind.flag();
        }
    }
    missing
}

pub fn is_fully_analyzed(data: &StoreData, config: &SessionConfig, at: OccurrenceRef) -> bool {
    missing_lines(data, config, at).is_empty()
}
