//! Joining adjacent words into a phrase and breaking it up again.

use logos_protocol::{
    Interpretation, MultiString, Occurrence, OccurrenceRef, WordformId, WordformOrigin,
};
use logos_store::{Obsolete, StoreData, Transaction};
use tracing::debug;

use crate::error::{AnnotateError, AnnotateResult};

/// Unanalyzed word occurrence at `at`: its wordform and the occurrence.
fn plain_word(data: &StoreData, at: OccurrenceRef) -> Option<(WordformId, Occurrence)> {
    let occurrence = data.occurrence(at)?;
    match occurrence.interpretation {
        Interpretation::Wordform(id) => Some((id, occurrence.clone())),
        _ => None,
    }
}

fn joined_form(data: &StoreData, first: WordformId, second: WordformId) -> MultiString {
    let (a, b) = match (data.wordform(first), data.wordform(second)) {
        (Some(a), Some(b)) => (&a.form, &b.form),
        _ => return MultiString::new(),
    };
    let mut joined = MultiString::new();
    for (ws, left) in a.iter() {
        match b.get(ws) {
            Some(right) => joined.set(ws, format!("{}{}{}", left, data.word_separator(ws), right)),
            None => joined.set(ws, left),
        }
    }
    for (ws, right) in b.iter().filter(|(ws, _)| a.get(*ws).is_none()) {
        joined.set(ws, right);
    }
    joined
}

/// Merges the occurrence at `at` with the word right after it.
///
/// Both must be unanalyzed words of the same segment, and the joined text
/// must not already be a plain word. The phrase keeps the merged
/// occurrences so [`break_phrase`] can restore them exactly.
pub fn join_with_next(tx: &mut Transaction<'_>, at: OccurrenceRef) -> AnnotateResult<OccurrenceRef> {
    let next = at.segment_ref().occurrence(at.index + 1);
    let ((first, left), (second, right)) = match (plain_word(tx, at), plain_word(tx, next)) {
        (Some(l), Some(r)) => (l, r),
        _ => return Err(AnnotateError::IllegalJoin(at)),
    };

    let vernacular = tx.require_text(at.text)?.vernacular;
    let form = joined_form(tx, first, second);
    let parts = vec![first, second];
    let phrase = match form.get(vernacular).and_then(|t| tx.find_wordform(vernacular, t)) {
        Some(existing) if tx.require_wordform(existing)?.is_phrase() => existing,
        // The joined text is already an ordinary word ("ab" + "c" = "abc")
        Some(existing) => {
            debug!(occurrence = %at, wordform = %existing, "joined form is a plain word");
            return Err(AnnotateError::IllegalJoin(at));
        }
        None => tx.create_wordform(form, WordformOrigin::Joined(parts)),
    };

    let baseline = format!(
        "{}{}{}",
        left.baseline,
        tx.word_separator(vernacular),
        right.baseline
    );
    let occurrence = Occurrence {
        baseline,
        interpretation: Interpretation::Wordform(phrase),
        merged: vec![left, right],
    };
    tx.splice_occurrences(at.segment_ref(), at.index, 2, vec![occurrence])?;
    debug!(occurrence = %at, phrase = %phrase, "joined phrase");
    Ok(at)
}

/// Splits the phrase at `at` back into its parts and returns their positions.
///
/// The phrase wordform is deleted once nothing uses it.
pub fn break_phrase(tx: &mut Transaction<'_>, at: OccurrenceRef) -> AnnotateResult<Vec<OccurrenceRef>> {
    let occurrence = tx.require_occurrence(at)?.clone();
    let phrase = tx
        .interpretation_wordform(&occurrence.interpretation)
        .ok_or(AnnotateError::IllegalBreak(at))?;
    let components = match &tx.require_wordform(phrase)?.origin {
        WordformOrigin::Joined(parts) => parts.clone(),
        WordformOrigin::Token => return Err(AnnotateError::IllegalBreak(at)),
    };

    let vernacular = tx.require_text(at.text)?.vernacular;
    let restored = if occurrence.merged.is_empty() {
        // Joined elsewhere: rebuild the parts from the wordform.
        let mut rebuilt = Vec::new();
        for part in &components {
            let text = tx
                .require_wordform(*part)?
                .form
                .get(vernacular)
                .unwrap_or_default()
                .to_string();
            rebuilt.push(Occurrence::new(text, Interpretation::Wordform(*part)));
        }
        rebuilt
    } else {
        occurrence.merged.clone()
    };

    let count = restored.len();
    tx.splice_occurrences(at.segment_ref(), at.index, 1, restored)?;

    let mut obsolete = Vec::new();
    if let Some(analysis) = tx.interpretation_analysis(&occurrence.interpretation) {
        obsolete.push(Obsolete::Analysis(analysis));
    }
    obsolete.push(Obsolete::Wordform(phrase));
    tx.delete_obsolete(&obsolete)?;

    debug!(occurrence = %at, parts = count, "broke phrase");
    Ok((0..count)
        .map(|i| at.segment_ref().occurrence(at.index + i))
        .collect())
}
