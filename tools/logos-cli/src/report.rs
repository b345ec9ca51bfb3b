use std::io::Write;

use anyhow::Result;
use logos_annotate::AnnotationSession;
use logos_guess::{Guess, GuessTarget};
use logos_protocol::{Interpretation, TextId, WsId};
use logos_store::StoreData;

fn gloss_text(data: &StoreData, gloss: logos_protocol::GlossId, ws: WsId) -> String {
    data.gloss(gloss)
        .and_then(|g| g.form.get(ws))
        .map_or_else(|| gloss.to_string(), |t| format!("\"{}\"", t))
}

fn describe(data: &StoreData, interpretation: &Interpretation, ws: WsId) -> String {
    match interpretation {
        Interpretation::Wordform(_) => "-".to_string(),
        Interpretation::Analysis(id) => id.to_string(),
        Interpretation::Gloss(id) => gloss_text(data, *id, ws),
        Interpretation::Punctuation(mark) => mark.clone(),
    }
}

fn describe_guess(data: &StoreData, guess: Option<Guess>, ws: WsId) -> String {
    match guess.map(|g| (g.target, g.agent)) {
        Some((GuessTarget::Analysis(id), agent)) => format!("{} ({:?})", id, agent),
        Some((GuessTarget::Gloss(id), agent)) => format!("{} ({:?})", gloss_text(data, id, ws), agent),
        None => "-".to_string(),
    }
}

/// Counts for one text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub words: usize,
    pub analyzed: usize,
    pub complete: usize,
}

/// Writes one line per word occurrence: position, baseline, interpretation,
/// guess and the configured lines still missing.
pub fn write_report(
    session: &mut AnnotationSession,
    text: TextId,
    out: &mut impl Write,
) -> Result<Summary> {
    let ws = session.config().analysis;
    let found = session.data().require_text(text)?;
    let title = found.title.clone();
    let refs = found.occurrence_refs();
    writeln!(out, "# {}", title)?;

    let mut summary = Summary::default();
    for at in refs {
        let occurrence = match session.data().occurrence(at) {
            Some(o) if !o.is_punctuation() => o.clone(),
            _ => continue,
        };
        summary.words += 1;
        if !matches!(occurrence.interpretation, Interpretation::Wordform(_)) {
            summary.analyzed += 1;
        }

        let wordform = session.data().occurrence_wordform(at);
        let guess = wordform.and_then(|w| session.guess(w));
        let missing = session.missing_lines(at);
        if missing.is_empty() {
            summary.complete += 1;
        }
        let data = session.data();
        writeln!(
            out,
            "{}\t{}\t{}\tguess: {}\tmissing: {:?}",
            at,
            occurrence.baseline,
            describe(data, &occurrence.interpretation, ws),
            describe_guess(data, guess, ws),
            missing
        )?;
    }
    writeln!(
        out,
        "{} words, {} analyzed, {} complete",
        summary.words, summary.analyzed, summary.complete
    )?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    const PROJECT: &str = r#"{
        "vernacular": "seh",
        "analysis": "en",
        "texts": [{ "title": "Cats", "content": "cat ran. cat" }]
    }"#;

    #[test]
    fn test_report_lists_words_only() {
        let mut loaded = Project::from_json(PROJECT).unwrap().build(None).unwrap();
        let mut out = Vec::new();
        let summary = write_report(&mut loaded.session, loaded.texts[0], &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(
            summary,
            Summary {
                words: 3,
                analyzed: 0,
                complete: 0
            }
        );
        assert!(out.starts_with("# Cats\n"));
        assert_eq!(out.lines().filter(|l| l.contains("\tcat\t")).count(), 2);
        assert!(!out.contains("\t.\t"));
    }

    #[test]
    fn test_report_after_approve_all() {
        let mut loaded = Project::from_json(PROJECT).unwrap().build(None).unwrap();
        let text = loaded.texts[0];
        let en = loaded.session.config().analysis;
        let at = loaded.session.data().text(text).unwrap().occurrence_refs()[0];
        loaded.session.focus(at).unwrap();
        loaded.session.stage().unwrap().set_word_gloss(en, "feline");
        loaded.session.commit_active(false).unwrap();

        assert_eq!(loaded.session.approve_all(text).unwrap(), 1);
        let mut out = Vec::new();
        let summary = write_report(&mut loaded.session, text, &mut out).unwrap();
        assert_eq!(summary.analyzed, 2);
        assert!(String::from_utf8(out).unwrap().contains("\"feline\""));
    }
}
