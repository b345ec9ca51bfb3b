pub mod commit;
pub mod completeness;
pub mod config;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod navigation;
pub mod phrase;
pub mod sandbox;
pub mod session;
pub mod undo;

pub use commit::{commit, CommitOutcome};
pub use completeness::{is_fully_analyzed, missing_lines};
pub use config::SessionConfig;
pub use defaults::{establish_default_entry, establish_default_sense};
pub use error::{AnnotateError, AnnotateResult};
pub use loader::load;
pub use navigation::{
    annotation_stop, first_occurrence, next_target, AnnotationTarget, Direction, NavFilter,
    NavPosition, NavTarget,
};
pub use sandbox::{
    EntryChoice, Field, MorphSlot, MsaChoice, PosChoice, RecordSource, SenseChoice, Stage,
    StagedContents, StagingRecord,
};
pub use session::AnnotationSession;

#[cfg(test)]
mod tests {
    use super::*;
    use logos_guess::{GuessService, GuessTarget};
    use logos_protocol::{
        Agent, AnalysisLine, Interpretation, LineConfig, LineKind, LineKinds, MorphType,
        MultiString, OccurrenceRef, SegmentRef, TextId, VariantLink,
        VariantTarget, VariantType, WsId, WsSelector,
    };
    use logos_store::{NewBundle, Store, StoreError};
    use proptest::prelude::*;

    struct Fixture {
        store: Store,
        text: TextId,
        vern: WsId,
        en: WsId,
    }

    fn fixture(input: &str) -> Fixture {
        let mut store = Store::new();
        let (vern, en, text) = store.setup(|d| {
            let vern = d.add_writing_system("seh", true, " ");
            let en = d.add_writing_system("en", false, " ");
            let text = logos_parser::import_text(d, "demo", vern, input).unwrap();
            (vern, en, text)
        });
        store.take_changes();
        Fixture {
            store,
            text,
            vern,
            en,
        }
    }

    impl Fixture {
        fn session(self) -> AnnotationSession {
            let config = SessionConfig::new(self.vern, self.en);
            AnnotationSession::new(self.store, config)
        }
    }

    fn occ(text: TextId, segment: usize, index: usize) -> OccurrenceRef {
        SegmentRef {
            text,
            paragraph: 0,
            segment,
        }
        .occurrence(index)
    }

    fn interpretation(session: &AnnotationSession, at: OccurrenceRef) -> Interpretation {
        session.data().occurrence(at).unwrap().interpretation.clone()
    }

    #[test]
    fn test_gloss_on_unanalyzed_word_creates_analysis() {
        let f = fixture("cat");
        let (text, en) = (f.text, f.en);
        let mut session = f.session();
        let at = occ(text, 0, 0);
        let cat = session.data().occurrence_wordform(at).unwrap();

        session.focus(at).unwrap();
        session.stage().unwrap().set_word_gloss(en, "feline");
        assert!(session.active().unwrap().is_dirty());

        let target = session.approve_and_advance(true, Direction::Forward).unwrap();
        assert_eq!(target, NavTarget::EndOfText);

        let analyses = session.data().analyses_of(cat);
        assert_eq!(analyses.len(), 1);
        assert!(analyses[0].is_approved_by(Agent::Human));
        let glosses = session.data().glosses_of(analyses[0].id);
        assert_eq!(glosses.len(), 1);
        assert_eq!(glosses[0].form.get(en), Some("feline"));
        assert_eq!(interpretation(&session, at), Interpretation::Gloss(glosses[0].id));

        assert!(session.active().map_or(true, |r| !r.is_dirty()));
        assert!(!session.guesses().is_cached(cat));
    }

    #[test]
    fn test_whole_text_approval_leaves_other_analyses_alone() {
        let mut f = fixture("run run run");
        let text = f.text;
        let en = f.en;
        let run = f.store.data().occurrence_wordform(occ(text, 0, 0)).unwrap();
        let other = f.store.setup(|d| {
            let verb = d.create_pos(MultiString::single(en, "verb"), MultiString::single(en, "v"));
            let other = d.create_analysis(run).unwrap();
            d.set_category(other, Some(verb)).unwrap();
            d.approve(other, Agent::Human).unwrap();
            d.set_interpretation(occ(text, 0, 2), Interpretation::Analysis(other))
                .unwrap();
            other
        });
        let mut session = f.session();

        session.focus(occ(text, 0, 0)).unwrap();
        assert!(session.active().unwrap().is_guess_loaded());
        {
            let mut stage = session.stage().unwrap();
            stage.set_word_pos(None).unwrap();
            stage.set_word_gloss(en, "sprint");
        }
        let rewritten = session.approve_for_whole_text().unwrap();
        assert_eq!(rewritten, 1);

        let first = interpretation(&session, occ(text, 0, 0));
        assert!(matches!(first, Interpretation::Gloss(_)));
        assert_eq!(interpretation(&session, occ(text, 0, 1)), first);
        assert_ne!(session.data().interpretation_analysis(&first), Some(other));
        assert_eq!(
            interpretation(&session, occ(text, 0, 2)),
            Interpretation::Analysis(other)
        );
        assert_eq!(session.data().analyses_of(run).len(), 2);
    }

    #[test]
    fn test_clean_record_commits_to_what_it_was_loaded_from() {
        let mut f = fixture("cat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let at = occ(text, 0, 0);
        let cat = f.store.data().occurrence_wordform(at).unwrap();
        let gloss = f.store.setup(|d| {
            let entry = d.create_entry(MultiString::single(vern, "cat"), MorphType::Stem);
            let sense = d.create_sense(entry, MultiString::single(en, "cat"), None).unwrap();
            let lexeme = d.entry(entry).unwrap().lexeme;
            let analysis = d.create_analysis(cat).unwrap();
            d.create_bundle(
                analysis,
                NewBundle {
                    form: MultiString::single(vern, "cat"),
                    morph: Some(lexeme),
                    sense: Some(sense),
                    msa: None,
                },
            )
            .unwrap();
            let gloss = d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap();
            d.set_interpretation(at, Interpretation::Gloss(gloss)).unwrap();
            gloss
        });

        let config = SessionConfig::new(vern, en);
        let mut guesses = GuessService::new();
        let record = load(f.store.data(), &mut guesses, &config, at, true, true).unwrap();
        assert!(!record.should_save(true));
        let before = (
            f.store.data().analyses().count(),
            f.store.data().bundles().count(),
        );

        let outcome = f
            .store
            .unit("commit", |tx| commit(tx, &config, &record))
            .unwrap();
        assert_eq!(outcome.interpretation, Interpretation::Gloss(gloss));
        assert!(!outcome.created);
        assert!(outcome.obsolete.is_empty());
        assert!(outcome.degraded.is_empty());
        assert_eq!(
            before,
            (
                f.store.data().analyses().count(),
                f.store.data().bundles().count()
            )
        );
    }

    #[test]
    fn test_identical_records_share_one_analysis() {
        let mut f = fixture("dog dog");
        let (text, vern, en) = (f.text, f.vern, f.en);
        f.store.setup(|d| {
            let entry = d.create_entry(MultiString::single(vern, "dog"), MorphType::Stem);
            d.create_sense(entry, MultiString::single(en, "dog"), None).unwrap();
        });
        let config = SessionConfig::new(vern, en);
        let mut guesses = GuessService::new();

        let mut records = Vec::new();
        for index in 0..2 {
            let mut record = load(
                f.store.data(),
                &mut guesses,
                &config,
                occ(text, 0, index),
                false,
                false,
            )
            .unwrap();
            let mut stage = Stage::new(f.store.data(), &config, &mut record);
            stage.set_morpheme_form(0, "dog").unwrap();
            stage.set_word_gloss(en, "canine");
            records.push(record);
        }

        let mut interpretations = Vec::new();
        for record in &records {
            let outcome = f
                .store
                .unit("commit", |tx| commit(tx, &config, record))
                .unwrap();
            interpretations.push(outcome.interpretation);
        }
        assert_eq!(interpretations[0], interpretations[1]);
        let dog = records[0].wordform();
        assert_eq!(f.store.data().analyses_of(dog).len(), 1);
    }

    #[test]
    fn test_added_line_is_checked() {
        let mut f = fixture("cat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let at = occ(text, 0, 0);
        let cat = f.store.data().occurrence_wordform(at).unwrap();
        f.store.setup(|d| {
            let analysis = d.create_analysis(cat).unwrap();
            let gloss = d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap();
            d.set_interpretation(at, Interpretation::Gloss(gloss)).unwrap();
        });

        let lines = LineConfig::new(vec![
            AnalysisLine::new(LineKind::Word, WsSelector::Vernacular),
            AnalysisLine::new(LineKind::WordGloss, WsSelector::Analysis),
            AnalysisLine::new(LineKind::FreeTranslation, WsSelector::Analysis),
        ]);
        let config = SessionConfig::new(vern, en).with_lines(lines.clone());
        assert!(is_fully_analyzed(f.store.data(), &config, at));

        let config = config.with_lines(lines.with(AnalysisLine::new(
            LineKind::WordPos,
            WsSelector::Analysis,
        )));
        assert!(!is_fully_analyzed(f.store.data(), &config, at));
        assert_eq!(missing_lines(f.store.data(), &config, at), LineKinds::WORD_POS);
    }

    #[test]
    fn test_guesses_never_point_at_deleted_analyses() {
        let mut f = fixture("cat");
        let (text, en) = (f.text, f.en);
        let at = occ(text, 0, 0);
        let cat = f.store.data().occurrence_wordform(at).unwrap();
        let old = f.store.setup(|d| {
            let noun = d.create_pos(MultiString::single(en, "noun"), MultiString::single(en, "n"));
            let old = d.create_analysis(cat).unwrap();
            d.set_category(old, Some(noun)).unwrap();
            d.approve(old, Agent::Parser).unwrap();
            d.set_interpretation(at, Interpretation::Analysis(old)).unwrap();
            old
        });
        let mut session = f.session();
        assert_eq!(
            session.guess(cat).map(|g| g.target),
            Some(GuessTarget::Analysis(old))
        );

        session.focus(at).unwrap();
        {
            let mut stage = session.stage().unwrap();
            stage.set_word_pos(None).unwrap();
            stage.set_word_gloss(en, "feline");
        }
        session.commit_active(false).unwrap().unwrap();
        assert!(session.data().analysis(old).is_none());

        let guess = session.guess(cat).unwrap();
        assert!(guess.target.exists(session.data()));
        let committed = session.data().interpretation_analysis(&interpretation(&session, at));
        assert_eq!(guess.target.analysis(session.data()), committed);
    }

    #[test]
    fn test_undo_and_redo_move_focus() {
        let f = fixture("cat dog");
        let (text, en) = (f.text, f.en);
        let mut session = f.session();
        let (first, second) = (occ(text, 0, 0), occ(text, 0, 1));
        let cat = session.data().occurrence_wordform(first).unwrap();

        session.focus(first).unwrap();
        session.stage().unwrap().set_word_gloss(en, "feline");
        assert_eq!(
            session.approve_and_advance(false, Direction::Forward).unwrap(),
            NavTarget::Occurrence(second)
        );
        assert_eq!(session.data().analyses_of(cat).len(), 1);

        let undone = session.undo().unwrap().unwrap();
        assert_eq!(undone.label, "Approve");
        assert!(session.data().analyses_of(cat).is_empty());
        assert_eq!(session.focused(), Some(first));
        assert!(!session.active().unwrap().is_dirty());

        session.redo().unwrap().unwrap();
        assert_eq!(session.data().analyses_of(cat).len(), 1);
        assert_eq!(session.focused(), Some(second));
        assert!(!session.can_redo());
    }

    #[test]
    fn test_stale_occurrence_aborts_without_change() {
        let f = fixture("cat dog");
        let (text, vern) = (f.text, f.vern);
        let mut session = f.session();
        let at = occ(text, 0, 1);
        session.focus(at).unwrap();

        session.setup(|d| {
            let cow = d.find_or_create_wordform(vern, "cow");
            d.set_interpretation(at, Interpretation::Wordform(cow)).unwrap();
        });
        let err = session.approve_and_advance(true, Direction::Forward).unwrap_err();
        assert_eq!(err, AnnotateError::StaleOccurrence(at));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_dirty_record_blocks_focus_change() {
        let f = fixture("cat dog.");
        let (text, en) = (f.text, f.en);
        let mut session = f.session();
        session.focus(occ(text, 0, 0)).unwrap();
        session.stage().unwrap().set_word_gloss(en, "feline");

        let err = session.focus(occ(text, 0, 1)).unwrap_err();
        assert_eq!(err, AnnotateError::DirtyRecord(occ(text, 0, 0)));

        session.discard();
        session.focus(occ(text, 0, 1)).unwrap();
        let err = session.focus(occ(text, 0, 2)).unwrap_err();
        assert_eq!(err, AnnotateError::NotAnalyzable(occ(text, 0, 2)));
    }

    #[test]
    fn test_default_entry_sense_and_msa() {
        let mut f = fixture("kat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let (older, newer, newer_sense, msa, variant, older_sense) = f.store.setup(|d| {
            let noun = d.create_pos(MultiString::single(en, "noun"), MultiString::single(en, "n"));
            let older = d.create_entry(MultiString::single(vern, "kat"), MorphType::Stem);
            let older_sense =
                d.create_sense(older, MultiString::single(en, "cat"), None).unwrap();
            let newer = d.create_entry(MultiString::single(vern, "kat"), MorphType::Root);
            let msa = d.create_msa(newer, Some(noun)).unwrap();
            let newer_sense = d
                .create_sense(newer, MultiString::single(en, "spite"), Some(msa))
                .unwrap();
            let variant = d.create_entry(MultiString::single(vern, "katt"), MorphType::Stem);
            d.add_variant_link(
                variant,
                VariantLink {
                    target: VariantTarget::Entry(newer),
                    kind: VariantType::Spelling,
                },
            )
            .unwrap();
            (older, newer, newer_sense, msa, variant, older_sense)
        });
        let mut session = f.session();
        session.focus(occ(text, 0, 0)).unwrap();
        let mut stage = session.stage().unwrap();

        // Equal usage: the older entry wins
        stage.set_morpheme_form(0, "kat").unwrap();
        let slot = &stage.record().contents().morphemes[0];
        assert_eq!(slot.entry.value().map(|e| e.entry), Some(older));
        assert!(slot.entry.is_guess());
        assert_eq!(slot.sense.value().map(|s| s.sense), Some(older_sense));
        assert!(slot.msa.is_empty());

        stage.set_morph_entry(0, newer, None).unwrap();
        let slot = &stage.record().contents().morphemes[0];
        assert!(!slot.entry.is_guess());
        assert_eq!(slot.sense.value().map(|s| s.sense), Some(newer_sense));
        assert!(slot.sense.is_guess());
        assert_eq!(slot.msa.value().map(|m| m.msa), Some(msa));

        let err = stage.set_morph_entry(0, newer, Some(older_sense)).unwrap_err();
        assert_eq!(
            err,
            AnnotateError::SenseOutsideFamily {
                sense: older_sense,
                entry: newer
            }
        );

        // A variant takes its target's sense; an explicit one is an edit
        stage.set_morph_entry(0, variant, None).unwrap();
        let slot = &stage.record().contents().morphemes[0];
        assert_eq!(slot.sense.value().map(|s| s.sense), Some(newer_sense));
        stage.set_morph_entry(0, variant, Some(newer_sense)).unwrap();
        assert!(!stage.record().contents().morphemes[0].sense.is_guess());
    }

    #[test]
    fn test_slot_editing() {
        let f = fixture("cats");
        let text = f.text;
        let vern = f.vern;
        let mut session = f.session();
        session.focus(occ(text, 0, 0)).unwrap();
        let mut stage = session.stage().unwrap();

        stage.split_slot(0, 3).unwrap();
        let forms: Vec<_> = stage
            .record()
            .contents()
            .morphemes
            .iter()
            .map(|s| s.marked_form(vern).unwrap())
            .collect();
        assert_eq!(forms, vec!["cat", "s"]);

        stage.remove_slot(1).unwrap();
        stage.insert_slot(1, "-s").unwrap();
        let suffix = &stage.record().contents().morphemes[1];
        assert_eq!(suffix.morph_type, MorphType::Suffix);
        assert_eq!(suffix.marked_form(vern).as_deref(), Some("-s"));

        stage.merge_slot_with_next(0).unwrap();
        assert_eq!(stage.record().contents().morphemes.len(), 1);
        assert_eq!(stage.record().contents().morphemes[0].form_text(vern), Some("cats"));
        assert_eq!(stage.remove_slot(4).unwrap_err(), AnnotateError::NoSuchSlot(4));

        stage.reset();
        assert!(!stage.record().is_dirty());
    }

    #[test]
    fn test_vanished_sense_degrades_slot() {
        let mut f = fixture("kat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let sense = f.store.setup(|d| {
            let entry = d.create_entry(MultiString::single(vern, "kat"), MorphType::Stem);
            d.create_sense(entry, MultiString::single(en, "cat"), None).unwrap()
        });
        let mut session = f.session();
        let at = occ(text, 0, 0);
        session.focus(at).unwrap();
        session.stage().unwrap().set_morpheme_form(0, "kat").unwrap();

        session.setup(|d| d.delete_sense(sense).unwrap());
        let outcome = session.commit_active(false).unwrap().unwrap();
        assert_eq!(outcome.degraded, vec![0]);

        let analysis = outcome.analysis(session.data()).unwrap();
        let bundles = session.data().bundles_of(analysis);
        assert_eq!(bundles.len(), 1);
        assert!(bundles[0].morph.is_some());
        assert_eq!(bundles[0].sense, None);
    }

    #[test]
    fn test_annotation_stop_between_segments() {
        let mut f = fixture("cat. dog");
        let (text, en) = (f.text, f.en);
        let first_segment = occ(text, 0, 0).segment_ref();
        f.store.setup(|d| {
            d.set_free_translation(first_segment, en, "A cat.").unwrap();
        });
        let mut session = f.session();
        session.focus(occ(text, 0, 0)).unwrap();

        let target = session.approve_and_advance(false, Direction::Forward).unwrap();
        match target {
            NavTarget::Annotation(annotation) => {
                assert_eq!(annotation.segment, first_segment);
                assert_eq!(annotation.line.kind, LineKind::FreeTranslation);
            }
            other => panic!("expected the free translation, got {:?}", other),
        }
        assert!(session.active().is_none());

        let target = session.approve_and_advance(false, Direction::Forward).unwrap();
        assert_eq!(target, NavTarget::Occurrence(occ(text, 1, 0)));

        let target = session.approve_and_advance(false, Direction::Backward).unwrap();
        assert!(matches!(target, NavTarget::Annotation(_)));
    }

    #[test]
    fn test_skip_passes_complete_occurrences() {
        let mut f = fixture("cat dog cat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let cat = f.store.data().occurrence_wordform(occ(text, 0, 0)).unwrap();
        f.store.setup(|d| {
            let analysis = d.create_analysis(cat).unwrap();
            let gloss = d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap();
            for index in [0, 2] {
                d.set_interpretation(occ(text, 0, index), Interpretation::Gloss(gloss))
                    .unwrap();
            }
        });
        let lines = LineConfig::new(vec![
            AnalysisLine::new(LineKind::Word, WsSelector::Vernacular),
            AnalysisLine::new(LineKind::WordGloss, WsSelector::Analysis),
        ]);
        let config = SessionConfig::new(vern, en).with_lines(lines);
        let mut session = AnnotationSession::new(f.store, config);

        session.focus(occ(text, 0, 0)).unwrap();
        let target = session.skip_to_incomplete(Direction::Forward).unwrap();
        assert_eq!(target, NavTarget::Occurrence(occ(text, 0, 1)));
        let target = session.skip_to_incomplete(Direction::Forward).unwrap();
        assert_eq!(target, NavTarget::EndOfText);
    }

    #[test]
    fn test_approve_all_stores_guesses() {
        let mut f = fixture("cat cat dog");
        let (text, en) = (f.text, f.en);
        let cat = f.store.data().occurrence_wordform(occ(text, 0, 0)).unwrap();
        let gloss = f.store.setup(|d| {
            let analysis = d.create_analysis(cat).unwrap();
            d.approve(analysis, Agent::Human).unwrap();
            d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap()
        });
        let mut session = f.session();

        let replaced = session.approve_all(text).unwrap();
        assert_eq!(replaced, 2);
        for index in [0, 1] {
            assert_eq!(
                interpretation(&session, occ(text, 0, index)),
                Interpretation::Gloss(gloss)
            );
        }
        assert!(matches!(
            interpretation(&session, occ(text, 0, 2)),
            Interpretation::Wordform(_)
        ));
        assert_eq!(session.focused(), Some(occ(text, 0, 0)));

        // One unit: a single undo restores every occurrence
        session.undo().unwrap().unwrap();
        assert_eq!(
            interpretation(&session, occ(text, 0, 1)),
            Interpretation::Wordform(cat)
        );
    }

    #[test]
    fn test_sentence_initial_capital_is_folded() {
        let mut f = fixture("Cat ran. The cat ran.");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let cat = f.store.data().occurrence_wordform(occ(text, 1, 1)).unwrap();
        let gloss = f.store.setup(|d| {
            let analysis = d.create_analysis(cat).unwrap();
            d.approve(analysis, Agent::Human).unwrap();
            d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap()
        });
        let mut session = f.session();
        let at = occ(text, 0, 0);

        let record = session.focus(at).unwrap();
        assert!(record.is_case_rebound());
        assert_eq!(record.wordform(), cat);

        session.approve_and_advance(true, Direction::Forward).unwrap();
        assert_eq!(interpretation(&session, at), Interpretation::Gloss(gloss));
        assert_eq!(session.data().find_wordform(vern, "Cat"), None);
        // "the" does not exist, so "The" stays as it is
        assert!(session.data().find_wordform(vern, "The").is_some());
    }

    #[test]
    fn test_join_and_break_restore_occurrences() {
        let f = fixture("big dog ran");
        let (text, vern) = (f.text, f.vern);
        let mut session = f.session();
        let segment = occ(text, 0, 0).segment_ref();
        let original = session.data().segment(segment).unwrap().occurrences.clone();

        session.focus(occ(text, 0, 1)).unwrap();
        let joined = session.join_with_next().unwrap();
        let phrase = session.data().occurrence_wordform(joined).unwrap();
        assert_eq!(
            session.data().wordform(phrase).unwrap().form.get(vern),
            Some("dog ran")
        );
        assert_eq!(session.data().segment(segment).unwrap().occurrences.len(), 2);

        let parts = session.break_phrase().unwrap();
        assert_eq!(parts, vec![occ(text, 0, 1), occ(text, 0, 2)]);
        assert_eq!(session.data().segment(segment).unwrap().occurrences, original);
        assert_eq!(session.data().wordform(phrase), None);
    }

    #[test]
    fn test_join_rejects_analyzed_or_final_words() {
        let mut f = fixture("big dog.");
        let text = f.text;
        let dog = f.store.data().occurrence_wordform(occ(text, 0, 1)).unwrap();
        f.store.setup(|d| {
            let analysis = d.create_analysis(dog).unwrap();
            d.set_interpretation(occ(text, 0, 1), Interpretation::Analysis(analysis))
                .unwrap();
        });
        let mut session = f.session();

        session.focus(occ(text, 0, 0)).unwrap();
        assert_eq!(
            session.join_with_next().unwrap_err(),
            AnnotateError::IllegalJoin(occ(text, 0, 0))
        );
        session.focus(occ(text, 0, 1)).unwrap();
        assert_eq!(
            session.join_with_next().unwrap_err(),
            AnnotateError::IllegalJoin(occ(text, 0, 1))
        );
        assert_eq!(
            session.break_phrase().unwrap_err(),
            AnnotateError::IllegalBreak(occ(text, 0, 1))
        );
        assert!(!session.can_undo());
    }

    #[test]
    fn test_failed_unit_reports_store_error() {
        let f = fixture("cat");
        let mut store = f.store;
        let result: Result<(), AnnotateError> = store.unit("broken", |tx| {
            tx.require_analysis(logos_protocol::AnalysisId(404))?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(AnnotateError::Store(StoreError::Missing(_)))
        ));
    }

    #[test]
    fn test_rejected_sense_leaves_slot_unchanged() {
        let mut f = fixture("kat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let (first, first_sense, second) = f.store.setup(|d| {
            let first = d.create_entry(MultiString::single(vern, "kat"), MorphType::Stem);
            let first_sense = d.create_sense(first, MultiString::single(en, "cat"), None).unwrap();
            let second = d.create_entry(MultiString::single(vern, "kat"), MorphType::Stem);
            d.create_sense(second, MultiString::single(en, "spite"), None).unwrap();
            (first, first_sense, second)
        });
        let mut session = f.session();
        session.focus(occ(text, 0, 0)).unwrap();
        let mut stage = session.stage().unwrap();
        stage.set_morph_entry(0, first, Some(first_sense)).unwrap();
        let before = stage.record().contents().morphemes[0].clone();

        assert_eq!(
            stage.set_morph_entry(0, second, Some(first_sense)).unwrap_err(),
            AnnotateError::SenseOutsideFamily {
                sense: first_sense,
                entry: second
            }
        );
        let slot = &stage.record().contents().morphemes[0];
        assert_eq!(slot, &before);
        assert_eq!(slot.entry.value().map(|e| e.entry), Some(first));
        assert_eq!(slot.sense.value().map(|s| s.sense), Some(first_sense));
    }

    #[test]
    fn test_join_onto_existing_plain_word_is_refused() {
        let mut store = Store::new();
        let (th, en, text) = store.setup(|d| {
            let th = d.add_writing_system("th", true, "");
            let en = d.add_writing_system("en", false, " ");
            let text = logos_parser::import_text(d, "demo", th, "ab c abc").unwrap();
            (th, en, text)
        });
        store.take_changes();
        let mut session = AnnotationSession::new(store, SessionConfig::new(th, en));
        let segment = occ(text, 0, 0).segment_ref();
        let abc = session.data().find_wordform(th, "abc").unwrap();

        session.focus(occ(text, 0, 0)).unwrap();
        assert_eq!(
            session.join_with_next().unwrap_err(),
            AnnotateError::IllegalJoin(occ(text, 0, 0))
        );
        assert!(!session.data().wordform(abc).unwrap().is_phrase());
        assert_eq!(session.data().segment(segment).unwrap().occurrences.len(), 3);

        // The genuine word cannot be broken up
        session.focus(occ(text, 0, 2)).unwrap();
        assert_eq!(
            session.break_phrase().unwrap_err(),
            AnnotateError::IllegalBreak(occ(text, 0, 2))
        );
        assert!(!session.can_undo());
    }

    #[test]
    fn test_setup_after_commit_cannot_be_undone_away() {
        let f = fixture("cat dog");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let mut session = f.session();
        let at = occ(text, 0, 0);
        session.focus(at).unwrap();
        session.stage().unwrap().set_word_gloss(en, "feline");
        session.approve_and_advance(false, Direction::Forward).unwrap();
        assert!(session.can_undo());

        let entry =
            session.setup(|d| d.create_entry(MultiString::single(vern, "dog"), MorphType::Stem));
        assert!(!session.can_undo());
        assert!(session.undo().unwrap().is_none());
        assert!(session.data().entry(entry).is_some());
        assert!(matches!(interpretation(&session, at), Interpretation::Gloss(_)));
    }

    #[test]
    fn test_advancing_crosses_paragraphs() {
        let f = fixture("cat\n\ndog");
        let text = f.text;
        let mut session = f.session();
        let next = SegmentRef {
            text,
            paragraph: 1,
            segment: 0,
        }
        .occurrence(0);
        session.focus(occ(text, 0, 0)).unwrap();

        let target = session.approve_and_advance(false, Direction::Forward).unwrap();
        assert_eq!(target, NavTarget::Occurrence(next));
        assert_eq!(session.focused(), Some(next));
        let target = session.approve_and_advance(false, Direction::Backward).unwrap();
        assert_eq!(target, NavTarget::Occurrence(occ(text, 0, 0)));
    }

    #[test]
    fn test_note_line_without_notes_is_not_a_stop() {
        let f = fixture("cat. dog");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let lines = LineConfig::new(vec![
            AnalysisLine::new(LineKind::Word, WsSelector::Vernacular),
            AnalysisLine::new(LineKind::Note, WsSelector::Analysis),
        ]);
        let config = SessionConfig::new(vern, en).with_lines(lines);
        let mut session = AnnotationSession::new(f.store, config);
        let segment = occ(text, 0, 0).segment_ref();
        assert_eq!(annotation_stop(session.data(), session.config(), segment), None);

        session.focus(occ(text, 0, 0)).unwrap();
        let target = session.approve_and_advance(false, Direction::Forward).unwrap();
        assert_eq!(target, NavTarget::Occurrence(occ(text, 1, 0)));

        session.setup(|d| d.add_note(segment, MultiString::single(en, "a cat")).unwrap());
        session.focus(occ(text, 0, 0)).unwrap();
        match session.approve_and_advance(false, Direction::Forward).unwrap() {
            NavTarget::Annotation(annotation) => {
                assert_eq!(annotation.segment, segment);
                assert_eq!(annotation.line.kind, LineKind::Note);
            }
            other => panic!("expected the note, got {:?}", other),
        }
    }

    #[test]
    fn test_approve_all_keeps_focus_on_later_word() {
        let mut f = fixture("cat cat dog");
        let (text, en) = (f.text, f.en);
        let cat = f.store.data().occurrence_wordform(occ(text, 0, 0)).unwrap();
        f.store.setup(|d| {
            let analysis = d.create_analysis(cat).unwrap();
            d.approve(analysis, Agent::Human).unwrap();
            d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap();
        });
        let mut session = f.session();
        session.focus(occ(text, 0, 2)).unwrap();

        assert_eq!(session.approve_all(text).unwrap(), 2);
        assert_eq!(session.focused(), Some(occ(text, 0, 2)));
        assert_eq!(session.active().unwrap().occurrence(), occ(text, 0, 2));
    }

    #[test]
    fn test_skip_backward_passes_complete_occurrences() {
        let mut f = fixture("dog cat cat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let cat = f.store.data().occurrence_wordform(occ(text, 0, 1)).unwrap();
        f.store.setup(|d| {
            let analysis = d.create_analysis(cat).unwrap();
            let gloss = d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap();
            for index in [1, 2] {
                d.set_interpretation(occ(text, 0, index), Interpretation::Gloss(gloss))
                    .unwrap();
            }
        });
        let lines = LineConfig::new(vec![
            AnalysisLine::new(LineKind::Word, WsSelector::Vernacular),
            AnalysisLine::new(LineKind::WordGloss, WsSelector::Analysis),
        ]);
        let config = SessionConfig::new(vern, en).with_lines(lines);
        let mut session = AnnotationSession::new(f.store, config);

        session.focus(occ(text, 0, 2)).unwrap();
        let target = session.skip_to_incomplete(Direction::Backward).unwrap();
        assert_eq!(target, NavTarget::Occurrence(occ(text, 0, 0)));
        let target = session.skip_to_incomplete(Direction::Backward).unwrap();
        assert_eq!(target, NavTarget::EndOfText);
    }

    #[test]
    fn test_vanished_word_category_is_reported() {
        let mut f = fixture("cat");
        let (text, en) = (f.text, f.en);
        let noun = f
            .store
            .setup(|d| d.create_pos(MultiString::single(en, "noun"), MultiString::single(en, "n")));
        let mut session = f.session();
        session.focus(occ(text, 0, 0)).unwrap();
        {
            let mut stage = session.stage().unwrap();
            stage.set_word_pos(Some(noun)).unwrap();
            stage.set_word_gloss(en, "feline");
        }

        session.setup(|d| d.delete_pos(noun).unwrap());
        let outcome = session.commit_active(false).unwrap().unwrap();
        assert!(outcome.category_lost);
        let analysis = outcome.analysis(session.data()).unwrap();
        assert_eq!(session.data().analysis(analysis).unwrap().category, None);
    }

    #[test]
    fn test_clean_record_keeps_its_own_gloss() {
        let mut f = fixture("cat");
        let (text, vern, en) = (f.text, f.vern, f.en);
        let at = occ(text, 0, 0);
        let cat = f.store.data().occurrence_wordform(at).unwrap();
        let (wider, own) = f.store.setup(|d| {
            let fr = d.add_writing_system("fr", false, " ");
            let analysis = d.create_analysis(cat).unwrap();
            let mut form = MultiString::single(en, "feline");
            form.set(fr, "félin");
            let wider = d.create_gloss(analysis, form).unwrap();
            let own = d.create_gloss(analysis, MultiString::single(en, "feline")).unwrap();
            d.set_interpretation(at, Interpretation::Gloss(own)).unwrap();
            (wider, own)
        });

        let config = SessionConfig::new(vern, en);
        let mut guesses = GuessService::new();
        let record = load(f.store.data(), &mut guesses, &config, at, true, true).unwrap();
        let outcome = f
            .store
            .unit("commit", |tx| commit(tx, &config, &record))
            .unwrap();
        assert_eq!(outcome.interpretation, Interpretation::Gloss(own));
        assert!(f.store.data().gloss(wider).is_some());
        assert!(!outcome.created);
    }

    proptest! {
        #[test]
        fn prop_advancing_reaches_end_of_text(
            tokens in prop::collection::vec("[a-c]{1,3}|[.,]", 1..16)
        ) {
            let f = fixture(&tokens.join(" "));
            let text = f.text;
            let mut session = f.session();
            let found = session.data().text(text).unwrap();
            let stops = found.occurrence_count() + found.segment_refs().len();

            let first = match first_occurrence(session.data(), session.config(), text) {
                Some(at) => at,
                None => return Ok(()),
            };
            session.focus(first).unwrap();
            let mut steps = 0;
            while session.approve_and_advance(false, Direction::Forward).unwrap()
                != NavTarget::EndOfText
            {
                steps += 1;
                prop_assert!(steps <= stops);
            }
        }

        #[test]
        fn prop_join_then_break_is_identity(
            words in prop::collection::vec("[a-d]{1,4}", 2..6)
        ) {
            let f = fixture(&words.join(" "));
            let text = f.text;
            let mut session = f.session();
            let segment = occ(text, 0, 0).segment_ref();
            let original = session.data().segment(segment).unwrap().occurrences.clone();

            session.focus(occ(text, 0, 0)).unwrap();
            session.join_with_next().unwrap();
            session.break_phrase().unwrap();
            prop_assert_eq!(&session.data().segment(segment).unwrap().occurrences, &original);
        }
    }
}
