#![no_std] // Shared by the store, the engine and tools alike

extern crate alloc;

// Enable std if the feature is active (for tests/tools)
#[cfg(feature = "std")]
extern crate std;

pub mod ids;
pub mod lines;
pub mod model;
pub mod morphology;
pub mod text;

// Re-export core types for convenience
pub use ids::*;
pub use lines::*;
pub use model::*;
pub use morphology::*;
pub use text::*;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_id_layout() {
        // Newtype ids stay exactly 4 bytes
        assert_eq!(core::mem::size_of::<WordformId>(), 4);
        assert_eq!(core::mem::size_of::<Option<AnalysisId>>(), 8);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(WordformId::new(7).to_string(), "wf#7");
        assert_eq!(ObjectId::Sense(SenseId(3)).to_string(), "sense#3");
    }

    #[test]
    fn test_marker_parsing() {
        assert_eq!(MorphType::parse_marked("-s"), (MorphType::Suffix, "s"));
        assert_eq!(MorphType::parse_marked("un-"), (MorphType::Prefix, "un"));
        assert_eq!(MorphType::parse_marked("-in-"), (MorphType::Infix, "in"));
        assert_eq!(MorphType::parse_marked("=ka"), (MorphType::Enclitic, "ka"));
        assert_eq!(MorphType::parse_marked("ka="), (MorphType::Proclitic, "ka"));
        assert_eq!(MorphType::parse_marked(" cat "), (MorphType::Stem, "cat"));

        assert_eq!(MorphType::Suffix.prefix_marker(), "-");
        assert_eq!(MorphType::Prefix.postfix_marker(), "-");
        assert_eq!(MorphType::Stem.prefix_marker(), "");
    }

    #[test]
    fn test_morph_type_compatibility() {
        assert!(MorphType::Root.satisfies(MorphType::Stem, false));
        assert!(!MorphType::Suffix.satisfies(MorphType::Stem, false));
        assert!(!MorphType::Enclitic.satisfies(MorphType::Stem, false));
        assert!(MorphType::Enclitic.satisfies(MorphType::Stem, true));
        assert!(MorphType::Suffix.satisfies(MorphType::Suffix, false));
    }

    #[test]
    fn test_case_class() {
        assert_eq!(CaseClass::of("run"), CaseClass::Lower);
        assert_eq!(CaseClass::of("Run"), CaseClass::Title);
        assert_eq!(CaseClass::of("RUN"), CaseClass::Upper);
        assert_eq!(CaseClass::of("rUn"), CaseClass::Mixed);
        assert_eq!(CaseClass::of("42"), CaseClass::Uncased);
    }

    #[test]
    fn test_multistring_set_and_cover() {
        let en = WsId(1);
        let fr = WsId(2);
        let mut ms = MultiString::single(en, "cat");
        ms.set(fr, "chat");
        assert!(ms.covers(&MultiString::single(en, "cat")));
        assert!(!ms.covers(&MultiString::single(en, "dog")));

        ms.set(fr, "");
        assert_eq!(ms.get(fr), None);
        assert!(MultiString::single(en, "  ").is_empty());
    }

    #[test]
    fn test_line_kinds() {
        let config = LineConfig::standard();
        assert!(config.kinds().contains(LineKinds::WORD | LineKinds::WORD_GLOSS));
        assert!(!config.contains(LineKind::Note));
        assert!(LineKinds::ANNOTATIONS.contains(LineKind::Note.flag()));
        assert_eq!(config.annotation_lines().count(), 1);
    }
}
