use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

macro_rules! define_id {
    ($name:ident, $tag:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
        #[repr(transparent)] // Same layout as u32
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $tag, self.0)
            }
        }
    };
}

define_id!(WsId, "ws", "Unique identifier for a writing system.");
define_id!(WordformId, "wf", "Unique identifier for a Wordform (word type).");
define_id!(AnalysisId, "anal", "Unique identifier for a morphological Analysis of a Wordform.");
define_id!(GlossId, "gloss", "Unique identifier for a word Gloss owned by an Analysis.");
define_id!(BundleId, "mb", "Unique identifier for a MorphBundle (one morpheme slot of an Analysis).");
define_id!(EntryId, "entry", "Unique identifier for a lexical entry.");
define_id!(MorphId, "morph", "Unique identifier for a morph form (allomorph) owned by an entry.");
define_id!(SenseId, "sense", "Unique identifier for a lexical sense.");
define_id!(MsaId, "msa", "Unique identifier for a morphosyntactic analysis (a sense's grammatical info).");
define_id!(PosId, "pos", "Unique identifier for a part-of-speech category.");
define_id!(TextId, "text", "Unique identifier for an interlinear text.");

/// Any persistent object the store can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum ObjectId {
    Wordform(WordformId),
    Analysis(AnalysisId),
    Gloss(GlossId),
    Bundle(BundleId),
    Entry(EntryId),
    Morph(MorphId),
    Sense(SenseId),
    Msa(MsaId),
    Pos(PosId),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Wordform(id) => id.fmt(f),
            ObjectId::Analysis(id) => id.fmt(f),
            ObjectId::Gloss(id) => id.fmt(f),
            ObjectId::Bundle(id) => id.fmt(f),
            ObjectId::Entry(id) => id.fmt(f),
            ObjectId::Morph(id) => id.fmt(f),
            ObjectId::Sense(id) => id.fmt(f),
            ObjectId::Msa(id) => id.fmt(f),
            ObjectId::Pos(id) => id.fmt(f),
        }
    }
}
