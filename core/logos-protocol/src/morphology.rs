#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use alloc::string::String;

/// Morph type of a morph form. Drives the prefix/postfix markers shown on
/// the morphemes line ("-s", "un-", "=ka").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum MorphType {
    Stem = 0,
    Root = 1,
    BoundStem = 2,
    BoundRoot = 3,
    Prefix = 4,
    Suffix = 5,
    Infix = 6,
    Proclitic = 7,
    Enclitic = 8,
    Clitic = 9,
    Particle = 10,
    Phrase = 11,
}

impl MorphType {
    /// Marker written before the form ("-s" for a suffix).
    pub fn prefix_marker(self) -> &'static str {
        match self {
            MorphType::Suffix | MorphType::Infix => "-",
            MorphType::Enclitic => "=",
            MorphType::BoundStem | MorphType::BoundRoot => "*",
            _ => "",
        }
    }

    /// Marker written after the form ("un-" for a prefix).
    pub fn postfix_marker(self) -> &'static str {
        match self {
            MorphType::Prefix | MorphType::Infix => "-",
            MorphType::Proclitic => "=",
            _ => "",
        }
    }

    pub fn is_affix(self) -> bool {
        matches!(
            self,
            MorphType::Prefix | MorphType::Suffix | MorphType::Infix
        )
    }

    /// Types that can stand alone as a whole word.
    pub fn is_free(self) -> bool {
        matches!(
            self,
            MorphType::Stem
                | MorphType::Root
                | MorphType::Clitic
                | MorphType::Particle
                | MorphType::Phrase
        )
    }

    /// Whether a morph form of type `self` may fill a slot typed `wanted`.
    ///
    /// Marker-less text only says "some stem", so any unmarked free type
    /// satisfies it; a monomorphemic word also accepts the clitic types.
    pub fn satisfies(self, wanted: MorphType, monomorphemic: bool) -> bool {
        if self == wanted {
            return true;
        }
        match wanted {
            MorphType::Stem => {
                self.is_free()
                    || (monomorphemic
                        && matches!(self, MorphType::Proclitic | MorphType::Enclitic))
            }
            MorphType::BoundStem => self == MorphType::BoundRoot,
            _ => false,
        }
    }

    /// Splits marker punctuation off typed morpheme text.
    ///
    /// `"-s"` is a suffix, `"un-"` a prefix, `"-in-"` an infix, `"=ka"` an
    /// enclitic, `"ka="` a proclitic, `"*kat"` a bound stem; anything else is a stem.
    pub fn parse_marked(text: &str) -> (MorphType, &str) {
        let text = text.trim();
        if text.len() > 2 && text.starts_with('-') && text.ends_with('-') {
            return (MorphType::Infix, &text[1..text.len() - 1]);
        }
        if let Some(rest) = text.strip_prefix('-') {
            return (MorphType::Suffix, rest);
        }
        if let Some(rest) = text.strip_suffix('-') {
            return (MorphType::Prefix, rest);
        }
        if let Some(rest) = text.strip_prefix('=') {
            return (MorphType::Enclitic, rest);
        }
        if let Some(rest) = text.strip_suffix('=') {
            return (MorphType::Proclitic, rest);
        }
        if let Some(rest) = text.strip_prefix('*') {
            return (MorphType::BoundStem, rest);
        }
        (MorphType::Stem, text)
    }
}

impl Default for MorphType {
    fn default() -> Self {
        MorphType::Stem
    }
}

/// Capitalization class of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseClass {
    Lower,
    /// First letter upper, the rest lower ("Run").
    Title,
    Upper,
    Mixed,
    /// No cased letters at all.
    Uncased,
}

impl CaseClass {
    pub fn of(text: &str) -> CaseClass {
        let mut cased = text.chars().filter(|c| c.is_lowercase() || c.is_uppercase());
        let first = match cased.next() {
            Some(c) => c,
            None => return CaseClass::Uncased,
        };
        let rest_upper = cased.clone().filter(|c| c.is_uppercase()).count();
        let rest_total = cased.count();

        match (first.is_uppercase(), rest_upper) {
            (false, 0) => CaseClass::Lower,
            (true, 0) if rest_total > 0 => CaseClass::Title,
            (true, n) if n == rest_total => CaseClass::Upper,
            _ => CaseClass::Mixed,
        }
    }

    pub fn fold(text: &str) -> String {
        text.to_lowercase()
    }
}

/// Who holds an opinion about an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Agent {
    Human,
    /// Automatic parser or lexicon defaults.
    Parser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum Opinion {
    Approves,
    Disapproves,
}

/// One agent's opinion, stamped with the store clock at the time it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Evaluation {
    pub opinion: Opinion,
    pub stamp: u64,
}

impl Evaluation {
    pub fn approves(stamp: u64) -> Self {
        Self { opinion: Opinion::Approves, stamp }
    }

    pub fn disapproves(stamp: u64) -> Self {
        Self { opinion: Opinion::Disapproves, stamp }
    }

    pub fn is_approval(&self) -> bool {
        self.opinion == Opinion::Approves
    }
}

/// How a suggested interpretation is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum HighlightClass {
    Approved,
    MultipleCandidates,
    MachineOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VariantType {
    Spelling,
    Dialectal,
    FreeVariant,
    Inflectional,
}
