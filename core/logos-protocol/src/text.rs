use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::ids::{AnalysisId, GlossId, TextId, WordformId, WsId};
use crate::model::MultiString;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// What a text position currently stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum Interpretation {
    Wordform(WordformId),
    Analysis(AnalysisId),
    Gloss(GlossId),
    Punctuation(String),
}

impl Interpretation {
    pub fn is_punctuation(&self) -> bool {
        matches!(self, Interpretation::Punctuation(_))
    }

    pub fn as_wordform(&self) -> Option<WordformId> {
        match self {
            Interpretation::Wordform(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Occurrence {
    /// Text exactly as written at this position.
    pub baseline: String,
    pub interpretation: Interpretation,
    /// For a joined phrase: the occurrences it replaced, in order.
    pub merged: Vec<Occurrence>,
}

impl Occurrence {
    pub fn new(baseline: impl Into<String>, interpretation: Interpretation) -> Self {
        Self {
            baseline: baseline.into(),
            interpretation,
            merged: Vec::new(),
        }
    }

    pub fn is_punctuation(&self) -> bool {
        self.interpretation.is_punctuation()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Segment {
    pub occurrences: Vec<Occurrence>,
    pub free_translation: MultiString,
    pub literal_translation: MultiString,
    pub notes: Vec<MultiString>,
}

impl Segment {
    /// Index of the first word (non-punctuation) occurrence.
    pub fn first_word_index(&self) -> Option<usize> {
        self.occurrences.iter().position(|o| !o.is_punctuation())
    }

    pub fn is_sentence_initial(&self, index: usize) -> bool {
        self.first_word_index() == Some(index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Paragraph {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Text {
    pub id: TextId,
    pub title: String,
    /// Writing system of the baseline.
    pub vernacular: WsId,
    pub paragraphs: Vec<Paragraph>,
}

impl Text {
    pub fn segment(&self, at: SegmentRef) -> Option<&Segment> {
        self.paragraphs.get(at.paragraph)?.segments.get(at.segment)
    }

    pub fn segment_mut(&mut self, at: SegmentRef) -> Option<&mut Segment> {
        self.paragraphs.get_mut(at.paragraph)?.segments.get_mut(at.segment)
    }

    pub fn occurrence(&self, at: OccurrenceRef) -> Option<&Occurrence> {
        self.segment(at.segment_ref())?.occurrences.get(at.index)
    }

    /// Every segment in reading order.
    pub fn segment_refs(&self) -> Vec<SegmentRef> {
        let mut refs = Vec::new();
        for (p, paragraph) in self.paragraphs.iter().enumerate() {
            for s in 0..paragraph.segments.len() {
                refs.push(SegmentRef {
                    text: self.id,
                    paragraph: p,
                    segment: s,
                });
            }
        }
        refs
    }

    /// Every occurrence slot in reading order, punctuation included.
    pub fn occurrence_refs(&self) -> Vec<OccurrenceRef> {
        let mut refs = Vec::new();
        for seg in self.segment_refs() {
            if let Some(segment) = self.segment(seg) {
                refs.extend((0..segment.occurrences.len()).map(|i| seg.occurrence(i)));
            }
        }
        refs
    }

    pub fn occurrence_count(&self) -> usize {
        self.paragraphs
            .iter()
            .flat_map(|p| p.segments.iter())
            .map(|s| s.occurrences.len())
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct SegmentRef {
    pub text: TextId,
    pub paragraph: usize,
    pub segment: usize,
}

impl SegmentRef {
    pub fn occurrence(self, index: usize) -> OccurrenceRef {
        OccurrenceRef {
            text: self.text,
            paragraph: self.paragraph,
            segment: self.segment,
            index,
        }
    }
}

impl fmt::Display for SegmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.text, self.paragraph, self.segment)
    }
}

/// A text position: paragraph, segment, slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct OccurrenceRef {
    pub text: TextId,
    pub paragraph: usize,
    pub segment: usize,
    pub index: usize,
}

impl OccurrenceRef {
    pub fn segment_ref(&self) -> SegmentRef {
        SegmentRef {
            text: self.text,
            paragraph: self.paragraph,
            segment: self.segment,
        }
    }
}

impl fmt::Display for OccurrenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}.{}", self.text, self.paragraph, self.segment, self.index)
    }
}
