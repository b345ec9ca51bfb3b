//! Where focus goes next.
//!
//! A text is a flat list of stops: each segment contributes its occurrence
//! slots followed by at most one annotation stop. Moving walks that list
//! in a plain loop, so every search ends within the number of stops.

use logos_protocol::{AnalysisLine, LineKind, OccurrenceRef, SegmentRef, TextId};
use logos_store::StoreData;
use serde::{Deserialize, Serialize};

use crate::completeness::is_fully_analyzed;
use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// A segment-level line to focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationTarget {
    pub segment: SegmentRef,
    pub line: AnalysisLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavTarget {
    Occurrence(OccurrenceRef),
    Annotation(AnnotationTarget),
    EndOfText,
}

impl NavTarget {
    pub fn occurrence(&self) -> Option<OccurrenceRef> {
        match self {
            NavTarget::Occurrence(at) => Some(*at),
            _ => None,
        }
    }
}

/// The stop a search starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavPosition {
    Occurrence(OccurrenceRef),
    Annotation(SegmentRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavFilter {
    /// Word occurrences and annotation stops.
    Analyzable,
    /// Word occurrences still missing a configured line.
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Occurrence(OccurrenceRef),
    Annotation(AnnotationTarget),
}

impl Stop {
    fn is_at(&self, position: NavPosition) -> bool {
        match (self, position) {
            (Stop::Occurrence(a), NavPosition::Occurrence(b)) => *a == b,
            (Stop::Annotation(a), NavPosition::Annotation(b)) => a.segment == b,
            _ => false,
        }
    }
}

/// The first configured translation or note line of `segment` with text.
///
/// A note line counts only when the segment has a note with text in the
/// line's writing system.
pub fn annotation_stop(
    data: &StoreData,
    config: &SessionConfig,
    segment: SegmentRef,
) -> Option<AnnotationTarget> {
    let found = data.segment(segment)?;
    config
        .lines
        .annotation_lines()
        .find(|line| {
            let ws = config.ws_of(line);
            match line.kind {
                LineKind::FreeTranslation => found.free_translation.has_text(ws),
                LineKind::LiteralTranslation => found.literal_translation.has_text(ws),
                LineKind::Note => found.notes.iter().any(|n| n.has_text(ws)),
                _ => false,
            }
        })
        .map(|line| AnnotationTarget {
            segment,
            line: *line,
        })
}

fn stops(data: &StoreData, config: &SessionConfig, text: TextId) -> Vec<Stop> {
    let mut stops = Vec::new();
    let found = match data.text(text) {
        Some(t) => t,
        None => return stops,
    };
    for segment in found.segment_refs() {
        if let Some(s) = found.segment(segment) {
            stops.extend((0..s.occurrences.len()).map(|i| Stop::Occurrence(segment.occurrence(i))));
        }
        if let Some(target) = annotation_stop(data, config, segment) {
            stops.push(Stop::Annotation(target));
        }
    }
    stops
}

fn eligible(data: &StoreData, config: &SessionConfig, stop: &Stop, filter: NavFilter) -> bool {
    match stop {
        Stop::Occurrence(at) => {
            let is_word = data.occurrence(*at).map_or(false, |o| !o.is_punctuation());
            match filter {
                NavFilter::Analyzable => is_word,
                NavFilter::Incomplete => is_word && !is_fully_analyzed(data, config, *at),
            }
        }
        Stop::Annotation(_) => filter == NavFilter::Analyzable,
    }
}

fn to_target(stop: Stop) -> NavTarget {
    match stop {
        Stop::Occurrence(at) => NavTarget::Occurrence(at),
        Stop::Annotation(target) => NavTarget::Annotation(target),
    }
}

/// The next eligible stop after `from` in `direction`.
///
/// A position that is no longer a stop of its text (an occurrence removed
/// by a join, say) yields `EndOfText`.
pub fn next_target(
    data: &StoreData,
    config: &SessionConfig,
    text: TextId,
    from: NavPosition,
    direction: Direction,
    filter: NavFilter,
) -> NavTarget {
    let stops = stops(data, config, text);
    let current = match stops.iter().position(|s| s.is_at(from)) {
        Some(i) => i,
        None => return NavTarget::EndOfText,
    };

    let mut index = current;
    loop {
        index = match direction {
            Direction::Forward if index + 1 < stops.len() => index + 1,
            Direction::Backward if index > 0 => index - 1,
            _ => return NavTarget::EndOfText,
        };
        let stop = stops[index];
        if eligible(data, config, &stop, filter) {
            return to_target(stop);
        }
    }
}

/// The first eligible stop of `text` in reading order.
pub fn first_target(
    data: &StoreData,
    config: &SessionConfig,
    text: TextId,
    filter: NavFilter,
) -> NavTarget {
    stops(data, config, text)
        .into_iter()
        .find(|s| matches!(s, Stop::Occurrence(_)) && eligible(data, config, s, filter))
        .map_or(NavTarget::EndOfText, to_target)
}

/// The first word occurrence of `text`.
pub fn first_occurrence(data: &StoreData, config: &SessionConfig, text: TextId) -> Option<OccurrenceRef> {
    match first_target(data, config, text, NavFilter::Analyzable) {
        NavTarget::Occurrence(at) => Some(at),
        _ => None,
    }
}
