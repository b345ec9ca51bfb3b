use logos_protocol::OccurrenceRef;
use logos_store::{FocusChange, StoreData, UndoOutcome};

/// Where focus goes after an undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    Undo,
    Redo,
}

impl Replay {
    /// The side of the focus change to return to: `before` when undoing,
    /// `after` when redoing.
    pub fn target(self, focus: &FocusChange) -> Option<OccurrenceRef> {
        match self {
            Replay::Undo => focus.before,
            Replay::Redo => focus.after,
        }
    }
}

/// The occurrence to refocus after `outcome`, if it still resolves to a
/// word of the restored data.
pub fn replay_focus(data: &StoreData, outcome: &UndoOutcome, replay: Replay) -> Option<OccurrenceRef> {
    let target = replay.target(outcome.focus.as_ref()?)?;
    data.occurrence(target)
        .filter(|o| !o.is_punctuation())
        .map(|_| target)
}
