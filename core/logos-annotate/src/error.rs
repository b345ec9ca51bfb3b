use logos_protocol::{EntryId, OccurrenceRef, SenseId};
use logos_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    /// The position vanished or now holds a different wordform.
    #[error("occurrence {0} is no longer valid")]
    StaleOccurrence(OccurrenceRef),

    #[error("occurrence {0} is punctuation")]
    NotAnalyzable(OccurrenceRef),

    #[error("no occurrence is being edited")]
    NoActiveRecord,

    #[error("occurrence {0} has unsaved edits")]
    DirtyRecord(OccurrenceRef),

    #[error("morpheme slot {0} does not exist")]
    NoSuchSlot(usize),

    #[error("{sense} is outside the family of {entry}")]
    SenseOutsideFamily { sense: SenseId, entry: EntryId },

    #[error("cannot join {0} with the following occurrence")]
    IllegalJoin(OccurrenceRef),

    #[error("occurrence {0} is not a joined phrase")]
    IllegalBreak(OccurrenceRef),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AnnotateResult<T> = Result<T, AnnotateError>;
