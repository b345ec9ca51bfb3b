use logos_protocol::{ObjectId, OccurrenceRef, SegmentRef, TextId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object {0} does not exist")]
    Missing(ObjectId),

    #[error("text {0} does not exist")]
    MissingText(TextId),

    #[error("segment {0} does not exist")]
    MissingSegment(SegmentRef),

    #[error("occurrence {0} does not exist")]
    MissingOccurrence(OccurrenceRef),

    #[error("{child} is not owned by {owner}")]
    OwnerMismatch { child: ObjectId, owner: ObjectId },

    #[error("{0} is still referenced")]
    StillReferenced(ObjectId),
}

pub type StoreResult<T> = Result<T, StoreError>;
