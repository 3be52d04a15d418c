use crate::api::{CommentId, CommentState};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Usually means the client state is stale and should be refreshed
    #[error("comment {0:?} is not in the loaded comments")]
    NotFound(CommentId),

    #[error("comment {id:?} cannot be modified while {state:?}")]
    InvalidState { id: CommentId, state: CommentState },

    /// Every comment appears at most once in a forest
    #[error("comment {0:?} is already loaded")]
    DuplicateId(CommentId),

    #[error("comment {id:?} replies to {found:?} but was inserted under {expected:?}")]
    ParentMismatch {
        id: CommentId,
        expected: Option<CommentId>,
        found: Option<CommentId>,
    },
}
