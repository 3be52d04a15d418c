use uuid::Uuid;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found {0}")]
    NotFound(Uuid),

    #[error("Operation not permitted in the current state of {0}")]
    InvalidState(Uuid),

    #[error("Comment body is empty")]
    EmptyBody,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}
