mod comment;
pub use comment::{Comment, CommentId, CommentState, EditComment, NewComment, Page};

mod error;
pub use error::Error;

mod fetcher;
pub use fetcher::Fetcher;

mod post;
pub use post::PostId;

mod user;
pub use user::{Author, UserId};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

// Postgres does not support null bytes in strings, and neither does the backend
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

/// Comment bodies must hold something other than whitespace
pub fn validate_body(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    match s.trim().is_empty() {
        true => Err(Error::EmptyBody),
        false => Ok(()),
    }
}
