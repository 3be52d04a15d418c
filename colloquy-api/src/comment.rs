use uuid::Uuid;

use crate::{Author, Error, PostId, Time, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentState {
    Active,
    Deleted,

    /// Hidden by a moderator
    Blocked,
}

impl CommentState {
    /// Tombstones keep their place in the tree but have no content to show
    pub fn is_tombstone(&self) -> bool {
        match self {
            CommentState::Active => false,
            CommentState::Deleted | CommentState::Blocked => true,
        }
    }
}

/// A comment as persisted by the backend
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    pub author: Author,
    pub body: String,
    pub state: CommentState,
    pub created_at: Time,
    #[serde(default)]
    pub edited_at: Option<Time>,

    /// Number of direct replies, whether they are listed in `replies` or not
    pub reply_count: u32,

    /// None if the replies were not sent along with this comment
    #[serde(default)]
    pub replies: Option<Vec<Comment>>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub body: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_body(&self.body)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub body: String,
}

impl EditComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_body(&self.body)
    }
}

/// Pagination of a post's root comments
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub const DEFAULT_SIZE: usize = 20;

    pub fn first(size: usize) -> Page {
        Page { number: 0, size }
    }

    pub fn next(&self) -> Page {
        Page {
            number: self.number + 1,
            size: self.size,
        }
    }

    /// Range of indices covered by this page, clamped to `len`
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.number.saturating_mul(self.size).min(len);
        let end = start.saturating_add(self.size).min(len);
        start..end
    }
}

impl Default for Page {
    fn default() -> Page {
        Page::first(Page::DEFAULT_SIZE)
    }
}
