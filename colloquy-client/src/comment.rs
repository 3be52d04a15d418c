use crate::api::{self, Author, CommentId, CommentState, PostId, Time};

/// Replies of a comment, as far as the client knows them
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Replies {
    /// Not fetched yet: says nothing about whether replies exist
    Unloaded,

    /// Fetched from the server, possibly empty
    Loaded(im::Vector<Comment>),
}

impl Replies {
    pub fn loaded(&self) -> Option<&im::Vector<Comment>> {
        match self {
            Replies::Unloaded => None,
            Replies::Loaded(r) => Some(r),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Replies::Loaded(_))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub author: Author,

    /// Always empty for tombstones
    pub body: String,
    pub state: CommentState,
    pub created_at: Time,
    pub edited_at: Option<Time>,

    /// Number of direct replies known to the server, which may be more than
    /// the currently loaded ones
    pub reply_count: u32,
    pub replies: Replies,
}

impl From<api::Comment> for Comment {
    fn from(c: api::Comment) -> Comment {
        let body = match c.state.is_tombstone() {
            true => String::new(),
            false => c.body,
        };
        Comment {
            id: c.id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            author: c.author,
            body,
            state: c.state,
            created_at: c.created_at,
            edited_at: c.edited_at,
            reply_count: c.reply_count,
            replies: match c.replies {
                None => Replies::Unloaded,
                Some(r) => Replies::Loaded(r.into_iter().map(Comment::from).collect()),
            },
        }
    }
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn is_tombstone(&self) -> bool {
        self.state.is_tombstone()
    }

    pub fn children(&self) -> Option<&im::Vector<Comment>> {
        self.replies.loaded()
    }

    /// True if the UI should offer to load this comment's replies
    pub fn has_unloaded_replies(&self) -> bool {
        self.reply_count > 0 && !self.replies.is_loaded()
    }
}
