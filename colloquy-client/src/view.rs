use std::collections::HashSet;

use crate::{api::CommentId, Comment, Forest};

/// Nesting level past which replies are no longer indented further
pub const MAX_DISPLAY_DEPTH: usize = 5;

/// Which comments currently have their replies shown
///
/// This is transient UI state, kept outside of the `Forest`.
pub trait Expansion {
    fn replies_visible(&self, id: &CommentId) -> bool;
}

impl Expansion for HashSet<CommentId> {
    fn replies_visible(&self, id: &CommentId) -> bool {
        self.contains(id)
    }
}

impl Expansion for im::HashSet<CommentId> {
    fn replies_visible(&self, id: &CommentId) -> bool {
        self.contains(id)
    }
}

/// Everything is collapsed
impl Expansion for () {
    fn replies_visible(&self, _: &CommentId) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisplayRecord<'a> {
    pub comment: &'a Comment,

    /// Indentation level, capped at MAX_DISPLAY_DEPTH
    pub depth: usize,
    pub true_depth: usize,

    /// True for replies nested deeper than they are displayed
    pub deeper_than_displayed: bool,
    pub replies_visible: bool,
}

impl<'a> DisplayRecord<'a> {
    pub fn is_reply(&self) -> bool {
        self.true_depth > 0
    }

    /// True if showing the replies requires fetching them first
    pub fn can_load_replies(&self) -> bool {
        self.comment.has_unloaded_replies()
    }

    /// Whether to offer a toggle for this comment's replies
    pub fn has_replies_toggle(&self) -> bool {
        self.comment.reply_count > 0
    }
}

/// Flatten the visible part of `forest` in display order
///
/// Replies are listed right after their parent, in the order the server
/// sent them, and only if the parent's replies are both loaded and visible.
/// Tombstones still show their replies.
pub fn project<'a, E>(forest: &'a Forest, expansion: &E) -> Vec<DisplayRecord<'a>>
where
    E: Expansion + ?Sized,
{
    let mut res = Vec::new();
    let mut stack: Vec<(&'a Comment, usize)> =
        forest.roots().iter().rev().map(|c| (c, 0)).collect();
    while let Some((comment, true_depth)) = stack.pop() {
        let replies_visible = expansion.replies_visible(&comment.id);
        res.push(DisplayRecord {
            comment,
            depth: true_depth.min(MAX_DISPLAY_DEPTH),
            true_depth,
            deeper_than_displayed: true_depth > MAX_DISPLAY_DEPTH,
            replies_visible,
        });
        if let (true, Some(children)) = (replies_visible, comment.children()) {
            stack.extend(children.iter().rev().map(|c| (c, true_depth + 1)));
        }
    }
    res
}
