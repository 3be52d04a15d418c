use async_trait::async_trait;

use crate::{Comment, CommentId, EditComment, NewComment, Page, PostId};

/// Backend operations the comment engine relies on, performed on behalf of
/// the session's current user
#[async_trait]
pub trait Fetcher {
    async fn fetch_root_comments(&mut self, post: PostId, page: Page)
        -> anyhow::Result<Vec<Comment>>;

    /// Direct replies only; the returned comments do not carry their own replies
    async fn fetch_replies(&mut self, parent: CommentId) -> anyhow::Result<Vec<Comment>>;

    async fn create_comment(&mut self, c: NewComment) -> anyhow::Result<Comment>;
    async fn edit_comment(&mut self, id: CommentId, e: EditComment) -> anyhow::Result<Comment>;
    async fn delete_comment(&mut self, id: CommentId) -> anyhow::Result<()>;
}
