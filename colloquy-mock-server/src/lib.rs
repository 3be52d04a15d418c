use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use colloquy_api::{
    Author, Comment, CommentId, CommentState, EditComment, Error, Fetcher, NewComment, Page,
    PostId, UserId, Uuid,
};

/// Serialized contents of a `MockServer`
///
/// Comments may be listed either flat, with their `parent_id` set, or nested
/// in their parent's `replies`.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DbDump {
    pub users: Vec<Author>,
    pub comments: Vec<Comment>,
}

/// In-memory comment backend
///
/// Requests are made on behalf of the user set with `login`.
#[derive(Clone, Debug, Default)]
pub struct MockServer {
    users: BTreeMap<UserId, Author>,

    // In creation order, with `replies` always None
    comments: Vec<Comment>,
    session: Option<UserId>,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    pub fn from_dump(dump: DbDump) -> Result<MockServer, Error> {
        let mut res = MockServer::new();
        res.users
            .extend(dump.users.into_iter().map(|u| (u.id, u)));
        let mut todo = dump.comments;
        todo.reverse();
        while let Some(mut c) = todo.pop() {
            if let Some(parent) = c.parent_id {
                if !res.comments.iter().any(|p| p.id == parent && p.post_id == c.post_id) {
                    return Err(Error::NotFound(parent.0));
                }
            }
            if res.comments.iter().any(|o| o.id == c.id) {
                tracing::warn!(id = ?c.id, "ignoring duplicate comment in dump");
                continue;
            }
            for mut r in c.replies.take().unwrap_or_default().into_iter().rev() {
                r.parent_id = Some(c.id);
                r.post_id = c.post_id;
                todo.push(r);
            }
            if c.state.is_tombstone() {
                c.body = String::new();
            }
            res.comments.push(c);
        }
        Ok(res)
    }

    pub fn dump(&self) -> DbDump {
        DbDump {
            users: self.users.values().cloned().collect(),
            comments: self.comments.iter().map(|c| self.with_count(c)).collect(),
        }
    }

    pub fn create_user(&mut self, username: &str) -> UserId {
        let id = UserId(Uuid::new_v4());
        self.users.insert(
            id,
            Author {
                id,
                username: String::from(username),
                nickname: None,
                avatar_url: None,
            },
        );
        id
    }

    pub fn user(&self, name: &str) -> Option<&Author> {
        self.users.values().find(|u| u.username == name)
    }

    /// Panics if the user does not exist
    pub fn login(&mut self, user: UserId) {
        assert!(self.users.contains_key(&user), "logging in as unknown user");
        self.session = Some(user);
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    pub fn whoami(&self) -> Result<&Author, Error> {
        self.session
            .and_then(|u| self.users.get(&u))
            .ok_or(Error::PermissionDenied)
    }

    /// Hide a comment as a moderator would
    pub fn block_comment(&mut self, id: CommentId) -> Result<(), Error> {
        let c = self.comment_mut(id)?;
        c.state = CommentState::Blocked;
        c.body = String::new();
        Ok(())
    }

    fn comment_mut(&mut self, id: CommentId) -> Result<&mut Comment, Error> {
        self.comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::NotFound(id.0))
    }

    fn with_count(&self, c: &Comment) -> Comment {
        Comment {
            reply_count: self
                .comments
                .iter()
                .filter(|r| r.parent_id == Some(c.id))
                .count() as u32,
            ..c.clone()
        }
    }

    fn authored_mut(&mut self, id: CommentId) -> Result<&mut Comment, Error> {
        let author = self.whoami()?.id;
        let c = self.comment_mut(id)?;
        if c.author.id != author {
            return Err(Error::PermissionDenied);
        }
        Ok(c)
    }

    pub fn root_comments(&self, post: PostId, page: Page) -> Vec<Comment> {
        let roots = self
            .comments
            .iter()
            .filter(|c| c.post_id == post && c.parent_id.is_none())
            .collect::<Vec<_>>();
        roots[page.range(roots.len())]
            .iter()
            .map(|c| self.with_count(c))
            .collect()
    }

    pub fn replies(&self, parent: CommentId) -> Result<Vec<Comment>, Error> {
        if !self.comments.iter().any(|c| c.id == parent) {
            return Err(Error::NotFound(parent.0));
        }
        Ok(self
            .comments
            .iter()
            .filter(|c| c.parent_id == Some(parent))
            .map(|c| self.with_count(c))
            .collect())
    }

    pub fn create(&mut self, c: NewComment) -> Result<Comment, Error> {
        c.validate()?;
        let author = self.whoami()?.clone();
        if let Some(parent) = c.parent_id {
            if !self
                .comments
                .iter()
                .any(|p| p.id == parent && p.post_id == c.post_id)
            {
                return Err(Error::NotFound(parent.0));
            }
        }
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            post_id: c.post_id,
            parent_id: c.parent_id,
            author,
            body: c.body,
            state: CommentState::Active,
            created_at: Utc::now(),
            edited_at: None,
            reply_count: 0,
            replies: None,
        };
        tracing::debug!(id = ?comment.id, parent = ?comment.parent_id, "created comment");
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub fn edit(&mut self, id: CommentId, e: EditComment) -> Result<Comment, Error> {
        e.validate()?;
        let c = self.authored_mut(id)?;
        if c.state.is_tombstone() {
            return Err(Error::InvalidState(id.0));
        }
        c.body = e.body;
        c.edited_at = Some(Utc::now());
        let c = c.clone();
        Ok(self.with_count(&c))
    }

    pub fn delete(&mut self, id: CommentId) -> Result<(), Error> {
        let c = self.authored_mut(id)?;
        c.state = CommentState::Deleted;
        c.body = String::new();
        Ok(())
    }
}

#[async_trait]
impl Fetcher for MockServer {
    async fn fetch_root_comments(
        &mut self,
        post: PostId,
        page: Page,
    ) -> anyhow::Result<Vec<Comment>> {
        Ok(self.root_comments(post, page))
    }

    async fn fetch_replies(&mut self, parent: CommentId) -> anyhow::Result<Vec<Comment>> {
        Ok(self.replies(parent)?)
    }

    async fn create_comment(&mut self, c: NewComment) -> anyhow::Result<Comment> {
        Ok(self.create(c)?)
    }

    async fn edit_comment(&mut self, id: CommentId, e: EditComment) -> anyhow::Result<Comment> {
        Ok(self.edit(id, e)?)
    }

    async fn delete_comment(&mut self, id: CommentId) -> anyhow::Result<()> {
        Ok(self.delete(id)?)
    }
}
