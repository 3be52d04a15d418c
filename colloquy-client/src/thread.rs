use anyhow::Context;

use crate::{
    api::{CommentId, EditComment, Fetcher, NewComment, Page, PostId, UserId},
    project, Comment, DisplayRecord, Expansion, Forest, Form, ViewState,
};

#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
    #[error("must be logged in to comment")]
    NotLoggedIn,

    #[error("only the author of comment {0:?} can modify it")]
    NotAuthor(CommentId),
}

/// The comment thread of one post, kept in sync with the server
///
/// Server acknowledgments are applied to the forest in the order they are
/// received, one at a time.
pub struct Thread<F> {
    post: PostId,
    viewer: Option<UserId>,
    fetcher: F,
    forest: Forest,
    view: ViewState,
    next_page: Page,
}

impl<F: Fetcher + Send> Thread<F> {
    pub fn new(fetcher: F, post: PostId, viewer: Option<UserId>, page_size: usize) -> Thread<F> {
        Thread {
            post,
            viewer,
            fetcher,
            forest: Forest::new(),
            view: ViewState::new(),
            next_page: Page::first(page_size),
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn view_state_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn view(&self) -> Vec<DisplayRecord<'_>> {
        project(&self.forest, &self.view)
    }

    /// Whether the current viewer wrote comment `id`
    pub fn is_author(&self, id: &CommentId) -> bool {
        match (self.viewer, self.forest.find(id)) {
            (Some(viewer), Some(c)) => c.author.id == viewer,
            _ => false,
        }
    }

    /// Fetch the first page of root comments, replacing everything loaded so far
    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        let page = Page::first(self.next_page.size);
        let roots = self
            .fetcher
            .fetch_root_comments(self.post, page)
            .await
            .with_context(|| format!("fetching root comments of post {:?}", self.post))?;
        tracing::info!(post = ?self.post, num_roots = roots.len(), "loaded comments");
        self.forest = Forest::from_api(roots).context("loading root comments")?;
        self.view.retain_loaded(&self.forest);
        self.next_page = page.next();
        Ok(())
    }

    /// Fetch the next page of root comments
    ///
    /// Returns the number of root comments that were not already loaded.
    pub async fn load_more_roots(&mut self) -> anyhow::Result<usize> {
        let page = self.next_page;
        let roots = self
            .fetcher
            .fetch_root_comments(self.post, page)
            .await
            .with_context(|| format!("fetching page {} of root comments", page.number))?;
        let before = self.forest.roots().len();
        self.forest = self
            .forest
            .append_roots(roots.into_iter().map(Comment::from).collect())
            .context("appending root comments")?;
        self.next_page = page.next();
        Ok(self.forest.roots().len() - before)
    }

    pub async fn post_comment(&mut self, body: String) -> anyhow::Result<CommentId> {
        self.viewer.ok_or(ThreadError::NotLoggedIn)?;
        let c = self
            .fetcher
            .create_comment(NewComment {
                post_id: self.post,
                parent_id: None,
                body,
            })
            .await
            .context("submitting comment")?;
        let id = c.id;
        self.forest = self.forest.create_root(Comment::from(c))?;
        if self.view.form() == Some(Form::NewRoot) {
            self.view.close_form();
        }
        Ok(id)
    }

    pub async fn reply(&mut self, parent: CommentId, body: String) -> anyhow::Result<CommentId> {
        self.viewer.ok_or(ThreadError::NotLoggedIn)?;
        let c = self
            .fetcher
            .create_comment(NewComment {
                post_id: self.post,
                parent_id: Some(parent),
                body,
            })
            .await
            .with_context(|| format!("submitting reply to {parent:?}"))?;
        let id = c.id;
        self.forest = self
            .forest
            .create_reply(&parent, Comment::from(c))
            .with_context(|| format!("adding reply to {parent:?}"))?;
        if self.view.form() == Some(Form::Reply(parent)) {
            self.view.close_form();
        }
        self.view.show_replies(parent);
        Ok(id)
    }

    fn check_author(&self, id: &CommentId) -> anyhow::Result<()> {
        self.viewer.ok_or(ThreadError::NotLoggedIn)?;
        if !self.forest.contains(id) {
            return Err(crate::Error::NotFound(*id).into());
        }
        match self.is_author(id) {
            true => Ok(()),
            false => Err(ThreadError::NotAuthor(*id).into()),
        }
    }

    pub async fn edit(&mut self, id: CommentId, body: String) -> anyhow::Result<()> {
        self.check_author(&id)?;
        let c = self
            .fetcher
            .edit_comment(id, EditComment { body })
            .await
            .with_context(|| format!("submitting edit of {id:?}"))?;
        let edited_at = c.edited_at.unwrap_or(c.created_at);
        self.forest = self.forest.edit_content(&id, c.body, edited_at)?;
        if self.view.form() == Some(Form::Edit(id)) {
            self.view.close_form();
        }
        Ok(())
    }

    pub async fn delete(&mut self, id: CommentId) -> anyhow::Result<()> {
        self.check_author(&id)?;
        self.fetcher
            .delete_comment(id)
            .await
            .with_context(|| format!("submitting deletion of {id:?}"))?;
        self.forest = self.forest.soft_delete(&id)?;
        if self.view.has_form_open(&id) {
            self.view.close_form();
        }
        Ok(())
    }

    pub async fn load_replies(&mut self, id: CommentId) -> anyhow::Result<()> {
        let replies = self
            .fetcher
            .fetch_replies(id)
            .await
            .with_context(|| format!("fetching replies to {id:?}"))?;
        self.forest = self
            .forest
            .materialize_replies(&id, replies.into_iter().map(Comment::from).collect())?;
        Ok(())
    }

    /// Show or hide the replies of `id`, fetching them when shown
    ///
    /// Returns whether the replies are now visible.
    pub async fn toggle_replies(&mut self, id: CommentId) -> anyhow::Result<bool> {
        let reply_count = self
            .forest
            .find(&id)
            .map(|c| c.reply_count)
            .ok_or(crate::Error::NotFound(id))?;
        let will_show = !self.view.replies_visible(&id);
        if will_show && reply_count > 0 {
            self.load_replies(id).await?;
        }
        Ok(self.view.toggle_replies(id))
    }
}

#[cfg(test)]
mod tests {
    use colloquy_mock_server::MockServer;

    use super::*;
    use crate::api::{CommentState, Uuid};

    fn run<T>(f: impl std::future::Future<Output = T>) -> T {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed initializing tokio runtime")
            .block_on(f)
    }

    struct Setup {
        post: PostId,
        alice: UserId,
        bob: UserId,
        server: MockServer,
    }

    fn setup() -> Setup {
        let mut server = MockServer::new();
        let alice = server.create_user("alice");
        let bob = server.create_user("bob");
        Setup {
            post: PostId(Uuid::new_v4()),
            alice,
            bob,
            server,
        }
    }

    fn thread_for(s: &Setup, viewer: UserId) -> Thread<MockServer> {
        let mut server = s.server.clone();
        server.login(viewer);
        Thread::new(server, s.post, Some(viewer), Page::DEFAULT_SIZE)
    }

    #[test]
    fn comment_reply_edit_delete() {
        run(async {
            let s = setup();
            let mut t = thread_for(&s, s.alice);
            t.refresh().await.unwrap();
            assert!(t.view().is_empty());

            let root = t.post_comment(String::from("first")).await.unwrap();
            let reply = t.reply(root, String::from("second")).await.unwrap();
            let view = t.view();
            assert_eq!(view.len(), 2);
            assert_eq!(view[1].comment.id, reply);
            assert_eq!(view[1].depth, 1);
            assert_eq!(view[0].comment.reply_count, 1);

            t.edit(reply, String::from("edited")).await.unwrap();
            let c = t.forest().find(&reply).unwrap();
            assert_eq!(c.body, "edited");
            assert!(c.is_edited());

            t.delete(root).await.unwrap();
            let view = t.view();
            assert_eq!(view[0].comment.state, CommentState::Deleted);
            assert_eq!(view[1].comment.id, reply);

            // A fresh load agrees with the local state
            let local = t.forest().clone();
            t.refresh().await.unwrap();
            t.load_replies(root).await.unwrap();
            assert_eq!(t.forest(), &local);
        })
    }

    #[test]
    fn only_authors_modify() {
        run(async {
            let s = setup();
            let mut alice = thread_for(&s, s.alice);
            let root = alice.post_comment(String::from("mine")).await.unwrap();

            let mut bob = thread_for(&s, s.bob);
            *bob.fetcher_mut() = alice.fetcher().clone();
            bob.fetcher_mut().login(s.bob);
            bob.refresh().await.unwrap();
            assert!(!bob.is_author(&root));
            let err = bob.edit(root, String::from("theirs")).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ThreadError>(),
                Some(ThreadError::NotAuthor(_))
            ));
            assert!(bob.delete(root).await.is_err());
            assert_eq!(bob.forest().find(&root).unwrap().body, "mine");

            let mut anon = Thread::new(alice.fetcher().clone(), s.post, None, 20);
            anon.refresh().await.unwrap();
            let err = anon.post_comment(String::from("hi")).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ThreadError>(),
                Some(ThreadError::NotLoggedIn)
            ));
        })
    }

    #[test]
    fn toggling_loads_replies() {
        run(async {
            let s = setup();
            let mut writer = thread_for(&s, s.alice);
            let root = writer.post_comment(String::from("root")).await.unwrap();
            writer.reply(root, String::from("a")).await.unwrap();
            writer.reply(root, String::from("b")).await.unwrap();

            let mut reader = Thread::new(writer.fetcher().clone(), s.post, Some(s.bob), 20);
            reader.refresh().await.unwrap();
            let view = reader.view();
            assert_eq!(view.len(), 1);
            assert!(view[0].can_load_replies());

            assert!(reader.toggle_replies(root).await.unwrap());
            let bodies = reader
                .view()
                .iter()
                .map(|r| r.comment.body.clone())
                .collect::<Vec<_>>();
            assert_eq!(bodies, vec!["root", "a", "b"]);

            assert!(!reader.toggle_replies(root).await.unwrap());
            assert_eq!(reader.view().len(), 1);
        })
    }

    #[test]
    fn submitting_closes_the_matching_form() {
        run(async {
            let s = setup();
            let mut t = thread_for(&s, s.alice);
            t.view_state_mut().open_form(Form::NewRoot);
            let root = t.post_comment(String::from("root")).await.unwrap();
            assert_eq!(t.view_state().form(), None);

            t.view_state_mut().open_form(Form::Reply(root));
            let reply = t.reply(root, String::from("reply")).await.unwrap();
            assert_eq!(t.view_state().form(), None);
            assert!(t.view_state().replies_visible(&root));

            // Editing another comment leaves the open form alone
            t.view_state_mut().open_form(Form::Edit(root));
            t.edit(reply, String::from("edited")).await.unwrap();
            assert_eq!(t.view_state().form(), Some(Form::Edit(root)));
            t.delete(root).await.unwrap();
            assert_eq!(t.view_state().form(), None);
        })
    }

    #[test]
    fn stale_parent_is_rejected() {
        run(async {
            let s = setup();
            let mut t = thread_for(&s, s.alice);
            let missing = CommentId(Uuid::new_v4());
            assert!(t.reply(missing, String::from("orphan")).await.is_err());
            assert!(t.forest().is_empty());
            assert!(t.toggle_replies(missing).await.is_err());
        })
    }

    #[test]
    fn paging_roots() {
        run(async {
            let s = setup();
            let mut writer = thread_for(&s, s.alice);
            for i in 0..5 {
                writer.post_comment(format!("comment {i}")).await.unwrap();
            }

            let mut server = writer.fetcher().clone();
            server.login(s.alice);
            let mut t = Thread::new(server, s.post, Some(s.alice), 2);
            t.refresh().await.unwrap();
            assert_eq!(t.forest().roots().len(), 2);
            assert_eq!(t.load_more_roots().await.unwrap(), 2);
            assert_eq!(t.load_more_roots().await.unwrap(), 1);
            assert_eq!(t.load_more_roots().await.unwrap(), 0);
            assert_eq!(t.forest().roots().len(), 5);
        })
    }
}
