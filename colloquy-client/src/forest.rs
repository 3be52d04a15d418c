use std::collections::HashSet;

use crate::{
    api::{self, CommentId, CommentState, Time},
    Comment, Error, Replies,
};

/// All the loaded comments of a post
///
/// A `Forest` is never modified in place: every mutation returns a new
/// `Forest`, sharing the untouched subtrees with the previous one. Comparing
/// two snapshots is thus enough to know whether anything changed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Forest {
    roots: im::Vector<Comment>,
}

/// Depth-first pre-order traversal of the loaded comments
pub struct Iter<'a> {
    // Sibling list of each level, along with the index of the next one to visit
    stack: Vec<(&'a im::Vector<Comment>, usize)>,
    depth: usize,
}

impl<'a> Iter<'a> {
    fn new(roots: &'a im::Vector<Comment>) -> Iter<'a> {
        Iter {
            stack: vec![(roots, 0)],
            depth: 0,
        }
    }

    /// Depth of the last returned comment, roots being at depth 0
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Indices leading from the roots to the last returned comment
    fn path(&self) -> Vec<usize> {
        self.stack[..=self.depth]
            .iter()
            .map(|(_, next)| next - 1)
            .collect()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Comment;

    fn next(&mut self) -> Option<&'a Comment> {
        loop {
            let top = self.stack.last_mut()?;
            let siblings: &'a im::Vector<Comment> = top.0;
            match siblings.get(top.1) {
                None => {
                    self.stack.pop();
                }
                Some(c) => {
                    top.1 += 1;
                    self.depth = self.stack.len() - 1;
                    if let Some(children) = c.children() {
                        self.stack.push((children, 0));
                    }
                    return Some(c);
                }
            }
        }
    }
}

impl Forest {
    pub fn new() -> Forest {
        Forest::default()
    }

    pub fn from_comments(roots: Vec<Comment>) -> Forest {
        Forest {
            roots: roots.into_iter().collect(),
        }
    }

    /// Build a forest out of root comments as sent by the server
    pub fn from_api(roots: Vec<api::Comment>) -> Result<Forest, Error> {
        Forest::new().append_roots(roots.into_iter().map(Comment::from).collect())
    }

    pub fn roots(&self) -> &im::Vector<Comment> {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of loaded comments, tombstones included
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.roots)
    }

    pub fn find(&self, id: &CommentId) -> Option<&Comment> {
        self.iter().find(|c| c.id == *id)
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.find(id).is_some()
    }

    /// Nesting level of a comment, roots being at depth 0
    pub fn depth_of(&self, id: &CommentId) -> Option<usize> {
        let mut it = self.iter();
        while let Some(c) = it.next() {
            if c.id == *id {
                return Some(it.depth());
            }
        }
        None
    }

    fn locate(&self, id: &CommentId) -> Option<Vec<usize>> {
        let mut it = self.iter();
        while let Some(c) = it.next() {
            if c.id == *id {
                return Some(it.path());
            }
        }
        None
    }

    /// Replace comment `id` with the result of `f`, rebuilding its ancestors
    ///
    /// Subtrees that have not been loaded are not searched.
    fn update<F>(&self, id: &CommentId, f: F) -> Result<Forest, Error>
    where
        F: FnOnce(&Comment) -> Result<Comment, Error>,
    {
        let path = match self.locate(id) {
            Some(p) => p,
            None => {
                tracing::warn!(?id, "comment not found among loaded comments");
                return Err(Error::NotFound(*id));
            }
        };

        let mut chain = Vec::with_capacity(path.len());
        let mut siblings = Some(&self.roots);
        for &i in &path {
            let c = siblings
                .and_then(|s| s.get(i))
                .ok_or(Error::NotFound(*id))?;
            chain.push(c);
            siblings = c.children();
        }

        let target = chain.pop().ok_or(Error::NotFound(*id))?;
        let mut node = f(target)?;
        let mut depth = path.len() - 1;
        while let Some(parent) = chain.pop() {
            let children = parent
                .children()
                .cloned()
                .unwrap_or_default()
                .update(path[depth], node);
            node = Comment {
                replies: Replies::Loaded(children),
                ..parent.clone()
            };
            depth -= 1;
        }
        Ok(Forest {
            roots: self.roots.update(path[0], node),
        })
    }

    /// Fail if one of `nodes`, or of their loaded replies, is already in the
    /// forest outside of the `replaced` subtrees or appears twice
    fn check_fresh_ids(
        &self,
        nodes: &im::Vector<Comment>,
        replaced: &im::Vector<Comment>,
    ) -> Result<(), Error> {
        let replaced = Iter::new(replaced).map(|c| c.id).collect::<HashSet<_>>();
        let mut seen = self
            .iter()
            .map(|c| c.id)
            .filter(|id| !replaced.contains(id))
            .collect::<HashSet<_>>();
        for c in Iter::new(nodes) {
            if !seen.insert(c.id) {
                tracing::warn!(id = ?c.id, "comment is already loaded");
                return Err(Error::DuplicateId(c.id));
            }
        }
        Ok(())
    }

    pub fn create_root(&self, c: Comment) -> Result<Forest, Error> {
        if let Some(parent) = c.parent_id {
            return Err(Error::ParentMismatch {
                id: c.id,
                expected: None,
                found: Some(parent),
            });
        }
        if self.contains(&c.id) {
            tracing::debug!(id = ?c.id, "comment already present, ignoring");
            return Ok(self.clone());
        }
        self.check_fresh_ids(&im::Vector::unit(c.clone()), &im::Vector::new())?;
        tracing::debug!(id = ?c.id, "adding root comment");
        let mut roots = self.roots.clone();
        roots.push_back(c);
        Ok(Forest { roots })
    }

    /// Append a page of root comments, skipping the ones already known
    pub fn append_roots(&self, roots: Vec<Comment>) -> Result<Forest, Error> {
        roots.into_iter().try_fold(self.clone(), |f, c| f.create_root(c))
    }

    /// Add `c` as the last reply of `parent_id`
    ///
    /// The parent must be loaded: replies cannot be attached inside a subtree
    /// that was not fetched yet.
    pub fn create_reply(&self, parent_id: &CommentId, mut c: Comment) -> Result<Forest, Error> {
        match c.parent_id {
            None => c.parent_id = Some(*parent_id),
            Some(p) if p == *parent_id => (),
            Some(p) => {
                return Err(Error::ParentMismatch {
                    id: c.id,
                    expected: Some(*parent_id),
                    found: Some(p),
                })
            }
        }
        if !self.contains(parent_id) {
            tracing::warn!(parent = ?parent_id, "parent not found among loaded comments");
            return Err(Error::NotFound(*parent_id));
        }
        if self.contains(&c.id) {
            tracing::debug!(id = ?c.id, "comment already present, ignoring");
            return Ok(self.clone());
        }
        self.check_fresh_ids(&im::Vector::unit(c.clone()), &im::Vector::new())?;
        tracing::debug!(id = ?c.id, parent = ?parent_id, "adding reply");
        self.update(parent_id, move |parent| {
            let mut children = parent.children().cloned().unwrap_or_default();
            children.push_back(c);
            Ok(Comment {
                reply_count: parent.reply_count.saturating_add(1),
                replies: Replies::Loaded(children),
                ..parent.clone()
            })
        })
    }

    pub fn edit_content(
        &self,
        id: &CommentId,
        body: String,
        edited_at: Time,
    ) -> Result<Forest, Error> {
        self.update(id, move |c| {
            if c.is_tombstone() {
                tracing::warn!(?id, state = ?c.state, "refusing to edit a tombstone");
                return Err(Error::InvalidState {
                    id: *id,
                    state: c.state,
                });
            }
            tracing::debug!(?id, "editing comment");
            Ok(Comment {
                body,
                edited_at: Some(edited_at),
                ..c.clone()
            })
        })
    }

    /// Turn a comment into a tombstone, keeping its replies
    ///
    /// Deleting an already deleted comment succeeds without changing anything.
    pub fn soft_delete(&self, id: &CommentId) -> Result<Forest, Error> {
        if let Some(c) = self.find(id) {
            if c.state == CommentState::Deleted {
                return Ok(self.clone());
            }
        }
        self.update(id, |c| {
            tracing::debug!(?id, "deleting comment");
            Ok(Comment {
                body: String::new(),
                state: CommentState::Deleted,
                ..c.clone()
            })
        })
    }

    /// Replace the replies of `id` with one freshly fetched level of replies
    ///
    /// Any replies these have are dropped: each level is loaded on its own.
    /// The previously loaded replies of `id` may come back, but no other
    /// loaded comment may.
    pub fn materialize_replies(
        &self,
        id: &CommentId,
        loaded: Vec<Comment>,
    ) -> Result<Forest, Error> {
        let replaced = match self.find(id) {
            Some(c) => c.children().cloned().unwrap_or_default(),
            None => {
                tracing::warn!(?id, "comment not found among loaded comments");
                return Err(Error::NotFound(*id));
            }
        };
        let mut children = im::Vector::new();
        for mut c in loaded {
            match c.parent_id {
                None => c.parent_id = Some(*id),
                Some(p) if p == *id => (),
                Some(p) => {
                    return Err(Error::ParentMismatch {
                        id: c.id,
                        expected: Some(*id),
                        found: Some(p),
                    })
                }
            }
            c.replies = Replies::Unloaded;
            children.push_back(c);
        }
        self.check_fresh_ids(&children, &replaced)?;
        self.update(id, move |parent| {
            tracing::debug!(?id, num_replies = children.len(), "loaded replies");
            Ok(Comment {
                reply_count: parent.reply_count.max(children.len() as u32),
                replies: Replies::Loaded(children),
                ..parent.clone()
            })
        })
    }
}
