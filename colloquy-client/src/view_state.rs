use crate::{api::CommentId, Expansion, Forest};

/// The comment form currently open, if any
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Form {
    NewRoot,
    Reply(CommentId),
    Edit(CommentId),
}

/// Transient per-comment UI state
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ViewState {
    replies_visible: im::HashSet<CommentId>,
    form: Option<Form>,
}

impl Expansion for ViewState {
    fn replies_visible(&self, id: &CommentId) -> bool {
        self.replies_visible.contains(id)
    }
}

impl ViewState {
    pub fn new() -> ViewState {
        ViewState::default()
    }

    pub fn show_replies(&mut self, id: CommentId) {
        self.replies_visible.insert(id);
    }

    pub fn hide_replies(&mut self, id: &CommentId) {
        self.replies_visible.remove(id);
    }

    /// Returns whether the replies are now visible
    pub fn toggle_replies(&mut self, id: CommentId) -> bool {
        match self.replies_visible.remove(&id) {
            Some(_) => false,
            None => {
                self.replies_visible.insert(id);
                true
            }
        }
    }

    pub fn form(&self) -> Option<Form> {
        self.form
    }

    /// Opening a form closes any other one
    pub fn open_form(&mut self, form: Form) {
        self.form = Some(form);
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Whether the reply or edit form of `id` is open
    pub fn has_form_open(&self, id: &CommentId) -> bool {
        match self.form {
            Some(Form::Reply(f)) | Some(Form::Edit(f)) => f == *id,
            Some(Form::NewRoot) | None => false,
        }
    }

    /// Forget the state of comments that are no longer loaded
    pub fn retain_loaded(&mut self, forest: &Forest) {
        self.replies_visible.retain(|id| forest.contains(id));
        if let Some(Form::Reply(id)) | Some(Form::Edit(id)) = self.form {
            if !forest.contains(&id) {
                self.form = None;
            }
        }
    }
}
