mod comment;
pub use comment::{Comment, Replies};

mod error;
pub use error::Error;

mod forest;
pub use forest::{Forest, Iter};

mod thread;
pub use thread::{Thread, ThreadError};

mod view;
pub use view::{project, DisplayRecord, Expansion, MAX_DISPLAY_DEPTH};

mod view_state;
pub use view_state::{Form, ViewState};

mod fuzz;
#[cfg(test)]
mod testing;

pub mod api {
    pub use colloquy_api::*;
}
