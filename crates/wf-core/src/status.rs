//! Post status state machine
//!
//! `local` is only entered at creation. Once a post has been synced it moves
//! between `published` and `edited` and never returns to `local`.
//!
//! Content written by an incoming server update must not count as a user
//! edit. [`ServerUpdateGuards`] tracks the posts currently being overwritten
//! from server data; user edits that arrive for such a post are held back and
//! replayed as user edits once the overwrite finishes.

use std::collections::HashMap;

use crate::models::{PostEdit, PostId, PostStatus};

/// Something observed about a post that may move its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The user changed the title or body
    LocalEdit,
    /// A fetch reported no newer remote copy than the last synced content
    RemoteUnchanged,
    /// A create/update round-trip succeeded
    PublishSucceeded,
    /// A create/update round-trip failed
    PublishFailed,
}

/// Where a content change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// Typed by the local user
    User,
    /// Written from fetched server data
    Server,
}

impl PostStatus {
    /// Next status after `event`.
    pub const fn apply(self, event: StatusEvent) -> Self {
        match (self, event) {
            (Self::Published | Self::Edited, StatusEvent::LocalEdit) => Self::Edited,
            (Self::Edited, StatusEvent::RemoteUnchanged) | (_, StatusEvent::PublishSucceeded) => {
                Self::Published
            }
            (status, _) => status,
        }
    }

    /// Status after a content change of the given origin.
    pub const fn after_edit(self, origin: EditOrigin) -> Self {
        match origin {
            EditOrigin::User => self.apply(StatusEvent::LocalEdit),
            EditOrigin::Server => self,
        }
    }
}

/// Server overwrites in progress, keyed by post
#[derive(Debug, Default)]
pub struct ServerUpdateGuards {
    active: HashMap<PostId, Vec<PostEdit>>,
}

impl ServerUpdateGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as being overwritten from the server.
    ///
    /// Returns false if an overwrite was already in progress.
    pub fn begin(&mut self, id: PostId) -> bool {
        if self.active.contains_key(&id) {
            return false;
        }
        self.active.insert(id, Vec::new());
        true
    }

    pub fn is_active(&self, id: &PostId) -> bool {
        self.active.contains_key(id)
    }

    /// Hold a user edit back while an overwrite is in progress.
    ///
    /// Hands the edit back when no overwrite is active so the caller can
    /// apply it directly.
    pub fn defer(&mut self, id: &PostId, edit: PostEdit) -> Option<PostEdit> {
        match self.active.get_mut(id) {
            Some(pending) => {
                pending.push(edit);
                None
            }
            None => Some(edit),
        }
    }

    /// Clear the guard, returning user edits to replay in arrival order.
    pub fn finish(&mut self, id: &PostId) -> Vec<PostEdit> {
        self.active.remove(id).unwrap_or_default()
    }
}
