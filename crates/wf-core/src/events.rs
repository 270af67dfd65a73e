//! Change notifications emitted by the sync service

use crate::models::{PostId, PostStatus};
use crate::sync::MergeReport;

/// A state change observers may react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostEvent {
    /// A post was added to the store
    Created(PostId),
    /// A post's title or body changed
    ContentChanged(PostId),
    /// A post moved between statuses
    StatusChanged {
        id: PostId,
        from: PostStatus,
        to: PostStatus,
    },
    /// A post was removed from the store
    Removed(PostId),
    /// The server moved forward while local edits were pending
    RemoteConflict(PostId),
    /// A fetch was merged into the store
    Merged(MergeReport),
    /// The cached collections were replaced
    CollectionsChanged,
    /// Login or logout
    SessionChanged { logged_in: bool },
}
