//! Services shared by every front end.

mod session;
mod sync_service;

pub use sync_service::{EditOutcome, PublishOutcome, SyncService};
