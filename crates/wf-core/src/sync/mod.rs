//! Reconciliation of server state into the local store
//!
//! [`reconcile::decide`] is the pure merge rule for one fetched post. The
//! service in [`crate::services`] applies the decisions under its lock.

mod reconcile;

pub use reconcile::{decide, MergeDecision, MergeReport};
