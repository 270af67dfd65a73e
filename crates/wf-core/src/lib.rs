//! wf-core - Core library for wf
//!
//! This crate contains the post models, the local SQLite store, the post
//! status state machine and the synchronization engine that reconciles
//! local drafts with a remote WriteFreely server.

pub mod credentials;
pub mod db;
pub mod drafts;
pub mod error;
pub mod events;
pub mod models;
pub mod reachability;
pub mod remote;
pub mod services;
pub mod status;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Post, PostId, PostStatus};
