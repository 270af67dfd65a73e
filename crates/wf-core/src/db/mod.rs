//! Database layer for wf

mod collection_repository;
mod connection;
mod migrations;
mod repository;
mod state_repository;

pub use collection_repository::{CollectionRepository, SqliteCollectionRepository};
pub use connection::Database;
pub use repository::{PostQuery, PostRepository, SqlitePostRepository};
pub use state_repository::{SqliteStateRepository, StateRepository};
