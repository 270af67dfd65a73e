pub mod account;
pub mod collections;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod list;
pub mod new;
pub mod publish;
pub mod resume;
pub mod show;
pub mod sync;
