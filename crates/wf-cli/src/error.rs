use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] wf_core::Error),
    #[error(transparent)]
    Remote(#[from] wf_core::remote::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No post text provided")]
    EmptyContent,
    #[error("Post ID cannot be empty")]
    EmptyPostId,
    #[error("Post not found for id/prefix: {0}")]
    PostNotFound(String),
    #[error("{0}")]
    AmbiguousPostId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Could not open the local post store: {0}")]
    StoreInit(String),
    #[error("No password provided")]
    EmptyPassword,
    #[error("No server given. Pass --server or run `wf config set-server <url>` first.")]
    NoServer,
}
