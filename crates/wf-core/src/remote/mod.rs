//! Remote service boundary
//!
//! The engine talks to the blogging server only through [`RemoteClient`].
//! [`WriteFreelyClient`] speaks the WriteFreely JSON API over HTTP and
//! [`MockRemote`] is an in-process server for tests and offline demos.

mod mock;
mod writefreely;

pub use mock::{MockRemote, RemoteCall};
pub use writefreely::WriteFreelyClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AccountSession, Collection, Post, PostContent, PostFont, RemotePost};

/// Errors reported by a remote client
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Wrong password or expired token
    #[error("Unauthorized")]
    Unauthorized,
    /// The server does not know the username
    #[error("User not found")]
    UserNotFound,
    /// The server could not be reached
    #[error("Server unreachable: {0}")]
    Unreachable(String),
    /// The server rejected the request
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with something unexpected
    #[error("Invalid response payload: {0}")]
    Payload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Post fields sent on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    pub content: PostContent,
    pub font: PostFont,
    pub language: Option<String>,
    pub is_rtl: bool,
}

impl PostPayload {
    pub fn from_post(post: &Post) -> Self {
        Self {
            content: post.content.clone(),
            font: post.font,
            language: post.locale.language.clone(),
            is_rtl: post.locale.is_rtl,
        }
    }
}

/// Operations the engine needs from the server
#[allow(async_fn_in_trait)]
pub trait RemoteClient: Send + Sync + 'static {
    /// Exchange a username/password for an access token
    async fn login(&self, server: &str, username: &str, password: &str) -> RemoteResult<String>;

    /// Revoke the session's access token
    async fn logout(&self, session: &AccountSession) -> RemoteResult<()>;

    /// Collections owned by the account
    async fn fetch_collections(&self, session: &AccountSession) -> RemoteResult<Vec<Collection>>;

    /// Posts owned by the account
    async fn fetch_posts(&self, session: &AccountSession) -> RemoteResult<Vec<RemotePost>>;

    /// Create a post, optionally inside a collection
    async fn create_post(
        &self,
        session: &AccountSession,
        collection_alias: Option<&str>,
        payload: &PostPayload,
    ) -> RemoteResult<RemotePost>;

    /// Replace the title and body of an existing post
    async fn update_post(
        &self,
        session: &AccountSession,
        remote_id: &str,
        payload: &PostPayload,
    ) -> RemoteResult<RemotePost>;
}
