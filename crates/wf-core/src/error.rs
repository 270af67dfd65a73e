//! Error types for wf-core

use thiserror::Error;

/// Result type alias using wf-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wf-core operations
///
/// Display strings are written for end users; callers can show them as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Post not found
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No account is logged in
    #[error("You are not logged in. Log in to a WriteFreely server first.")]
    NotLoggedIn,

    /// The server rejected the password
    #[error("Invalid password. Please check that you've entered your password correctly and try logging in again.")]
    InvalidCredentials,

    /// The server does not know the username
    #[error("Username not found. Did you use your email address by mistake?")]
    UsernameNotFound,

    /// The server could not be reached at the given address
    #[error("The server could not be found. Please check the information you've entered and try again.")]
    ServerNotFound,

    /// The server address is not a usable URL
    #[error("Please enter a valid instance domain name. It should look like \"https://example.com\" or \"write.as\".")]
    InvalidServerUrl,

    /// Token could not be written to the credential store
    #[error("There was a problem trying to save your access token to the device, please try logging in again. ({0})")]
    CredentialStoreSaveFailed(String),

    /// Token could not be read from the credential store
    #[error("There was a problem trying to fetch your access token from the device, please try logging in again. ({0})")]
    CredentialStoreFetchFailed(String),

    /// Token could not be removed from the credential store
    #[error("There was a problem trying to delete your access token from the device, please try logging out again. ({0})")]
    CredentialStoreDeleteFailed(String),

    /// No network connection
    #[error("There is no internet connection at the moment. Please reconnect or try again later.")]
    NetworkUnavailable,

    /// Create/update round-trip failed; local state is untouched
    #[error("Publishing failed: {0}")]
    RemotePublishFailed(String),

    /// Fetching collections or posts failed
    #[error("Fetching from the server failed: {0}")]
    RemoteFetchFailed(String),
}
