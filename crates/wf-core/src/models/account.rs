//! Account model

use serde::{Deserialize, Serialize};
use std::fmt;

/// The account a client is logged in with.
///
/// Only the server and username are persisted with local state; the access
/// token lives in the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Normalized server base URL
    pub server: String,
    /// Account username
    pub username: String,
}

impl Account {
    pub fn new(server: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
        }
    }
}

/// An authenticated account with its access token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountSession {
    pub account: Account,
    pub token: String,
}

impl AccountSession {
    pub fn new(account: Account, token: impl Into<String>) -> Self {
        Self {
            account,
            token: token.into(),
        }
    }
}

impl fmt::Debug for AccountSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AccountSession")
            .field("account", &self.account)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
