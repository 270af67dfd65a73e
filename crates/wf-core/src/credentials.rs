//! Secure credential storage boundary
//!
//! Access tokens never go into the post store. Platforms provide a
//! [`CredentialStore`] backed by their keychain; [`MemoryCredentialStore`]
//! serves tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Failure reported by a credential backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CredentialError(pub String);

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Stores one access token per (username, server) pair
pub trait CredentialStore: Clone + Send + Sync + 'static {
    fn save(&self, token: &str, username: &str, server: &str) -> CredentialResult<()>;
    fn fetch(&self, username: &str, server: &str) -> CredentialResult<Option<String>>;
    fn delete(&self, username: &str, server: &str) -> CredentialResult<()>;
}

/// Account name used for keychain entries
pub fn credential_account(username: &str, server: &str) -> String {
    format!("{username}@{server}")
}

/// Process-local credential store
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    tokens: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> CredentialResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CredentialError("credential store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn tokens(&self) -> CredentialResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.tokens
            .lock()
            .map_err(|error| CredentialError(error.to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str, username: &str, server: &str) -> CredentialResult<()> {
        self.check()?;
        self.tokens()?
            .insert(credential_account(username, server), token.to_string());
        Ok(())
    }

    fn fetch(&self, username: &str, server: &str) -> CredentialResult<Option<String>> {
        self.check()?;
        Ok(self
            .tokens()?
            .get(&credential_account(username, server))
            .cloned())
    }

    fn delete(&self, username: &str, server: &str) -> CredentialResult<()> {
        self.check()?;
        self.tokens()?.remove(&credential_account(username, server));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        store.save("tok", "matt", "https://write.as").unwrap();

        assert_eq!(
            store.fetch("matt", "https://write.as").unwrap().as_deref(),
            Some("tok")
        );
        assert_eq!(store.fetch("matt", "https://other.example").unwrap(), None);

        store.delete("matt", "https://write.as").unwrap();
        assert_eq!(store.fetch("matt", "https://write.as").unwrap(), None);
    }

    #[test]
    fn memory_store_failure_injection() {
        let store = MemoryCredentialStore::new();
        store.set_failing(true);
        assert!(store.save("tok", "matt", "https://write.as").is_err());
        assert!(store.fetch("matt", "https://write.as").is_err());
        assert!(store.delete("matt", "https://write.as").is_err());
    }

    #[test]
    fn clones_share_tokens() {
        let store = MemoryCredentialStore::new();
        let clone = store.clone();
        store.save("tok", "a", "https://s").unwrap();
        assert_eq!(clone.fetch("a", "https://s").unwrap().as_deref(), Some("tok"));
    }
}
