//! Access-token storage in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use wf_core::credentials::{credential_account, CredentialError, CredentialResult, CredentialStore};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "wf-cli";

/// Keychain entry per `username@server`
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(test)]
    fn locked() -> CredentialResult<std::sync::MutexGuard<'static, HashMap<String, String>>> {
        Self::test_store()
            .lock()
            .map_err(|error| CredentialError(error.to_string()))
    }

    #[cfg(not(test))]
    fn entry(username: &str, server: &str) -> CredentialResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &credential_account(username, server))
            .map_err(|error| CredentialError(error.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    #[cfg(not(test))]
    fn save(&self, token: &str, username: &str, server: &str) -> CredentialResult<()> {
        Self::entry(username, server)?
            .set_password(token)
            .map_err(|error| CredentialError(error.to_string()))
    }

    #[cfg(test)]
    fn save(&self, token: &str, username: &str, server: &str) -> CredentialResult<()> {
        Self::locked()?.insert(credential_account(username, server), token.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn fetch(&self, username: &str, server: &str) -> CredentialResult<Option<String>> {
        match Self::entry(username, server)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CredentialError(error.to_string())),
        }
    }

    #[cfg(test)]
    fn fetch(&self, username: &str, server: &str) -> CredentialResult<Option<String>> {
        Ok(Self::locked()?
            .get(&credential_account(username, server))
            .cloned())
    }

    #[cfg(not(test))]
    fn delete(&self, username: &str, server: &str) -> CredentialResult<()> {
        match Self::entry(username, server)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CredentialError(error.to_string())),
        }
    }

    #[cfg(test)]
    fn delete(&self, username: &str, server: &str) -> CredentialResult<()> {
        Self::locked()?.remove(&credential_account(username, server));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_keyed_by_user_and_server() {
        let store = KeyringCredentialStore;
        store.save("t1", "keyring-a", "https://one.test").unwrap();
        store.save("t2", "keyring-a", "https://two.test").unwrap();

        assert_eq!(
            store.fetch("keyring-a", "https://one.test").unwrap().as_deref(),
            Some("t1")
        );
        store.delete("keyring-a", "https://one.test").unwrap();
        assert_eq!(store.fetch("keyring-a", "https://one.test").unwrap(), None);
        assert_eq!(
            store.fetch("keyring-a", "https://two.test").unwrap().as_deref(),
            Some("t2")
        );
        store.delete("keyring-a", "https://one.test").unwrap();
    }
}
