//! Account login, logout and session restore.

use crate::credentials::CredentialStore;
use crate::db::{
    CollectionRepository, Database, SqliteCollectionRepository, SqliteStateRepository,
    StateRepository,
};
use crate::error::{Error, Result};
use crate::events::PostEvent;
use crate::models::{Account, AccountSession};
use crate::reachability::Reachability;
use crate::remote::{RemoteClient, RemoteError};
use crate::util::{normalize_server_url, normalize_text_option};

use super::SyncService;

const ACCOUNT_KEY: &str = "account";

impl<R, C, N> SyncService<R, C, N>
where
    R: RemoteClient,
    C: CredentialStore,
    N: Reachability,
{
    /// Account of the current session, if logged in.
    pub async fn account(&self) -> Option<Account> {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.account.clone())
    }

    /// Account remembered in the store, whether or not a session is active.
    pub async fn saved_account(&self) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        load_account(&state.db)
    }

    /// Log in and remember the account.
    pub async fn login(&self, server: &str, username: &str, password: &str) -> Result<Account> {
        let server = normalize_server_url(server)?;
        let username = normalize_text_option(Some(username.to_string()))
            .ok_or_else(|| Error::InvalidInput("username cannot be empty".to_string()))?;
        self.ensure_reachable()?;

        let token = self
            .remote
            .login(&server, &username, password)
            .await
            .map_err(login_error)?;

        self.credentials
            .save(&token, &username, &server)
            .map_err(|error| Error::CredentialStoreSaveFailed(error.0))?;

        let account = Account::new(server, username);
        let mut state = self.state.lock().await;
        let raw = serde_json::to_string(&account)?;
        SqliteStateRepository::new(state.db.connection()).set(ACCOUNT_KEY, &raw)?;
        state.session = Some(AccountSession::new(account.clone(), token));
        drop(state);

        tracing::info!("Logged in as {} on {}", account.username, account.server);
        self.emit(PostEvent::SessionChanged { logged_in: true });
        Ok(account)
    }

    /// Log out, revoking the token where possible.
    ///
    /// Local posts are kept; cached collections belong to the account and
    /// are dropped.
    pub async fn logout(&self) -> Result<()> {
        let session = self
            .state
            .lock()
            .await
            .session
            .clone()
            .ok_or(Error::NotLoggedIn)?;

        if self.network.is_reachable() {
            if let Err(error) = self.remote.logout(&session).await {
                tracing::warn!("Server logout failed, discarding the token locally: {}", error);
            }
        }

        let account = &session.account;
        self.credentials
            .delete(&account.username, &account.server)
            .map_err(|error| Error::CredentialStoreDeleteFailed(error.0))?;

        let mut state = self.state.lock().await;
        SqliteStateRepository::new(state.db.connection()).remove(ACCOUNT_KEY)?;
        SqliteCollectionRepository::new(state.db.connection()).clear()?;
        state.session = None;
        drop(state);

        tracing::info!("Logged out {} from {}", account.username, account.server);
        self.emit(PostEvent::SessionChanged { logged_in: false });
        Ok(())
    }

    /// Re-establish the remembered session from the credential store.
    ///
    /// Returns `None` when no account is remembered.
    pub async fn restore_session(&self) -> Result<Option<Account>> {
        let mut state = self.state.lock().await;
        let Some(account) = load_account(&state.db)? else {
            return Ok(None);
        };

        let token = self
            .credentials
            .fetch(&account.username, &account.server)
            .map_err(|error| Error::CredentialStoreFetchFailed(error.0))?
            .ok_or_else(|| {
                Error::CredentialStoreFetchFailed(format!(
                    "no access token stored for {}",
                    account.username
                ))
            })?;

        state.session = Some(AccountSession::new(account.clone(), token));
        drop(state);

        tracing::debug!("Restored session for {}", account.username);
        self.emit(PostEvent::SessionChanged { logged_in: true });
        Ok(Some(account))
    }
}

fn load_account(db: &Database) -> Result<Option<Account>> {
    SqliteStateRepository::new(db.connection())
        .get(ACCOUNT_KEY)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(Error::from)
}

fn login_error(error: RemoteError) -> Error {
    match error {
        RemoteError::Unauthorized => Error::InvalidCredentials,
        RemoteError::UserNotFound => Error::UsernameNotFound,
        other => {
            tracing::warn!("Login failed: {}", other);
            Error::ServerNotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::reachability::NetworkMonitor;
    use crate::db::PostQuery;
    use crate::models::Collection;
    use crate::remote::{MockRemote, RemoteCall};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const SERVER: &str = "https://blog.test";

    type TestService = SyncService<MockRemote, MemoryCredentialStore, NetworkMonitor>;

    fn remote() -> MockRemote {
        let remote = MockRemote::new(SERVER);
        remote.add_account("ana", "secret");
        remote
    }

    fn service(remote: &MockRemote, credentials: &MemoryCredentialStore) -> TestService {
        SyncService::open_in_memory(remote.clone(), credentials.clone(), NetworkMonitor::online())
            .unwrap()
    }

    #[tokio::test]
    async fn login_remembers_account_and_token() {
        let credentials = MemoryCredentialStore::new();
        let service = service(&remote(), &credentials);
        let mut events = service.subscribe();

        let account = service.login("blog.test/", " ana ", "secret").await.unwrap();

        assert_eq!(account, Account::new(SERVER, "ana"));
        assert_eq!(service.account().await, Some(account.clone()));
        assert_eq!(service.saved_account().await.unwrap(), Some(account));
        assert_eq!(
            credentials.fetch("ana", SERVER).unwrap().as_deref(),
            Some("token-ana")
        );
        assert_eq!(
            events.try_recv().unwrap(),
            PostEvent::SessionChanged { logged_in: true }
        );
    }

    #[tokio::test]
    async fn login_errors_map_to_user_facing_kinds() {
        let service = service(&remote(), &MemoryCredentialStore::new());

        assert!(matches!(
            service.login(SERVER, "ana", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(SERVER, "bob", "secret").await,
            Err(Error::UsernameNotFound)
        ));
        assert!(matches!(
            service.login("https://nowhere.test", "ana", "secret").await,
            Err(Error::ServerNotFound)
        ));
        assert!(matches!(
            service.login("ftp://blog.test", "ana", "secret").await,
            Err(Error::InvalidServerUrl)
        ));
        assert_eq!(service.account().await, None);
    }

    #[tokio::test]
    async fn login_needs_network() {
        let remote = remote();
        let network = NetworkMonitor::new(false);
        let service =
            SyncService::open_in_memory(remote.clone(), MemoryCredentialStore::new(), network)
                .unwrap();

        assert!(matches!(
            service.login(SERVER, "ana", "secret").await,
            Err(Error::NetworkUnavailable)
        ));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_token_save_aborts_login() {
        let credentials = MemoryCredentialStore::new();
        credentials.set_failing(true);
        let service = service(&remote(), &credentials);

        assert!(matches!(
            service.login(SERVER, "ana", "secret").await,
            Err(Error::CredentialStoreSaveFailed(_))
        ));
        assert_eq!(service.account().await, None);
        assert_eq!(service.saved_account().await.unwrap(), None);
    }

    #[tokio::test]
    async fn logout_forgets_session_but_keeps_posts() {
        let remote = remote();
        let credentials = MemoryCredentialStore::new();
        let service = service(&remote, &credentials);
        service.login(SERVER, "ana", "secret").await.unwrap();
        remote.set_collections(vec![Collection::new("blog", "Blog")]);
        service.fetch_collections().await.unwrap();
        service.create_post(None).await.unwrap();

        service.logout().await.unwrap();

        assert_eq!(service.account().await, None);
        assert_eq!(service.saved_account().await.unwrap(), None);
        assert_eq!(credentials.fetch("ana", SERVER).unwrap(), None);
        assert!(service.collections().await.unwrap().is_empty());
        assert_eq!(service.list_posts(&PostQuery::all()).await.unwrap().len(), 1);
        assert!(remote.calls().contains(&RemoteCall::Logout));
    }

    #[tokio::test]
    async fn logout_survives_server_failure() {
        let remote = remote();
        let service = service(&remote, &MemoryCredentialStore::new());
        service.login(SERVER, "ana", "secret").await.unwrap();
        remote.set_unreachable(true);

        service.logout().await.unwrap();
        assert_eq!(service.account().await, None);
    }

    #[tokio::test]
    async fn failed_token_delete_keeps_session() {
        let credentials = MemoryCredentialStore::new();
        let service = service(&remote(), &credentials);
        service.login(SERVER, "ana", "secret").await.unwrap();
        credentials.set_failing(true);

        assert!(matches!(
            service.logout().await,
            Err(Error::CredentialStoreDeleteFailed(_))
        ));
        assert!(service.account().await.is_some());
    }

    #[tokio::test]
    async fn logout_without_session() {
        let service = service(&remote(), &MemoryCredentialStore::new());
        assert!(matches!(service.logout().await, Err(Error::NotLoggedIn)));
    }

    #[tokio::test]
    async fn session_is_restored_after_reopening() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("wf.db");
        let remote = remote();
        let credentials = MemoryCredentialStore::new();

        {
            let service: TestService = SyncService::open_path(
                &path,
                remote.clone(),
                credentials.clone(),
                NetworkMonitor::online(),
            )
            .unwrap();
            service.login(SERVER, "ana", "secret").await.unwrap();
        }

        let service: TestService =
            SyncService::open_path(&path, remote, credentials, NetworkMonitor::online()).unwrap();
        assert_eq!(service.account().await, None);

        let restored = service.restore_session().await.unwrap();
        assert_eq!(restored, Some(Account::new(SERVER, "ana")));
        assert_eq!(service.account().await, restored);
        service.fetch_posts().await.unwrap();
    }

    #[tokio::test]
    async fn restore_needs_a_stored_token() {
        let credentials = MemoryCredentialStore::new();
        let service = service(&remote(), &credentials);
        assert_eq!(service.restore_session().await.unwrap(), None);

        service.login(SERVER, "ana", "secret").await.unwrap();
        credentials.delete("ana", SERVER).unwrap();
        assert!(matches!(
            service.restore_session().await,
            Err(Error::CredentialStoreFetchFailed(_))
        ));

        credentials.set_failing(true);
        assert!(matches!(
            service.restore_session().await,
            Err(Error::CredentialStoreFetchFailed(_))
        ));
    }
}
