//! In-process remote used by tests and offline demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use super::{PostPayload, RemoteClient, RemoteError, RemoteResult};
use crate::models::{AccountSession, Collection, PostLocale, RemotePost};
use crate::util::unix_millis_now;

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Login { username: String },
    Logout,
    FetchCollections,
    FetchPosts,
    Create { collection_alias: Option<String> },
    Update { remote_id: String },
}

#[derive(Default)]
struct MockState {
    server: String,
    accounts: HashMap<String, String>,
    collections: Vec<Collection>,
    posts: BTreeMap<String, RemotePost>,
    next_id: u64,
    calls: Vec<RemoteCall>,
    unreachable: bool,
    fail_publishes: bool,
    fail_fetches: bool,
    publish_gate: Option<Arc<Notify>>,
}

/// A scripted WriteFreely server living in memory
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    /// A server at `server` that accepts the given username/password
    pub fn new(server: impl Into<String>) -> Self {
        let remote = Self::default();
        remote.lock().server = server.into();
        remote
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not poison every later assertion
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn add_account(&self, username: impl Into<String>, password: impl Into<String>) {
        self.lock().accounts.insert(username.into(), password.into());
    }

    pub fn set_collections(&self, collections: Vec<Collection>) {
        self.lock().collections = collections;
    }

    /// Insert or replace a post on the server side.
    pub fn put_post(&self, post: RemotePost) {
        self.lock().posts.insert(post.remote_id.clone(), post);
    }

    /// Server-side copy of a post.
    pub fn post(&self, remote_id: &str) -> Option<RemotePost> {
        self.lock().posts.get(remote_id).cloned()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Simulate a server that cannot be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Make create/update requests fail with a server error.
    pub fn set_fail_publishes(&self, fail: bool) {
        self.lock().fail_publishes = fail;
    }

    /// Make collection/post fetches fail with a server error.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.lock().fail_fetches = fail;
    }

    /// Hold create/update responses until the returned handle is notified.
    pub fn hold_publishes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().publish_gate = Some(Arc::clone(&gate));
        gate
    }

    fn record(&self, call: RemoteCall) -> RemoteResult<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.unreachable {
            return Err(RemoteError::Unreachable("mock server offline".to_string()));
        }
        Ok(())
    }

    fn authorize(&self, session: &AccountSession) -> RemoteResult<()> {
        let state = self.lock();
        if session.account.server != state.server
            || !state.accounts.contains_key(&session.account.username)
            || session.token != token_for(&session.account.username)
        {
            return Err(RemoteError::Unauthorized);
        }
        Ok(())
    }

    fn check_publish(&self) -> RemoteResult<()> {
        if self.lock().fail_publishes {
            return Err(RemoteError::Api {
                status: 500,
                message: "publish rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_gate(&self) {
        let gate = self.lock().publish_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

fn token_for(username: &str) -> String {
    format!("token-{username}")
}

impl RemoteClient for MockRemote {
    async fn login(&self, server: &str, username: &str, password: &str) -> RemoteResult<String> {
        self.record(RemoteCall::Login {
            username: username.to_string(),
        })?;

        let state = self.lock();
        if server != state.server {
            return Err(RemoteError::Unreachable(format!("no server at {server}")));
        }
        match state.accounts.get(username) {
            None => Err(RemoteError::UserNotFound),
            Some(expected) if expected != password => Err(RemoteError::Unauthorized),
            Some(_) => Ok(token_for(username)),
        }
    }

    async fn logout(&self, session: &AccountSession) -> RemoteResult<()> {
        self.record(RemoteCall::Logout)?;
        self.authorize(session)
    }

    async fn fetch_collections(&self, session: &AccountSession) -> RemoteResult<Vec<Collection>> {
        self.record(RemoteCall::FetchCollections)?;
        self.authorize(session)?;
        let state = self.lock();
        if state.fail_fetches {
            return Err(RemoteError::Api {
                status: 500,
                message: "fetch rejected".to_string(),
            });
        }
        Ok(state.collections.clone())
    }

    async fn fetch_posts(&self, session: &AccountSession) -> RemoteResult<Vec<RemotePost>> {
        self.record(RemoteCall::FetchPosts)?;
        self.authorize(session)?;
        let state = self.lock();
        if state.fail_fetches {
            return Err(RemoteError::Api {
                status: 500,
                message: "fetch rejected".to_string(),
            });
        }
        Ok(state.posts.values().cloned().collect())
    }

    async fn create_post(
        &self,
        session: &AccountSession,
        collection_alias: Option<&str>,
        payload: &PostPayload,
    ) -> RemoteResult<RemotePost> {
        self.record(RemoteCall::Create {
            collection_alias: collection_alias.map(str::to_string),
        })?;
        self.authorize(session)?;
        self.check_publish()?;

        let post = {
            let mut state = self.lock();
            state.next_id += 1;
            let now = unix_millis_now();
            let post = RemotePost {
                remote_id: format!("remote-{}", state.next_id),
                slug: None,
                content: payload.content.clone(),
                collection_alias: collection_alias.map(str::to_string),
                created_at: now,
                updated_at: Some(now),
                font: payload.font,
                locale: PostLocale {
                    language: payload.language.clone(),
                    is_rtl: payload.is_rtl,
                },
            };
            state.posts.insert(post.remote_id.clone(), post.clone());
            post
        };

        self.wait_for_gate().await;
        Ok(post)
    }

    async fn update_post(
        &self,
        session: &AccountSession,
        remote_id: &str,
        payload: &PostPayload,
    ) -> RemoteResult<RemotePost> {
        self.record(RemoteCall::Update {
            remote_id: remote_id.to_string(),
        })?;
        self.authorize(session)?;
        self.check_publish()?;

        let post = {
            let mut state = self.lock();
            let Some(post) = state.posts.get_mut(remote_id) else {
                return Err(RemoteError::Api {
                    status: 404,
                    message: format!("post {remote_id} not found"),
                });
            };
            post.content = payload.content.clone();
            post.font = payload.font;
            post.updated_at = Some(unix_millis_now());
            post.clone()
        };

        self.wait_for_gate().await;
        Ok(post)
    }
}
