//! Serialized engine over the local store and the remote service.
//!
//! Every store and session mutation happens while holding the service lock.
//! Remote calls run with the lock released; their results are applied after
//! re-acquiring it, and responses for posts that no longer exist are dropped.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::credentials::CredentialStore;
use crate::db::{
    CollectionRepository, Database, PostQuery, PostRepository, SqliteCollectionRepository,
    SqlitePostRepository, SqliteStateRepository, StateRepository,
};
use crate::drafts::DraftCache;
use crate::error::{Error, Result};
use crate::events::PostEvent;
use crate::models::{
    detect_locale, AccountSession, Collection, Post, PostContent, PostEdit, PostFont, PostId,
    PostStatus, Preferences, RemotePost,
};
use crate::reachability::Reachability;
use crate::remote::{PostPayload, RemoteClient, RemoteError};
use crate::status::{EditOrigin, ServerUpdateGuards, StatusEvent};
use crate::sync::{decide, MergeDecision, MergeReport};
use crate::util::{normalize_text_option, unix_millis_now};

const EVENT_CAPACITY: usize = 64;
const PREFERENCES_KEY: &str = "preferences";

pub(super) struct ServiceState {
    pub(super) db: Database,
    pub(super) session: Option<AccountSession>,
    guards: ServerUpdateGuards,
}

/// Result of a user edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit changed the post
    Applied(Post),
    /// The post already had this content
    Unchanged(Post),
    /// A server update is in progress; the edit is replayed when it finishes
    Deferred,
}

/// Result of a publish request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The server accepted the post
    Published(Post),
    /// The post was removed locally before the server answered
    Discarded,
}

/// The sync engine: one instance per store, shared by cloning.
pub struct SyncService<R, C, N> {
    pub(super) state: Arc<Mutex<ServiceState>>,
    pub(super) remote: Arc<R>,
    pub(super) credentials: C,
    pub(super) network: N,
    pub(super) events: broadcast::Sender<PostEvent>,
}

impl<R, C: Clone, N: Clone> Clone for SyncService<R, C, N> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            remote: Arc::clone(&self.remote),
            credentials: self.credentials.clone(),
            network: self.network.clone(),
            events: self.events.clone(),
        }
    }
}

impl<R, C, N> SyncService<R, C, N>
where
    R: RemoteClient,
    C: CredentialStore,
    N: Reachability,
{
    /// Open the store at `path`, creating parent directories as needed.
    pub fn open_path(
        path: impl AsRef<Path>,
        remote: R,
        credentials: C,
        network: N,
    ) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(path)?;
        tracing::debug!("Opened post store at {}", path.display());
        Ok(Self::with_database(db, remote, credentials, network))
    }

    /// Open a throwaway in-memory store (primarily for tests).
    pub fn open_in_memory(remote: R, credentials: C, network: N) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(db, remote, credentials, network))
    }

    fn with_database(db: Database, remote: R, credentials: C, network: N) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                db,
                session: None,
                guards: ServerUpdateGuards::new(),
            })),
            remote: Arc::new(remote),
            credentials,
            network,
            events,
        }
    }

    /// Receive change notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PostEvent> {
        self.events.subscribe()
    }

    pub(super) fn emit(&self, event: PostEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn emit_all(&self, events: Vec<PostEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    pub(super) fn ensure_reachable(&self) -> Result<()> {
        if self.network.is_reachable() {
            Ok(())
        } else {
            Err(Error::NetworkUnavailable)
        }
    }

    async fn current_session(&self) -> Result<AccountSession> {
        self.state
            .lock()
            .await
            .session
            .clone()
            .ok_or(Error::NotLoggedIn)
    }

    // ---- posts -------------------------------------------------------------

    /// Create an empty `local` post and make it the last draft.
    pub async fn create_post(&self, collection_alias: Option<String>) -> Result<Post> {
        let state = self.state.lock().await;
        let preferences = load_preferences(&state.db)?;
        let post = Post::new(
            normalize_text_option(collection_alias),
            preferences.default_font,
            detect_locale(),
        );

        SqlitePostRepository::new(state.db.connection()).insert(&post)?;
        drafts(&state.db).set_last_draft(&post.id)?;
        drop(state);

        tracing::debug!("Created post {}", post.id);
        self.emit(PostEvent::Created(post.id));
        Ok(post)
    }

    pub async fn get_post(&self, id: &PostId) -> Result<Option<Post>> {
        let state = self.state.lock().await;
        SqlitePostRepository::new(state.db.connection()).get(id)
    }

    /// Posts matching `query`, newest first.
    pub async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let state = self.state.lock().await;
        SqlitePostRepository::new(state.db.connection()).list(query)
    }

    /// Local IDs starting with `prefix`, for short-ID lookups.
    pub async fn find_post_ids(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        SqlitePostRepository::new(state.db.connection()).list_ids_by_prefix(prefix, limit)
    }

    /// Apply a user edit to the title and/or body.
    pub async fn edit_post(&self, id: &PostId, edit: PostEdit) -> Result<EditOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(edit) = state.guards.defer(id, edit) else {
            tracing::debug!("Deferring edit of post {} until the server update finishes", id);
            return Ok(EditOutcome::Deferred);
        };

        let mut post = load_post(&state.db, id)?;
        let events = apply_user_edit(&state.db, &mut post, &edit)?;
        drop(guard);

        if events.is_empty() {
            return Ok(EditOutcome::Unchanged(post));
        }
        self.emit_all(events);
        Ok(EditOutcome::Applied(post))
    }

    /// Remove `id` if it is an untouched local post, as on editor dismissal.
    ///
    /// Returns whether the post was removed.
    pub async fn discard_if_empty(&self, id: &PostId) -> Result<bool> {
        let state = self.state.lock().await;
        let posts = SqlitePostRepository::new(state.db.connection());
        let Some(post) = posts.get(id)? else {
            return Ok(false);
        };
        if !post.is_discardable() {
            return Ok(false);
        }

        posts.delete(id)?;
        drafts(&state.db).clear_if_points_to(id)?;
        drop(state);

        tracing::debug!("Discarded empty post {}", id);
        self.emit(PostEvent::Removed(*id));
        Ok(true)
    }

    /// Delete a post from the local store.
    pub async fn remove_post(&self, id: &PostId) -> Result<()> {
        let state = self.state.lock().await;
        SqlitePostRepository::new(state.db.connection()).delete(id)?;
        drafts(&state.db).clear_if_points_to(id)?;
        drop(state);

        tracing::debug!("Removed post {}", id);
        self.emit(PostEvent::Removed(*id));
        Ok(())
    }

    /// The post editing should resume with, if it still exists.
    pub async fn restore_last_draft(&self) -> Result<Option<Post>> {
        let state = self.state.lock().await;
        let drafts = drafts(&state.db);
        let Some(id) = drafts.restore_last_draft()? else {
            return Ok(None);
        };

        let post = SqlitePostRepository::new(state.db.connection()).get(&id)?;
        if post.is_none() {
            drafts.clear_last_draft()?;
        }
        Ok(post)
    }

    // ---- server-origin updates ---------------------------------------------

    /// Start overwriting `id` from server data.
    ///
    /// Returns false if an overwrite is already in progress.
    pub async fn begin_server_update(&self, id: &PostId) -> Result<bool> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        load_post(&state.db, id)?;
        Ok(state.guards.begin(*id))
    }

    /// Write server content into a post under an active server update.
    pub async fn apply_server_update(&self, id: &PostId, content: PostContent) -> Result<Post> {
        let state = self.state.lock().await;
        if !state.guards.is_active(id) {
            return Err(Error::InvalidInput(format!(
                "no server update in progress for post {id}"
            )));
        }

        let mut post = load_post(&state.db, id)?;
        write_server_content(&state.db, &mut post, content)?;
        drop(state);

        self.emit(PostEvent::ContentChanged(*id));
        Ok(post)
    }

    /// End a server update and replay user edits that arrived meanwhile.
    pub async fn finish_server_update(&self, id: &PostId) -> Result<Option<Post>> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let (post, events) = finish_server_update(&state.db, &mut state.guards, id)?;
        drop(guard);

        self.emit_all(events);
        Ok(post)
    }

    // ---- publishing --------------------------------------------------------

    /// Create or update the post on the server.
    ///
    /// Local state changes only after the server confirms.
    pub async fn publish(&self, id: &PostId) -> Result<PublishOutcome> {
        self.ensure_reachable()?;

        let (session, snapshot) = {
            let state = self.state.lock().await;
            let session = state.session.clone().ok_or(Error::NotLoggedIn)?;
            (session, load_post(&state.db, id)?)
        };

        let payload = PostPayload::from_post(&snapshot);
        let response = match snapshot.remote_id.as_deref() {
            Some(remote_id) => self.remote.update_post(&session, remote_id, &payload).await,
            None => {
                self.remote
                    .create_post(&session, snapshot.collection_alias.as_deref(), &payload)
                    .await
            }
        };
        let remote = response.map_err(|error| {
            tracing::warn!("Publishing post {} failed: {}", id, error);
            Error::RemotePublishFailed(error.to_string())
        })?;

        let state = self.state.lock().await;
        let posts = SqlitePostRepository::new(state.db.connection());
        let Some(mut post) = posts.get(id)? else {
            tracing::debug!("Ignoring publish response for removed post {}", id);
            return Ok(PublishOutcome::Discarded);
        };

        let tx = state.db.connection().unchecked_transaction()?;
        let mut removed = None;
        // A fetch that finished first may have merged the new server post as
        // a separate copy.
        if let Some(duplicate) = posts
            .get_by_remote_id(&remote.remote_id)?
            .filter(|duplicate| duplicate.id != post.id)
        {
            tracing::debug!(
                "Folding fetched copy {} into published post {}",
                duplicate.id,
                post.id
            );
            posts.delete(&duplicate.id)?;
            removed = Some(duplicate.id);
        }

        let from = post.status;
        let created = post.remote_id.is_none();
        post.remote_id = Some(remote.remote_id.clone());
        if remote.slug.is_some() {
            post.slug = remote.slug;
        }
        post.synced = Some(payload.content.clone());
        post.has_newer_remote_copy = false;

        if post.content == payload.content {
            post.status = from.apply(StatusEvent::PublishSucceeded);
            post.updated_at = if created {
                None
            } else {
                remote.updated_at.or(post.updated_at)
            };
            drafts(&state.db).clear_last_draft()?;
        } else {
            tracing::debug!("Post {} changed while publishing; keeping it edited", id);
            post.status = PostStatus::Edited;
        }
        posts.save(&post)?;
        tx.commit()?;
        drop(state);

        tracing::info!("Published post {} as {}", id, remote.remote_id);
        if let Some(duplicate) = removed {
            self.emit(PostEvent::Removed(duplicate));
        }
        if from != post.status {
            self.emit(PostEvent::StatusChanged {
                id: *id,
                from,
                to: post.status,
            });
        }
        Ok(PublishOutcome::Published(post))
    }

    // ---- fetching ----------------------------------------------------------

    /// Replace the cached collections with the server's.
    pub async fn fetch_collections(&self) -> Result<Vec<Collection>> {
        self.ensure_reachable()?;
        let session = self.current_session().await?;
        let collections = self
            .remote
            .fetch_collections(&session)
            .await
            .map_err(fetch_error)?;

        let state = self.state.lock().await;
        ensure_same_session(state.session.as_ref(), &session)?;
        SqliteCollectionRepository::new(state.db.connection()).replace_all(&collections)?;
        drop(state);

        tracing::info!("Cached {} collections", collections.len());
        self.emit(PostEvent::CollectionsChanged);
        Ok(collections)
    }

    /// Cached collections, by title.
    pub async fn collections(&self) -> Result<Vec<Collection>> {
        let state = self.state.lock().await;
        SqliteCollectionRepository::new(state.db.connection()).list()
    }

    /// Fetch the account's posts and merge them into the store.
    pub async fn fetch_posts(&self) -> Result<MergeReport> {
        self.ensure_reachable()?;
        let session = self.current_session().await?;
        let remote_posts = self
            .remote
            .fetch_posts(&session)
            .await
            .map_err(fetch_error)?;

        let mut guard = self.state.lock().await;
        ensure_same_session(guard.session.as_ref(), &session)?;
        let (report, events) = merge_remote_posts(&mut guard, &remote_posts)?;
        drop(guard);

        self.finish_merge(report, events);
        Ok(report)
    }

    /// Refresh collections, then posts.
    pub async fn sync(&self) -> Result<MergeReport> {
        self.fetch_collections().await?;
        self.fetch_posts().await
    }

    /// Merge already-fetched server posts into the store.
    pub async fn merge_remote_posts(&self, remote_posts: &[RemotePost]) -> Result<MergeReport> {
        let mut guard = self.state.lock().await;
        let (report, events) = merge_remote_posts(&mut guard, remote_posts)?;
        drop(guard);

        self.finish_merge(report, events);
        Ok(report)
    }

    fn finish_merge(&self, report: MergeReport, events: Vec<PostEvent>) {
        tracing::info!(
            "Merged {} server posts: {} new, {} updated, {} confirmed, {} conflicts",
            report.total(),
            report.inserted,
            report.overwritten,
            report.confirmed,
            report.conflicts
        );
        self.emit_all(events);
        self.emit(PostEvent::Merged(report));
    }

    // ---- preferences -------------------------------------------------------

    pub async fn preferences(&self) -> Result<Preferences> {
        let state = self.state.lock().await;
        load_preferences(&state.db)
    }

    pub async fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let state = self.state.lock().await;
        let raw = serde_json::to_string(preferences)?;
        SqliteStateRepository::new(state.db.connection()).set(PREFERENCES_KEY, &raw)
    }

    /// Font used for posts created from now on.
    pub async fn set_default_font(&self, font: PostFont) -> Result<()> {
        let mut preferences = self.preferences().await?;
        preferences.default_font = font;
        self.save_preferences(&preferences).await
    }
}

fn drafts(db: &Database) -> DraftCache<SqliteStateRepository<'_>> {
    DraftCache::new(SqliteStateRepository::new(db.connection()))
}

fn load_post(db: &Database, id: &PostId) -> Result<Post> {
    SqlitePostRepository::new(db.connection())
        .get(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))
}

fn load_preferences(db: &Database) -> Result<Preferences> {
    let Some(raw) = SqliteStateRepository::new(db.connection()).get(PREFERENCES_KEY)? else {
        return Ok(Preferences::default());
    };

    match serde_json::from_str(&raw) {
        Ok(preferences) => Ok(preferences),
        Err(error) => {
            tracing::warn!("Ignoring unreadable preferences: {}", error);
            Ok(Preferences::default())
        }
    }
}

fn fetch_error(error: RemoteError) -> Error {
    match error {
        RemoteError::Unauthorized => Error::InvalidCredentials,
        other => {
            tracing::warn!("Fetching from the server failed: {}", other);
            Error::RemoteFetchFailed(other.to_string())
        }
    }
}

fn ensure_same_session(current: Option<&AccountSession>, requested: &AccountSession) -> Result<()> {
    if current.map(|session| &session.account) == Some(&requested.account) {
        Ok(())
    } else {
        tracing::debug!("Ignoring fetch results for a session that has ended");
        Err(Error::NotLoggedIn)
    }
}

/// Apply a user edit and persist it. Returns no events when nothing changed.
fn apply_user_edit(db: &Database, post: &mut Post, edit: &PostEdit) -> Result<Vec<PostEvent>> {
    if !edit.apply_to(&mut post.content) {
        return Ok(Vec::new());
    }

    let from = post.status;
    post.status = from.after_edit(EditOrigin::User);
    if post.remote_id.is_some() {
        post.updated_at = Some(unix_millis_now());
    }

    SqlitePostRepository::new(db.connection()).save(post)?;
    drafts(db).set_last_draft(&post.id)?;

    let mut events = vec![PostEvent::ContentChanged(post.id)];
    if from != post.status {
        tracing::debug!("Post {} is now {} (was {})", post.id, post.status, from);
        events.push(PostEvent::StatusChanged {
            id: post.id,
            from,
            to: post.status,
        });
    }
    Ok(events)
}

fn write_server_content(db: &Database, post: &mut Post, content: PostContent) -> Result<()> {
    post.synced = Some(content.clone());
    post.content = content;
    post.status = post.status.after_edit(EditOrigin::Server);
    post.has_newer_remote_copy = true;
    SqlitePostRepository::new(db.connection()).save(post)
}

fn finish_server_update(
    db: &Database,
    guards: &mut ServerUpdateGuards,
    id: &PostId,
) -> Result<(Option<Post>, Vec<PostEvent>)> {
    let replay = guards.finish(id);
    let posts = SqlitePostRepository::new(db.connection());
    let Some(mut post) = posts.get(id)? else {
        return Ok((None, Vec::new()));
    };

    post.has_newer_remote_copy = false;
    posts.save(&post)?;

    let mut events = Vec::new();
    for edit in &replay {
        events.extend(apply_user_edit(db, &mut post, edit)?);
    }
    Ok((Some(post), events))
}

fn post_from_remote(remote: &RemotePost) -> Post {
    Post {
        id: PostId::new(),
        remote_id: Some(remote.remote_id.clone()),
        slug: remote.slug.clone(),
        content: remote.content.clone(),
        collection_alias: remote.collection_alias.clone(),
        status: PostStatus::Published,
        created_at: remote.created_at,
        updated_at: remote.updated_at,
        has_newer_remote_copy: false,
        font: remote.font,
        locale: remote.locale.clone(),
        synced: Some(remote.content.clone()),
    }
}

fn merge_remote_posts(
    state: &mut ServiceState,
    remote_posts: &[RemotePost],
) -> Result<(MergeReport, Vec<PostEvent>)> {
    let tx = state.db.connection().unchecked_transaction()?;
    let posts = SqlitePostRepository::new(state.db.connection());
    let mut report = MergeReport::default();
    let mut events = Vec::new();

    for remote in remote_posts {
        let local = posts.get_by_remote_id(&remote.remote_id)?;
        let decision = decide(local.as_ref(), remote);

        let applied = match (decision, local) {
            (MergeDecision::Insert, _) => {
                let post = post_from_remote(remote);
                posts.insert(&post)?;
                events.push(PostEvent::Created(post.id));
                decision
            }
            (MergeDecision::Unchanged, _) | (_, None) => MergeDecision::Unchanged,
            (MergeDecision::Overwrite, Some(mut post)) => {
                if state.guards.begin(post.id) {
                    if remote.slug.is_some() {
                        post.slug.clone_from(&remote.slug);
                    }
                    let written =
                        write_server_content(&state.db, &mut post, remote.content.clone());
                    let (_, replayed) =
                        finish_server_update(&state.db, &mut state.guards, &post.id)?;
                    written?;
                    events.push(PostEvent::ContentChanged(post.id));
                    events.extend(replayed);
                    decision
                } else {
                    tracing::debug!("Post {} is already being updated from the server", post.id);
                    MergeDecision::Unchanged
                }
            }
            (MergeDecision::ConfirmLocalEdit, Some(mut post)) => {
                let from = post.status;
                post.status = from.apply(StatusEvent::RemoteUnchanged);
                post.has_newer_remote_copy = false;
                post.synced = Some(remote.content.clone());
                posts.save(&post)?;
                drafts(&state.db).clear_last_draft()?;
                events.push(PostEvent::StatusChanged {
                    id: post.id,
                    from,
                    to: post.status,
                });
                decision
            }
            (MergeDecision::KeepLocalEdit, Some(mut post)) => {
                if !post.has_newer_remote_copy {
                    post.has_newer_remote_copy = true;
                    posts.save(&post)?;
                }
                tracing::warn!(
                    "Post {} has local edits and a newer server copy; keeping the local edits",
                    post.id
                );
                events.push(PostEvent::RemoteConflict(post.id));
                decision
            }
        };
        report.record(applied);
    }

    tx.commit()?;
    Ok((report, events))
}
