//! Last-draft pointer
//!
//! A single slot naming the most recent unpublished post, so editing can be
//! resumed across sessions. Every unpublished edit overwrites it and a
//! successful publish clears it.

use crate::db::StateRepository;
use crate::error::Result;
use crate::models::PostId;

const LAST_DRAFT_KEY: &str = "last_draft";

/// Single-slot draft pointer over a state repository
pub struct DraftCache<S: StateRepository> {
    state: S,
}

impl<S: StateRepository> DraftCache<S> {
    pub const fn new(state: S) -> Self {
        Self { state }
    }

    /// Point the slot at `id`, replacing any previous draft.
    pub fn set_last_draft(&self, id: &PostId) -> Result<()> {
        self.state.set(LAST_DRAFT_KEY, &id.as_str())
    }

    /// Empty the slot.
    pub fn clear_last_draft(&self) -> Result<()> {
        self.state.remove(LAST_DRAFT_KEY)
    }

    /// Empty the slot only if it points at `id`.
    ///
    /// Returns whether the slot was cleared.
    pub fn clear_if_points_to(&self, id: &PostId) -> Result<bool> {
        if self.restore_last_draft()?.as_ref() == Some(id) {
            self.clear_last_draft()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The draft to resume, if any.
    pub fn restore_last_draft(&self) -> Result<Option<PostId>> {
        let Some(raw) = self.state.get(LAST_DRAFT_KEY)? else {
            return Ok(None);
        };

        match raw.parse() {
            Ok(id) => Ok(Some(id)),
            Err(error) => {
                tracing::warn!("Ignoring unreadable last draft pointer '{}': {}", raw, error);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, SqliteStateRepository};

    #[test]
    fn single_slot_is_overwritten() {
        let db = Database::open_in_memory().unwrap();
        let cache = DraftCache::new(SqliteStateRepository::new(db.connection()));

        assert_eq!(cache.restore_last_draft().unwrap(), None);

        let first = PostId::new();
        let second = PostId::new();
        cache.set_last_draft(&first).unwrap();
        cache.set_last_draft(&second).unwrap();
        assert_eq!(cache.restore_last_draft().unwrap(), Some(second));

        cache.clear_last_draft().unwrap();
        assert_eq!(cache.restore_last_draft().unwrap(), None);
    }

    #[test]
    fn clear_if_points_to_only_matches_same_post() {
        let db = Database::open_in_memory().unwrap();
        let cache = DraftCache::new(SqliteStateRepository::new(db.connection()));

        let draft = PostId::new();
        cache.set_last_draft(&draft).unwrap();

        assert!(!cache.clear_if_points_to(&PostId::new()).unwrap());
        assert_eq!(cache.restore_last_draft().unwrap(), Some(draft));

        assert!(cache.clear_if_points_to(&draft).unwrap());
        assert_eq!(cache.restore_last_draft().unwrap(), None);
    }

    #[test]
    fn unreadable_pointer_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        let state = SqliteStateRepository::new(db.connection());
        state.set(LAST_DRAFT_KEY, "not-a-uuid").unwrap();

        let cache = DraftCache::new(state);
        assert_eq!(cache.restore_last_draft().unwrap(), None);
    }
}
