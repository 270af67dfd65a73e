//! Collection repository implementation

use crate::error::Result;
use crate::models::Collection;
use rusqlite::{params, Connection};

/// Trait for cached collection references
pub trait CollectionRepository {
    /// Replace the cached set with `collections`
    fn replace_all(&self, collections: &[Collection]) -> Result<()>;

    /// List cached collections by title
    fn list(&self) -> Result<Vec<Collection>>;

    /// Remove every cached collection
    fn clear(&self) -> Result<()>;
}

/// `SQLite` implementation of `CollectionRepository`
pub struct SqliteCollectionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCollectionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn replace_all(&self, collections: &[Collection]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM collections", [])?;
        for collection in collections {
            tx.execute(
                "INSERT OR REPLACE INTO collections (alias, title) VALUES (?, ?)",
                params![collection.alias, collection.title],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Collection>> {
        let mut stmt = self
            .conn
            .prepare("SELECT alias, title FROM collections ORDER BY title COLLATE NOCASE, alias")?;
        let collections = stmt
            .query_map([], |row| {
                Ok(Collection {
                    alias: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(collections)
    }

    fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM collections", [])?;
        Ok(())
    }
}
