//! Post repository implementation

use crate::error::{Error, Result};
use crate::models::{Post, PostContent, PostFont, PostId, PostLocale, PostStatus};
use rusqlite::{params, Connection, OptionalExtension};

const POST_COLUMNS: &str = "id, remote_id, slug, title, body, collection_alias, status, \
     created_at, updated_at, has_newer_remote_copy, font, language, is_rtl, \
     synced_title, synced_body";

/// Filter for post listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// `Some(Some(alias))` for a collection, `Some(None)` for posts outside any collection
    pub collection: Option<Option<String>>,
    /// Only posts with this status
    pub status: Option<PostStatus>,
}

impl PostQuery {
    /// Every post
    pub fn all() -> Self {
        Self::default()
    }

    /// Posts in the given collection
    pub fn in_collection(alias: impl Into<String>) -> Self {
        Self {
            collection: Some(Some(alias.into())),
            status: None,
        }
    }

    /// Narrow to a status
    #[must_use]
    pub const fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Trait for post storage operations
pub trait PostRepository {
    /// Insert a new post
    fn insert(&self, post: &Post) -> Result<()>;

    /// Get a post by local ID
    fn get(&self, id: &PostId) -> Result<Option<Post>>;

    /// Get a post by its server identifier
    fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<Post>>;

    /// Persist every field of an existing post
    fn save(&self, post: &Post) -> Result<()>;

    /// Permanently remove a post
    fn delete(&self, id: &PostId) -> Result<()>;

    /// List posts matching `query`, newest first
    fn list(&self, query: &PostQuery) -> Result<Vec<Post>>;

    /// Local IDs starting with `prefix`
    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

/// `SQLite` implementation of `PostRepository`
pub struct SqlitePostRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePostRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a post from a database row
    fn parse_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        let id: String = row.get(0)?;
        let status: String = row.get(6)?;
        let font: String = row.get(10)?;
        let synced_title: Option<String> = row.get(13)?;
        let synced_body: Option<String> = row.get(14)?;

        Ok(Post {
            id: id
                .parse::<PostId>()
                .map_err(|error| conversion_error(0, error))?,
            remote_id: row.get(1)?,
            slug: row.get(2)?,
            content: PostContent {
                title: row.get(3)?,
                body: row.get(4)?,
            },
            collection_alias: row.get(5)?,
            status: status
                .parse::<PostStatus>()
                .map_err(|error| conversion_error(6, error))?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            has_newer_remote_copy: row.get(9)?,
            font: PostFont::from_appearance(&font),
            locale: PostLocale {
                language: row.get(11)?,
                is_rtl: row.get(12)?,
            },
            synced: match (synced_title, synced_body) {
                (Some(title), Some(body)) => Some(PostContent { title, body }),
                _ => None,
            },
        })
    }

    fn check_invariant(post: &Post) -> Result<()> {
        if post.satisfies_status_invariant() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "post {} is local but has a remote id",
                post.id
            )))
        }
    }
}

fn conversion_error(
    column: usize,
    error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, error.into())
}

impl PostRepository for SqlitePostRepository<'_> {
    fn insert(&self, post: &Post) -> Result<()> {
        Self::check_invariant(post)?;

        self.conn.execute(
            &format!(
                "INSERT INTO posts ({POST_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                post.id.as_str(),
                post.remote_id,
                post.slug,
                post.content.title,
                post.content.body,
                post.collection_alias,
                post.status.as_str(),
                post.created_at,
                post.updated_at,
                post.has_newer_remote_copy,
                post.font.as_str(),
                post.locale.language,
                post.locale.is_rtl,
                post.synced.as_ref().map(|synced| synced.title.as_str()),
                post.synced.as_ref().map(|synced| synced.body.as_str()),
            ],
        )?;

        Ok(())
    }

    fn get(&self, id: &PostId) -> Result<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"),
                params![id.as_str()],
                Self::parse_post,
            )
            .optional()?;
        Ok(post)
    }

    fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE remote_id = ?"),
                params![remote_id],
                Self::parse_post,
            )
            .optional()?;
        Ok(post)
    }

    fn save(&self, post: &Post) -> Result<()> {
        Self::check_invariant(post)?;

        // created_at, font and locale are fixed at creation
        let rows = self.conn.execute(
            "UPDATE posts SET
                remote_id = ?, slug = ?, title = ?, body = ?, collection_alias = ?,
                status = ?, updated_at = ?, has_newer_remote_copy = ?,
                synced_title = ?, synced_body = ?
             WHERE id = ?",
            params![
                post.remote_id,
                post.slug,
                post.content.title,
                post.content.body,
                post.collection_alias,
                post.status.as_str(),
                post.updated_at,
                post.has_newer_remote_copy,
                post.synced.as_ref().map(|synced| synced.title.as_str()),
                post.synced.as_ref().map(|synced| synced.body.as_str()),
                post.id.as_str(),
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(post.id.to_string()));
        }

        Ok(())
    }

    fn delete(&self, id: &PostId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?", params![id.as_str()])?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn list(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let mut sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE 1 = 1");
        let mut values: Vec<String> = Vec::new();

        match &query.collection {
            Some(Some(alias)) => {
                sql.push_str(" AND collection_alias = ?");
                values.push(alias.clone());
            }
            Some(None) => sql.push_str(" AND collection_alias IS NULL"),
            None => {}
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            values.push(status.as_str().to_string());
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let posts = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), Self::parse_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(posts)
    }

    fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT id FROM posts
             WHERE id LIKE ?
             ORDER BY created_at DESC
             LIMIT ?",
        )?;

        let ids = stmt
            .query_map(params![format!("{prefix}%"), limit], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(ids)
    }
}
