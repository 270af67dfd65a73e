//! Post as reported by the server

use serde::{Deserialize, Serialize};

use super::{PostContent, PostFont, PostLocale};

/// A post as returned by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePost {
    /// Server identifier
    pub remote_id: String,
    /// URL slug, if any
    pub slug: Option<String>,
    /// Title and body as stored on the server
    pub content: PostContent,
    /// Owning collection alias, if any
    pub collection_alias: Option<String>,
    /// Server creation time (Unix ms)
    pub created_at: i64,
    /// Server last-update time (Unix ms)
    pub updated_at: Option<i64>,
    /// Server appearance tag
    pub font: PostFont,
    /// Server language / direction
    pub locale: PostLocale,
}
