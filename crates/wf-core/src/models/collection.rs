//! Collection model

use serde::{Deserialize, Serialize};

/// A remote-owned grouping of posts (a blog), referenced locally by alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// URL alias, unique per server
    pub alias: String,
    /// Display title
    pub title: String,
}

impl Collection {
    pub fn new(alias: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            title: title.into(),
        }
    }
}
