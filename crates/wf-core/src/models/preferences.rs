//! User preferences model

use serde::{Deserialize, Serialize};

use super::PostFont;

/// User preferences consumed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Font applied to newly created posts
    pub default_font: PostFont,
}
