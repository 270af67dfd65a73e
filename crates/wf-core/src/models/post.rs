//! Post model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::unix_millis_now;

/// A unique local identifier for a post, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(Uuid);

impl PostId {
    /// Create a new unique post ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Sync status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Never synced with the server
    Local,
    /// Synced before, with local changes not yet published
    Edited,
    /// Synced, no pending local changes
    Published,
}

impl PostStatus {
    /// Stable lowercase name used in storage and output
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Edited => "edited",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "edited" => Ok(Self::Edited),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown post status '{other}'")),
        }
    }
}

/// Font/style tag a post is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFont {
    /// Serif body text (server name `norm`)
    #[default]
    Serif,
    /// Sans-serif body text
    Sans,
    /// Monospace, wrapped
    Wrap,
}

impl PostFont {
    /// Appearance tag sent to and stored for the post
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serif => "serif",
            Self::Sans => "sans",
            Self::Wrap => "wrap",
        }
    }

    /// Appearance value the WriteFreely API expects
    pub const fn server_appearance(self) -> &'static str {
        match self {
            Self::Serif => "norm",
            Self::Sans => "sans",
            Self::Wrap => "wrap",
        }
    }

    /// Map a server appearance value onto a font, falling back to serif.
    pub fn from_appearance(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for PostFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostFont {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serif" | "norm" => Ok(Self::Serif),
            "sans" => Ok(Self::Sans),
            "wrap" | "mono" | "code" => Ok(Self::Wrap),
            other => Err(format!("unknown font '{other}'")),
        }
    }
}

/// Language and writing direction captured when a post is created
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostLocale {
    /// ISO 639 language code, if known
    pub language: Option<String>,
    /// Right-to-left script
    pub is_rtl: bool,
}

const RTL_LANGUAGES: &[&str] = &[
    "ar", "arc", "ckb", "dv", "fa", "he", "iw", "ks", "ku", "ps", "sd", "ug", "ur", "yi",
];

/// Whether the given language code is written right-to-left.
pub fn is_rtl_language(language: &str) -> bool {
    RTL_LANGUAGES.contains(&language.to_ascii_lowercase().as_str())
}

/// Derive the post locale from the process environment.
///
/// Reads `LC_ALL`, `LC_MESSAGES` then `LANG`; values such as `C`/`POSIX`
/// carry no language.
pub fn detect_locale() -> PostLocale {
    let raw = ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty());

    raw.map_or_else(PostLocale::default, |value| locale_from_tag(&value))
}

fn locale_from_tag(tag: &str) -> PostLocale {
    let language = tag
        .split(['_', '-', '.', '@'])
        .next()
        .map(|code| code.trim().to_ascii_lowercase())
        .filter(|code| {
            !code.is_empty() && code != "c" && code != "posix" && code.chars().all(char::is_alphabetic)
        });

    let is_rtl = language.as_deref().is_some_and(is_rtl_language);
    PostLocale { language, is_rtl }
}

/// Title and body of a post
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostContent {
    /// Post title (may be empty)
    pub title: String,
    /// Post body
    pub body: String,
}

impl PostContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A content change to one or both fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl PostEdit {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn both(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }

    /// Returns true when applying this edit would change `content`.
    pub fn changes(&self, content: &PostContent) -> bool {
        self.title.as_ref().is_some_and(|title| *title != content.title)
            || self.body.as_ref().is_some_and(|body| *body != content.body)
    }

    /// Apply the edit, returning whether anything changed.
    pub fn apply_to(&self, content: &mut PostContent) -> bool {
        let changed = self.changes(content);
        if let Some(title) = &self.title {
            content.title.clone_from(title);
        }
        if let Some(body) = &self.body {
            content.body.clone_from(body);
        }
        changed
    }
}

/// A post in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable local identifier
    pub id: PostId,
    /// Server identifier, assigned once published
    pub remote_id: Option<String>,
    /// Server URL slug, if published
    pub slug: Option<String>,
    /// Current local title and body
    pub content: PostContent,
    /// Alias of the collection the post belongs to, if any
    pub collection_alias: Option<String>,
    /// Sync status
    pub status: PostStatus,
    /// Creation timestamp (Unix ms), never changes
    pub created_at: i64,
    /// Last content change after first publish (Unix ms)
    pub updated_at: Option<i64>,
    /// A fetched server version differs from the last synced content
    pub has_newer_remote_copy: bool,
    /// Appearance tag copied from preferences at creation
    pub font: PostFont,
    /// Language and direction derived at creation
    pub locale: PostLocale,
    /// Content as last confirmed by the server
    pub synced: Option<PostContent>,
}

impl Post {
    /// Create a new, empty local post
    #[must_use]
    pub fn new(collection_alias: Option<String>, font: PostFont, locale: PostLocale) -> Self {
        Self {
            id: PostId::new(),
            remote_id: None,
            slug: None,
            content: PostContent::default(),
            collection_alias,
            status: PostStatus::Local,
            created_at: unix_millis_now(),
            updated_at: None,
            has_newer_remote_copy: false,
            font,
            locale,
            synced: None,
        }
    }

    /// Title shown in listings: the title, else the first body line.
    #[must_use]
    pub fn display_title(&self, max_len: usize) -> String {
        let title = self.content.title.trim();
        let source = if title.is_empty() {
            self.content.body.lines().next().unwrap_or("").trim()
        } else {
            title
        };
        source.chars().take(max_len).collect()
    }

    /// Check if title and body are both empty (whitespace counts as empty)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.title.trim().is_empty() && self.content.body.trim().is_empty()
    }

    /// An untouched local post that can be dropped when the editor is dismissed.
    #[must_use]
    pub fn is_discardable(&self) -> bool {
        self.content.title.is_empty()
            && self.content.body.is_empty()
            && self.status == PostStatus::Local
            && self.updated_at.is_none()
            && self.remote_id.is_none()
    }

    /// `local` posts never carry a server identifier.
    #[must_use]
    pub const fn satisfies_status_invariant(&self) -> bool {
        !matches!(self.status, PostStatus::Local) || self.remote_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_unique() {
        assert_ne!(PostId::new(), PostId::new());
    }

    #[test]
    fn test_post_id_parse() {
        let id = PostId::new();
        let parsed: PostId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_post_new_is_local_and_empty() {
        let post = Post::new(None, PostFont::Sans, PostLocale::default());
        assert_eq!(post.status, PostStatus::Local);
        assert!(post.remote_id.is_none());
        assert!(post.updated_at.is_none());
        assert!(post.created_at > 0);
        assert!(post.is_discardable());
        assert!(post.satisfies_status_invariant());
        assert_eq!(post.font, PostFont::Sans);
    }

    #[test]
    fn test_status_parse_roundtrip_names() {
        for status in [PostStatus::Local, PostStatus::Edited, PostStatus::Published] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("draft".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_font_accepts_server_aliases() {
        assert_eq!(PostFont::from_appearance("norm"), PostFont::Serif);
        assert_eq!(PostFont::from_appearance("code"), PostFont::Wrap);
        assert_eq!(PostFont::from_appearance("mono"), PostFont::Wrap);
        assert_eq!(PostFont::from_appearance("something"), PostFont::Serif);
    }

    #[test]
    fn test_locale_from_tag() {
        let locale = locale_from_tag("ar_EG.UTF-8");
        assert_eq!(locale.language.as_deref(), Some("ar"));
        assert!(locale.is_rtl);

        let locale = locale_from_tag("en_US.UTF-8");
        assert_eq!(locale.language.as_deref(), Some("en"));
        assert!(!locale.is_rtl);

        let locale = locale_from_tag("C.UTF-8");
        assert_eq!(locale, PostLocale::default());
    }

    #[test]
    fn test_edit_apply_reports_change() {
        let mut content = PostContent::new("Title", "Body");
        assert!(!PostEdit::title("Title").apply_to(&mut content));
        assert!(PostEdit::body("New body").apply_to(&mut content));
        assert_eq!(content, PostContent::new("Title", "New body"));
    }

    #[test]
    fn test_display_title_falls_back_to_body() {
        let mut post = Post::new(None, PostFont::Serif, PostLocale::default());
        post.content = PostContent::new("", "First line\nSecond");
        assert_eq!(post.display_title(50), "First line");
        post.content.title = "A title".to_string();
        assert_eq!(post.display_title(3), "A t");
    }

    #[test]
    fn test_published_post_with_content_is_not_discardable() {
        let mut post = Post::new(None, PostFont::Serif, PostLocale::default());
        post.content.body = "text".to_string();
        assert!(!post.is_discardable());
    }
}
