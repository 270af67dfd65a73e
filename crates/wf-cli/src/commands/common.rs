use std::env;
use std::io::{self, BufRead, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use wf_core::models::{Post, PostContent, PostId};
use wf_core::reachability::NetworkMonitor;
use wf_core::remote::WriteFreelyClient;
use wf_core::services::SyncService;

use crate::config::CliConfig;
use crate::credentials::KeyringCredentialStore;
use crate::error::CliError;

pub type WfService = SyncService<WriteFreelyClient, KeyringCredentialStore, NetworkMonitor>;

#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub id: String,
    pub remote_id: Option<String>,
    pub status: String,
    pub title: String,
    pub preview: String,
    pub collection: Option<String>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub relative_time: String,
    pub has_newer_remote_copy: bool,
}

/// Open the post store and restore any remembered session.
///
/// A store that cannot be opened is fatal; a session that cannot be
/// restored only leaves the CLI logged out.
pub async fn open_service(db_path: &Path, offline: bool) -> Result<WfService, CliError> {
    let remote = WriteFreelyClient::new()?;
    let network = NetworkMonitor::new(!offline);
    let service = SyncService::open_path(db_path, remote, KeyringCredentialStore, network)
        .map_err(|error| CliError::StoreInit(format!("{}: {error}", db_path.display())))?;

    if let Err(error) = service.restore_session().await {
        tracing::warn!("Continuing logged out: {}", error);
    }

    Ok(service)
}

pub async fn resolve_post(post_query: &str, service: &WfService) -> Result<Post, CliError> {
    if let Ok(post_id) = post_query.parse::<PostId>() {
        if let Some(post) = service.get_post(&post_id).await? {
            return Ok(post);
        }
    }

    let matching_ids = service.find_post_ids(post_query, 3).await?;

    match matching_ids.len() {
        0 => Err(CliError::PostNotFound(post_query.to_string())),
        1 => {
            let resolved_id = matching_ids[0]
                .parse::<PostId>()
                .map_err(|_| CliError::PostNotFound(post_query.to_string()))?;
            service
                .get_post(&resolved_id)
                .await?
                .ok_or_else(|| CliError::PostNotFound(post_query.to_string()))
        }
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousPostId(format!(
                "ID prefix '{post_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_post_lines(posts: &[Post]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    posts
        .iter()
        .map(|post| {
            let short_id = short_id(&post.id.to_string());
            let preview = post_preview(post, 40);
            let relative_time = format_relative_time(last_touched(post), now_ms);
            let marker = if post.has_newer_remote_copy { " *" } else { "" };

            format!(
                "{short_id:<13}  {:<9}  {preview:<40}  {relative_time}{marker}",
                post.status.as_str()
            )
        })
        .collect()
}

pub fn post_to_list_item(post: &Post) -> PostListItem {
    let now_ms = Utc::now().timestamp_millis();

    PostListItem {
        id: post.id.to_string(),
        remote_id: post.remote_id.clone(),
        status: post.status.to_string(),
        title: post.content.title.clone(),
        preview: post_preview(post, 80),
        collection: post.collection_alias.clone(),
        created_at: post.created_at,
        updated_at: post.updated_at,
        relative_time: format_relative_time(last_touched(post), now_ms),
        has_newer_remote_copy: post.has_newer_remote_copy,
    }
}

fn last_touched(post: &Post) -> i64 {
    post.updated_at.unwrap_or(post.created_at)
}

pub fn post_preview(post: &Post, max_chars: usize) -> String {
    let first_line = post.display_title(usize::MAX);
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        "(empty)".to_string()
    } else if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Split editor text into title and body.
///
/// A first line of the form `# Title` is the title; everything after it
/// (minus leading blank lines) is the body.
pub fn parse_post_text(text: &str) -> PostContent {
    let text = text.trim_end();
    let mut lines = text.splitn(2, '\n');
    let first = lines.next().unwrap_or("");

    match first.trim_end().strip_prefix("# ") {
        Some(title) => {
            let body = lines.next().unwrap_or("").trim_start_matches(['\n', '\r']);
            PostContent::new(title.trim(), body)
        }
        None => PostContent::new("", text),
    }
}

/// Inverse of [`parse_post_text`].
pub fn render_post_text(content: &PostContent) -> String {
    if content.title.is_empty() {
        content.body.clone()
    } else if content.body.is_empty() {
        format!("# {}\n", content.title)
    } else {
        format!("# {}\n\n{}", content.title, content.body)
    }
}

pub fn resolve_post_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&text_parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    if let Some(text) = capture_editor_input_with_initial("")? {
        return Ok(text);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_post_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyPostId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Read one line from stdin, without the trailing newline.
pub fn read_stdin_line() -> Result<Option<String>, CliError> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(line.to_string()))
    }
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_post_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let post_text = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&post_text))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_post_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("wf-post-{}-{now}.md", std::process::id()))
}

/// `--db-path`, then `WF_DB_PATH`, then the config file, then the data dir.
pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &CliConfig) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("WF_DB_PATH").map(PathBuf::from))
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wf")
        .join("wf.db")
}
