use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};
use wf_core::db::PostQuery;
use wf_core::models::{Post, PostContent, PostFont, PostStatus};
use wf_core::sync::MergeReport;

use crate::cli::CompletionShell;
use crate::commands::account::{resolve_password, run_logout};
use crate::commands::common::{
    default_editor, format_post_lines, format_relative_time, normalize_content,
    normalize_post_identifier, open_service, parse_post_text, post_preview, render_post_text,
    resolve_db_path, resolve_post, short_id, WfService,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::run_set_font;
use crate::commands::delete::run_delete;
use crate::commands::list::list_posts;
use crate::commands::new::{run_new, save_post_text};
use crate::commands::sync::{format_merge_report, run_sync};
use crate::config::CliConfig;
use crate::error::CliError;

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_post_identifier_rejects_blank() {
    assert_eq!(normalize_post_identifier(" 0192 ").unwrap(), "0192");
    assert!(matches!(
        normalize_post_identifier("   "),
        Err(CliError::EmptyPostId)
    ));
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = 100_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
    assert_eq!(format_relative_time(now + 5_000, now), "just now");
}

#[test]
fn parse_post_text_splits_heading_title() {
    assert_eq!(
        parse_post_text("# Hello\n\nFirst paragraph.\nSecond line.\n"),
        PostContent::new("Hello", "First paragraph.\nSecond line.")
    );
    assert_eq!(
        parse_post_text("Just a body\n# not a title"),
        PostContent::new("", "Just a body\n# not a title")
    );
    assert_eq!(parse_post_text("# Only title"), PostContent::new("Only title", ""));
}

#[test]
fn render_post_text_is_parsed_back() {
    for content in [
        PostContent::new("Title", "Body text"),
        PostContent::new("", "Body only"),
        PostContent::new("Title only", ""),
    ] {
        assert_eq!(parse_post_text(&render_post_text(&content)), content);
    }
}

#[test]
fn post_preview_prefers_title_and_truncates() {
    let mut post = Post::new(None, PostFont::Serif, Default::default());
    assert_eq!(post_preview(&post, 10), "(empty)");

    post.content = PostContent::new("", "a   very long\tfirst line\nsecond");
    assert_eq!(post_preview(&post, 10), "a very ...");

    post.content.title = "Title".to_string();
    assert_eq!(post_preview(&post, 10), "Title");
}

#[test]
fn short_ids_are_thirteen_chars() {
    assert_eq!(short_id("0192f0c1-2b3c-7d4e-8f90-123456789abc"), "0192f0c1-2b3c");
    assert_eq!(short_id("abc"), "abc");
}

#[test]
fn merge_report_lines_only_list_changes() {
    assert_eq!(
        format_merge_report(&MergeReport {
            unchanged: 3,
            ..MergeReport::default()
        }),
        vec!["Up to date (3 posts)".to_string()]
    );
    assert_eq!(
        format_merge_report(&MergeReport {
            inserted: 2,
            conflicts: 1,
            ..MergeReport::default()
        }),
        vec![
            "Fetched 3 posts".to_string(),
            "  2 new".to_string(),
            "  1 kept local edits".to_string(),
        ]
    );
}

#[test]
fn explicit_db_path_wins_over_config() {
    let config = CliConfig {
        db_path: Some(PathBuf::from("/from/config.db")),
        ..CliConfig::default()
    };
    assert_eq!(
        resolve_db_path(Some(PathBuf::from("/from/flag.db")), &config),
        PathBuf::from("/from/flag.db")
    );
}

#[test]
fn explicit_password_is_used() {
    assert_eq!(resolve_password(Some("hunter2".to_string())).unwrap(), "hunter2");
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("wf"));
}

#[test]
fn completions_can_be_written_to_a_file() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("wf.fish");

    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    assert!(!std::fs::read_to_string(path).unwrap().is_empty());
}

async fn offline_service() -> (TempDir, WfService) {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("data").join("wf.db");
    let service = open_service(&path, true).await.unwrap();
    (tmp, service)
}

#[tokio::test]
async fn new_post_stores_title_and_body() {
    let (_tmp, service) = offline_service().await;

    run_new(
        &service,
        Some("blog".to_string()),
        &["# Hello\n\nWorld".to_string()],
    )
    .await
    .unwrap();

    let posts = service.list_posts(&PostQuery::all()).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, PostContent::new("Hello", "World"));
    assert_eq!(posts[0].collection_alias.as_deref(), Some("blog"));
    assert_eq!(posts[0].status, PostStatus::Local);
    assert_eq!(
        service.restore_last_draft().await.unwrap().map(|post| post.id),
        Some(posts[0].id)
    );
}

#[tokio::test]
async fn blank_text_discards_untouched_post() {
    let (_tmp, service) = offline_service().await;
    let post = service.create_post(None).await.unwrap();

    let result = save_post_text(&service, &post.id, "  \n").await;

    assert!(matches!(result, Err(CliError::EmptyContent)));
    assert_eq!(service.get_post(&post.id).await.unwrap(), None);
}

#[tokio::test]
async fn list_filters_and_limits() {
    let (_tmp, service) = offline_service().await;
    run_new(&service, Some("blog".to_string()), &["one".to_string()])
        .await
        .unwrap();
    run_new(&service, None, &["two".to_string()]).await.unwrap();
    run_new(&service, Some("blog".to_string()), &["three".to_string()])
        .await
        .unwrap();

    let all = list_posts(10, None, None, &service).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(format_post_lines(&all).len(), 3);

    assert_eq!(list_posts(2, None, None, &service).await.unwrap().len(), 2);

    let blog = list_posts(10, Some("blog"), None, &service).await.unwrap();
    assert_eq!(blog.len(), 2);
    assert!(blog
        .iter()
        .all(|post| post.collection_alias.as_deref() == Some("blog")));

    let published = list_posts(10, None, Some(PostStatus::Published), &service)
        .await
        .unwrap();
    assert!(published.is_empty());
}

#[tokio::test]
async fn resolve_post_by_full_id_and_prefix() {
    let (_tmp, service) = offline_service().await;
    let first = service.create_post(None).await.unwrap();
    let full_id = first.id.to_string();

    assert_eq!(resolve_post(&full_id, &service).await.unwrap().id, first.id);
    assert_eq!(
        resolve_post(&full_id[..8], &service).await.unwrap().id,
        first.id
    );
    assert!(matches!(
        resolve_post("zzzz", &service).await,
        Err(CliError::PostNotFound(_))
    ));

    let second = service.create_post(None).await.unwrap();
    let shared = full_id
        .chars()
        .zip(second.id.to_string().chars())
        .take_while(|(left, right)| left == right)
        .count();
    if shared > 0 {
        assert!(matches!(
            resolve_post(&full_id[..shared], &service).await,
            Err(CliError::AmbiguousPostId(_))
        ));
    }
}

#[tokio::test]
async fn delete_removes_post_and_draft_pointer() {
    let (_tmp, service) = offline_service().await;
    let post = service.create_post(None).await.unwrap();

    run_delete(&post.id.to_string(), &service).await.unwrap();

    assert_eq!(service.get_post(&post.id).await.unwrap(), None);
    assert_eq!(service.restore_last_draft().await.unwrap(), None);
}

#[tokio::test]
async fn set_font_applies_to_new_posts() {
    let (_tmp, service) = offline_service().await;

    run_set_font(PostFont::Wrap, &service).await.unwrap();

    assert_eq!(
        service.preferences().await.unwrap().default_font,
        PostFont::Wrap
    );
    assert_eq!(service.create_post(None).await.unwrap().font, PostFont::Wrap);
}

#[tokio::test]
async fn remote_commands_need_a_session() {
    let (_tmp, service) = offline_service().await;

    assert!(matches!(
        run_logout(&service).await,
        Err(CliError::Core(wf_core::Error::NotLoggedIn))
    ));
    assert!(matches!(
        run_sync(&service).await,
        Err(CliError::Core(
            wf_core::Error::NetworkUnavailable | wf_core::Error::NotLoggedIn
        ))
    ));
}
