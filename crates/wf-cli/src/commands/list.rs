use wf_core::db::PostQuery;
use wf_core::models::{Post, PostStatus};

use crate::commands::common::{format_post_lines, post_to_list_item, PostListItem, WfService};
use crate::error::CliError;

pub async fn list_posts(
    limit: usize,
    collection: Option<&str>,
    status: Option<PostStatus>,
    service: &WfService,
) -> Result<Vec<Post>, CliError> {
    let mut query = collection.map_or_else(PostQuery::all, PostQuery::in_collection);
    if let Some(status) = status {
        query = query.with_status(status);
    }

    let mut posts = service.list_posts(&query).await?;
    posts.truncate(limit);
    Ok(posts)
}

pub async fn run_list(
    limit: usize,
    collection: Option<&str>,
    status: Option<PostStatus>,
    as_json: bool,
    service: &WfService,
) -> Result<(), CliError> {
    let posts = list_posts(limit, collection, status, service).await?;

    if as_json {
        let json_items = posts
            .iter()
            .map(post_to_list_item)
            .collect::<Vec<PostListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if posts.is_empty() {
        println!("No posts yet.");
    } else {
        for line in format_post_lines(&posts) {
            println!("{line}");
        }
    }

    Ok(())
}
