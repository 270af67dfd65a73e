use wf_core::models::{Post, PostEdit, PostId};
use wf_core::services::EditOutcome;

use crate::commands::common::{parse_post_text, resolve_post_text, WfService};
use crate::error::CliError;

pub async fn run_new(
    service: &WfService,
    collection: Option<String>,
    text_parts: &[String],
) -> Result<(), CliError> {
    let text = resolve_post_text(text_parts)?;
    let post = service.create_post(collection).await?;
    let post = save_post_text(service, &post.id, &text).await?;

    println!("{}", post.id);
    Ok(())
}

/// Write editor-style text into the post as a user edit.
///
/// Text that leaves the post empty discards it when it was never touched.
pub async fn save_post_text(
    service: &WfService,
    id: &PostId,
    text: &str,
) -> Result<Post, CliError> {
    let content = parse_post_text(text);
    let outcome = service
        .edit_post(id, PostEdit::both(content.title, content.body))
        .await?;

    match outcome {
        EditOutcome::Applied(post) | EditOutcome::Unchanged(post) => {
            if service.discard_if_empty(&post.id).await? {
                return Err(CliError::EmptyContent);
            }
            Ok(post)
        }
        EditOutcome::Deferred => service
            .get_post(id)
            .await?
            .ok_or_else(|| CliError::PostNotFound(id.to_string())),
    }
}
