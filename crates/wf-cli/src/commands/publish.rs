use wf_core::services::PublishOutcome;

use crate::commands::common::{normalize_post_identifier, resolve_post, WfService};
use crate::error::CliError;

pub async fn run_publish(id: &str, service: &WfService) -> Result<(), CliError> {
    let normalized_id = normalize_post_identifier(id)?;
    let post = resolve_post(&normalized_id, service).await?;

    match service.publish(&post.id).await? {
        PublishOutcome::Published(post) => {
            let remote_id = post.remote_id.as_deref().unwrap_or("-");
            println!("{} -> {remote_id} ({})", post.id, post.status);
        }
        PublishOutcome::Discarded => {
            println!("{} was deleted while publishing", post.id);
        }
    }
    Ok(())
}
