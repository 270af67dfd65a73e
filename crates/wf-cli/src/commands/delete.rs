use crate::commands::common::{normalize_post_identifier, resolve_post, WfService};
use crate::error::CliError;

pub async fn run_delete(id: &str, service: &WfService) -> Result<(), CliError> {
    let normalized_id = normalize_post_identifier(id)?;
    let post = resolve_post(&normalized_id, service).await?;

    service.remove_post(&post.id).await?;
    println!("{}", post.id);
    Ok(())
}
