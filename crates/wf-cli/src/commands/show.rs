use crate::commands::common::{
    format_timestamp, normalize_post_identifier, render_post_text, resolve_post, WfService,
};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, service: &WfService) -> Result<(), CliError> {
    let normalized_id = normalize_post_identifier(id)?;
    let post = resolve_post(&normalized_id, service).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }

    println!("id:         {}", post.id);
    println!("status:     {}", post.status);
    if let Some(remote_id) = &post.remote_id {
        println!("remote id:  {remote_id}");
    }
    if let Some(alias) = &post.collection_alias {
        println!("collection: {alias}");
    }
    println!("font:       {}", post.font);
    println!("created:    {}", format_timestamp(post.created_at));
    if let Some(updated_at) = post.updated_at {
        println!("updated:    {}", format_timestamp(updated_at));
    }
    if post.has_newer_remote_copy {
        println!("note:       the server has a newer copy of this post");
    }
    println!();
    println!("{}", render_post_text(&post.content));
    Ok(())
}
