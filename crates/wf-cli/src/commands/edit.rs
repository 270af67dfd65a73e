use crate::commands::common::{
    capture_editor_input_with_initial, normalize_post_identifier, render_post_text, resolve_post,
    WfService,
};
use crate::commands::new::save_post_text;
use crate::error::CliError;

pub async fn run_edit(id: &str, service: &WfService) -> Result<(), CliError> {
    let normalized_id = normalize_post_identifier(id)?;
    let post = resolve_post(&normalized_id, service).await?;
    let initial = render_post_text(&post.content);

    let Some(edited) = capture_editor_input_with_initial(&initial)? else {
        return Err(CliError::EmptyContent);
    };

    if edited == initial.trim() {
        println!("{}", post.id);
        return Ok(());
    }

    let updated = save_post_text(service, &post.id, &edited).await?;
    println!("{} ({})", updated.id, updated.status);
    Ok(())
}
