use crate::commands::common::{capture_editor_input_with_initial, render_post_text, WfService};
use crate::commands::new::save_post_text;
use crate::error::CliError;

pub async fn run_resume(service: &WfService) -> Result<(), CliError> {
    let Some(post) = service.restore_last_draft().await? else {
        println!("No draft to resume");
        return Ok(());
    };

    let initial = render_post_text(&post.content);
    let Some(edited) = capture_editor_input_with_initial(&initial)? else {
        if service.discard_if_empty(&post.id).await? {
            println!("Discarded empty draft {}", post.id);
            return Ok(());
        }
        return Err(CliError::EmptyContent);
    };

    let updated = save_post_text(service, &post.id, &edited).await?;
    println!("{}", updated.id);
    Ok(())
}
