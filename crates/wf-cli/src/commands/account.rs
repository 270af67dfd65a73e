use std::env;

use wf_core::db::PostQuery;
use wf_core::models::PostStatus;

use crate::commands::common::{post_preview, read_stdin_line, WfService};
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run_login(
    username: &str,
    server: Option<&str>,
    password: Option<String>,
    config: &CliConfig,
    service: &WfService,
) -> Result<(), CliError> {
    let server = server
        .map(str::to_string)
        .or_else(|| config.default_server())
        .ok_or(CliError::NoServer)?;
    let password = resolve_password(password)?;

    let account = service.login(&server, username, &password).await?;
    println!("Logged in as {} on {}", account.username, account.server);
    Ok(())
}

/// `--password`, then `WF_PASSWORD`, then one line of stdin.
pub fn resolve_password(password: Option<String>) -> Result<String, CliError> {
    let password = match password.or_else(|| env::var("WF_PASSWORD").ok()) {
        Some(password) => Some(password),
        None => {
            eprint!("Password: ");
            read_stdin_line()?
        }
    };

    password
        .filter(|password| !password.is_empty())
        .ok_or(CliError::EmptyPassword)
}

pub async fn run_logout(service: &WfService) -> Result<(), CliError> {
    let account = service.account().await;
    service.logout().await?;
    if let Some(account) = account {
        println!("Logged out {} from {}", account.username, account.server);
    }
    Ok(())
}

pub async fn run_status(service: &WfService) -> Result<(), CliError> {
    match service.account().await {
        Some(account) => println!("Logged in as {} on {}", account.username, account.server),
        None => match service.saved_account().await? {
            Some(account) => println!(
                "Not logged in ({} on {} has no stored token)",
                account.username, account.server
            ),
            None => println!("Not logged in"),
        },
    }

    let posts = service.list_posts(&PostQuery::all()).await?;
    let count = |status: PostStatus| posts.iter().filter(|post| post.status == status).count();
    println!(
        "Posts: {} local, {} edited, {} published",
        count(PostStatus::Local),
        count(PostStatus::Edited),
        count(PostStatus::Published)
    );

    let conflicts = posts.iter().filter(|post| post.has_newer_remote_copy).count();
    if conflicts > 0 {
        println!("{conflicts} post(s) have a newer copy on the server");
    }

    if let Some(draft) = service.restore_last_draft().await? {
        println!("Last draft: {} {}", draft.id, post_preview(&draft, 40));
    }
    Ok(())
}
