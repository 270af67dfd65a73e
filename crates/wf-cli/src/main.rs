//! wf - write WriteFreely posts locally and publish them from the terminal

mod cli;
mod commands;
mod config;
mod credentials;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::account::{run_login, run_logout, run_status};
use crate::commands::collections::run_collections;
use crate::commands::common::{open_service, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::{run_set_font, run_set_server, run_show_config};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::new::run_new;
use crate::commands::publish::run_publish;
use crate::commands::resume::run_resume;
use crate::commands::show::run_show;
use crate::commands::sync::run_sync;
use crate::config::CliConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wf=info,wf_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load().unwrap_or_else(|error| {
        tracing::warn!("Using default configuration: {}", error);
        CliConfig::default()
    });
    let db_path = resolve_db_path(cli.db_path, &config);
    let offline = cli.offline;

    match cli.command {
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config {
            command: ConfigCommands::SetServer { url },
        }) => run_set_server(&url, &mut config)?,
        Some(command) => {
            let service = open_service(&db_path, offline).await?;
            match command {
                Commands::Login {
                    username,
                    server,
                    password,
                } => run_login(&username, server.as_deref(), password, &config, &service).await?,
                Commands::Logout => run_logout(&service).await?,
                Commands::Status => run_status(&service).await?,
                Commands::New { collection, text } => run_new(&service, collection, &text).await?,
                Commands::Edit { id } => run_edit(&id, &service).await?,
                Commands::Show { id, json } => run_show(&id, json, &service).await?,
                Commands::List {
                    limit,
                    collection,
                    status,
                    json,
                } => {
                    run_list(
                        limit,
                        collection.as_deref(),
                        status.map(Into::into),
                        json,
                        &service,
                    )
                    .await?;
                }
                Commands::Publish { id } => run_publish(&id, &service).await?,
                Commands::Sync => run_sync(&service).await?,
                Commands::Collections { refresh, json } => {
                    run_collections(refresh, json, &service).await?;
                }
                Commands::Delete { id } => run_delete(&id, &service).await?,
                Commands::Resume => run_resume(&service).await?,
                Commands::Config { command } => match command {
                    ConfigCommands::SetFont { font } => run_set_font(font.into(), &service).await?,
                    ConfigCommands::Show => run_show_config(&config, &db_path, &service).await?,
                    ConfigCommands::SetServer { url } => run_set_server(&url, &mut config)?,
                },
                Commands::Completions { shell, output } => {
                    run_completions(shell, output.as_deref())?;
                }
            }
        }
        None => {
            // Quick draft: wf "my post text"
            if cli.text.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                let service = open_service(&db_path, offline).await?;
                run_new(&service, None, &cli.text).await?;
            }
        }
    }

    Ok(())
}
