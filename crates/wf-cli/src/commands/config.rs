use std::path::Path;

use wf_core::models::PostFont;
use wf_core::util::normalize_server_url;

use crate::commands::common::WfService;
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run_set_font(font: PostFont, service: &WfService) -> Result<(), CliError> {
    service.set_default_font(font).await?;
    println!("New posts will use the {font} font");
    Ok(())
}

pub fn run_set_server(url: &str, config: &mut CliConfig) -> Result<(), CliError> {
    let server = normalize_server_url(url)?;
    config.default_server = Some(server.clone());
    let path = config.save().map_err(CliError::Config)?;

    println!("Default server set to {server} ({})", path.display());
    Ok(())
}

pub async fn run_show_config(
    config: &CliConfig,
    db_path: &Path,
    service: &WfService,
) -> Result<(), CliError> {
    let preferences = service.preferences().await?;

    println!(
        "default server: {}",
        config
            .default_server()
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("default font:   {}", preferences.default_font);
    println!("database:       {}", db_path.display());
    Ok(())
}
