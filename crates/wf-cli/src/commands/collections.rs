use crate::commands::common::WfService;
use crate::error::CliError;

pub async fn run_collections(
    refresh: bool,
    as_json: bool,
    service: &WfService,
) -> Result<(), CliError> {
    let collections = if refresh {
        service.fetch_collections().await?
    } else {
        service.collections().await?
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&collections)?);
    } else if collections.is_empty() {
        println!("No collections cached. Run `wf collections --refresh` while logged in.");
    } else {
        for collection in &collections {
            println!("{:<20}  {}", collection.alias, collection.title);
        }
    }
    Ok(())
}
