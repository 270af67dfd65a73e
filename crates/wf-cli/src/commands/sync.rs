use wf_core::sync::MergeReport;

use crate::commands::common::WfService;
use crate::error::CliError;

pub async fn run_sync(service: &WfService) -> Result<(), CliError> {
    let report = service.sync().await?;
    for line in format_merge_report(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_merge_report(report: &MergeReport) -> Vec<String> {
    if !report.changed_anything() && report.conflicts == 0 {
        return vec![format!("Up to date ({} posts)", report.total())];
    }

    let mut lines = vec![format!("Fetched {} posts", report.total())];
    let counts = [
        ("new", report.inserted),
        ("updated from server", report.overwritten),
        ("confirmed published", report.confirmed),
        ("kept local edits", report.conflicts),
    ];
    lines.extend(
        counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(label, count)| format!("  {count} {label}")),
    );
    lines
}
