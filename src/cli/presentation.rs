//! CLI presentation: text and JSON renderings of update results.

use crate::diff::ChangeSet;
use crate::error::UpdateError;
use crate::orchestrator::{UpdateOutcome, UpdateReport};
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

fn to_json(value: &serde_json::Value) -> Result<String, UpdateError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| UpdateError::Snapshot(format!("Failed to render JSON: {}", e)))
}

/// Render an update outcome as a human-readable summary with a table of files
pub fn format_update_text(outcome: &UpdateOutcome, color: bool) -> String {
    match outcome {
        UpdateOutcome::NotNewer { current, latest } => format!(
            "Up to date: installed {} (latest release is {})",
            current, latest
        ),
        UpdateOutcome::Completed(report) => format_report_text(report, color),
    }
}

fn format_report_text(report: &UpdateReport, color: bool) -> String {
    let mut out = format!(
        "Update {} -> {}: {} of {} files changed",
        report.current_version,
        report.target_version,
        report.changes.len(),
        report.remote_file_count
    );
    if report.is_up_to_date() {
        out.push_str("\nNothing to download.");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Path", "Hash", "Download"]);
    for link in &report.links {
        table.add_row(vec![
            link.path.clone(),
            link.content_hash.clone(),
            link.url.to_string(),
        ]);
    }
    for failure in &report.failures {
        let status = format!("FAILED: {}", failure.error);
        let status = if color {
            status.red().to_string()
        } else {
            status
        };
        table.add_row(vec![
            failure.path.clone(),
            failure.content_hash.clone(),
            status,
        ]);
    }
    out.push('\n');
    out.push_str(&table.to_string());

    if report.has_failures() {
        let summary = format!(
            "{} of {} download links could not be resolved",
            report.failures.len(),
            report.changes.len()
        );
        out.push('\n');
        if color {
            out.push_str(&summary.yellow().to_string());
        } else {
            out.push_str(&summary);
        }
    }
    out
}

/// Render an update outcome as JSON
pub fn format_update_json(outcome: &UpdateOutcome) -> Result<String, UpdateError> {
    let value = match outcome {
        UpdateOutcome::NotNewer { current, latest } => json!({
            "status": "not_newer",
            "current_version": current.to_string(),
            "latest_version": latest.to_string(),
        }),
        UpdateOutcome::Completed(report) => {
            let status = if report.has_failures() { "partial" } else { "done" };
            let links: Vec<_> = report
                .links
                .iter()
                .map(|l| json!({"path": l.path, "hash": l.content_hash, "url": l.url.as_str()}))
                .collect();
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|f| {
                    json!({
                        "path": f.path,
                        "hash": f.content_hash,
                        "not_found": f.error.is_not_found(),
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            json!({
                "status": status,
                "current_version": report.current_version.to_string(),
                "target_version": report.target_version.to_string(),
                "local_files": report.local_file_count,
                "remote_files": report.remote_file_count,
                "changes": report.changes,
                "links": links,
                "failures": failures,
            })
        }
    };
    to_json(&value)
}

/// Render a change set as `path  hash` lines, or JSON
pub fn format_change_set(changes: &ChangeSet, format: &str) -> Result<String, UpdateError> {
    if format == "json" {
        return to_json(&json!(changes));
    }
    if changes.is_empty() {
        return Ok("No changes.".to_string());
    }
    let width = changes.iter().map(|(p, _)| p.chars().count()).max().unwrap_or(0);
    Ok(changes
        .iter()
        .map(|(path, hash)| format!("{:width$}  {}", path, hash, width = width))
        .collect::<Vec<_>>()
        .join("\n"))
}
