//! Status command handler: list recorded downloads.

use std::process::ExitCode;

use anyhow::{Context, Result};
use toolchain_mirror::logging::{console_level, init_logging};
use toolchain_mirror::{
    Database, Layout, Platform, ProvenanceStore, RecordFilter, ToolchainRecord,
};

use crate::app_config::RunSettings;
use crate::cli::StatusArgs;

/// Lists rows for the `selected` platforms, or all rows when none are selected.
pub async fn run_status_command(
    settings: &RunSettings,
    selected: &[Platform],
    args: &StatusArgs,
) -> Result<ExitCode> {
    init_logging(console_level(settings.quiet, settings.verbose), None)?;

    let layout = Layout::new(&settings.base_dir);
    let db_path = layout.database_path();
    if !db_path.exists() {
        println!("No toolchains recorded yet (no database at {}).", db_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let db = Database::new(&db_path, &settings.db_options)
        .await
        .with_context(|| format!("Failed to open database '{}'", db_path.display()))?;
    let store = ProvenanceStore::new(db.clone());
    let mut records = Vec::new();
    for filter in record_filters(selected, args.pending) {
        records.extend(store.list(filter).await?);
    }
    db.close().await;

    if records.is_empty() {
        println!("No recorded toolchains matched the current filters.");
        return Ok(ExitCode::SUCCESS);
    }

    for record in &records {
        println!("{}", render_record_row(record));
    }
    let pending = records.iter().filter(|r| !r.uploaded).count();
    println!("{} recorded, {pending} pending upload", records.len());

    Ok(ExitCode::SUCCESS)
}

/// One filter per selected platform, in the fixed platform order.
fn record_filters(selected: &[Platform], pending_upload_only: bool) -> Vec<RecordFilter> {
    if selected.is_empty() {
        return vec![RecordFilter {
            platform: None,
            pending_upload_only,
        }];
    }
    Platform::ALL
        .into_iter()
        .filter(|platform| selected.contains(platform))
        .map(|platform| RecordFilter {
            platform: Some(platform),
            pending_upload_only,
        })
        .collect()
}

fn render_record_row(record: &ToolchainRecord) -> String {
    let state = if record.uploaded { "uploaded" } else { "pending" };
    format!(
        "{:>5}  {:<7}  {:<8}  {}  {}",
        record.id, record.platform_str, state, record.downloaded_at, record.filename
    )
}
