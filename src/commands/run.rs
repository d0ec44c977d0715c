//! Run command handler: one full mirror pass over the selected platforms.

use std::process::ExitCode;

use anyhow::{Context, Result};
use toolchain_mirror::logging::{console_level, init_logging};
use toolchain_mirror::{
    Database, HttpClient, Layout, MirrorContext, PageScraper, ProvenanceStore, RcloneSync, mirror,
};
use tracing::{debug, error, info};

use crate::app_config::RunSettings;

pub async fn run_mirror_command(settings: &RunSettings) -> Result<ExitCode> {
    let layout = Layout::new(&settings.base_dir);
    layout
        .ensure()
        .context("Failed to prepare the mirror directories")?;

    init_logging(
        console_level(settings.quiet, settings.verbose),
        Some(&layout.log_file()),
    )?;
    info!(
        base_dir = %layout.base().display(),
        remote = settings.remote.base(),
        "starting mirror run"
    );

    let db_path = layout.database_path();
    let db = Database::new(&db_path, &settings.db_options)
        .await
        .with_context(|| format!("Failed to open database '{}'", db_path.display()))?;
    let store = ProvenanceStore::new(db.clone());

    let client = HttpClient::new_with_timeouts(
        settings.connect_timeout_secs,
        settings.read_timeout_secs,
    )?;
    let scraper = PageScraper::new(client.clone(), settings.rules.clone());
    let sync = settings
        .sync_program
        .as_deref()
        .map_or_else(RcloneSync::default, RcloneSync::new);
    debug!(program = sync.program(), "sync program");

    let ctx = MirrorContext {
        layout: &layout,
        store: &store,
        scraper: &scraper,
        client: &client,
        sync: &sync,
        remote: &settings.remote,
    };
    let result = mirror::run(&ctx, &settings.targets).await;
    db.close().await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "mirror run failed");
            return Err(e.into());
        }
    };

    info!("{outcome}");
    Ok(ExitCode::from(outcome.exit_code()))
}
