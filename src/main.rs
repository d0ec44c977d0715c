//! CLI entry point for the toolchain mirror.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod app_config;
mod cli;
mod commands;

use app_config::RunSettings;
use cli::{Args, Command};

// The mirror workflow is strictly sequential, so a single-threaded runtime suffices.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = app_config::load_config(args.config.as_deref())?;
    let settings = RunSettings::resolve(&args, &file_config)?;

    match args.command.as_ref().unwrap_or(&Command::Run) {
        Command::Run => commands::run_mirror_command(&settings).await,
        Command::Status(status_args) => {
            commands::run_status_command(&settings, &args.platforms, status_args).await
        }
    }
}
