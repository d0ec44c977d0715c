//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use toolchain_mirror::Platform;

/// Mirror vendor toolchain downloads to local disk and remote storage.
///
/// Each run scrapes the setup guide for every platform, downloads archives
/// that were never fetched before, records them in a local database, and
/// copies each new file to the remote with rclone.
#[derive(Parser, Debug)]
#[command(name = "toolchain-mirror")]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding logs/, toolchains/ and cache/ (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Remote base destination; the platform name is appended
    #[arg(long, global = true, value_name = "REMOTE")]
    pub remote: Option<String>,

    /// Only mirror or list these platforms (repeatable; order stays linux, macos, windows)
    #[arg(short, long = "platform", global = true, value_name = "PLATFORM")]
    pub platforms: Vec<Platform>,

    /// Program used to copy files to the remote
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub sync_program: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download new toolchains and sync them (default)
    Run,

    /// List recorded downloads (filtered by -p/--platform)
    Status(StatusArgs),
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusArgs {
    /// Only rows whose upload has not succeeded
    #[arg(long)]
    pub pending: bool,
}
