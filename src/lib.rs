//! Toolchain Mirror Library
//!
//! Keeps a local and remote copy of the toolchain archives linked from the
//! vendor's per-platform setup guides, with a database recording what was
//! fetched and whether it reached the remote.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`layout`] - On-disk directory structure under the base directory
//! - [`db`] - Database connection and schema management
//! - [`store`] - Provenance rows for downloaded toolchains
//! - [`scrape`] - Documentation page fetching and link extraction
//! - [`download`] - HTTP client with streaming downloads
//! - [`sync`] - Copying files to remote storage
//! - [`mirror`] - The per-platform download-and-record workflow
//! - [`logging`] - Console and monthly-rotated file logging

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod db;
pub mod download;
pub mod layout;
pub mod logging;
pub mod mirror;
pub mod platform;
pub mod scrape;
pub mod store;
pub mod sync;
pub mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use db::{Database, DatabaseOptions, DbError};
pub use download::{
    CONNECT_TIMEOUT_SECS, DownloadError, HttpClient, READ_TIMEOUT_SECS, artifact_filename,
};
pub use layout::{Layout, LayoutError};
pub use mirror::{
    LinkDecision, LinkOutcome, MirrorContext, MirrorError, MirrorStats, PlatformOutcome,
    PlatformTarget, RunOutcome,
};
pub use platform::Platform;
pub use scrape::{
    DEFAULT_DOWNLOAD_HOST, DEFAULT_SECTION_ID, LinkExtraction, PageScraper, ScrapeError,
    ScrapeRules,
};
pub use store::{NewToolchainRecord, ProvenanceStore, RecordFilter, StoreError, ToolchainRecord};
pub use sync::{
    DEFAULT_REMOTE_DESTINATION, DEFAULT_SYNC_PROGRAM, RcloneSync, RemoteDestination, SyncClient,
};
