//! HTTP download support for documentation pages and toolchain archives.
//!
//! # Features
//!
//! - Streaming downloads straight to the final path (memory-efficient for large archives)
//! - Filenames taken from the URL's last path segment
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context

mod client;
mod constants;
mod error;
mod filename;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::DownloadError;
pub use filename::artifact_filename;
