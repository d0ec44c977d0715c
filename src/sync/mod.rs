//! Remote synchronization of mirrored artifacts.
//!
//! The workflow only needs "copy this file there, did it work?", so the seam
//! is the single-method [`SyncClient`] trait. [`RcloneSync`] is the
//! production implementation; tests substitute their own.

mod rclone;

use std::path::Path;

use async_trait::async_trait;

use crate::platform::Platform;

pub use rclone::{DEFAULT_SYNC_PROGRAM, RcloneSync};

/// Default remote root; one subdirectory per platform lives below it.
pub const DEFAULT_REMOTE_DESTINATION: &str = "gdrive:Development/ESP32/Toolchains";

/// Copies one local file to a remote destination.
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Returns true if the copy completed successfully.
    ///
    /// Failures are reported by the implementation's own logging; the caller
    /// only needs the outcome.
    async fn copy(&self, local_path: &Path, remote_dest: &str) -> bool;
}

/// Remote root with a per-platform subdirectory template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDestination {
    base: String,
}

impl RemoteDestination {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<base>/<platform>`
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), platform.as_str())
    }
}

impl Default for RemoteDestination {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_DESTINATION)
    }
}
