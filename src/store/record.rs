//! Provenance row types.

use sqlx::FromRow;

use crate::platform::Platform;

/// A recorded download, as stored in the `toolchains` table.
#[derive(Debug, Clone, FromRow)]
pub struct ToolchainRecord {
    /// Unique identifier.
    pub id: i64,
    /// Source URL of the artifact.
    pub url: String,
    /// Local filesystem path the artifact was written to.
    pub path: String,
    /// Base filename.
    pub filename: String,
    /// Platform name as stored (parsed via `platform()`).
    #[sqlx(rename = "platform")]
    pub platform_str: String,
    /// Whether the remote sync succeeded.
    pub uploaded: bool,
    /// `YYYY-MM-DD HH:MM:SS` (UTC) at insert time.
    pub downloaded_at: String,
}

impl ToolchainRecord {
    /// Returns the parsed platform.
    ///
    /// The schema's CHECK constraint only admits known names, so `None`
    /// means the database was edited by hand.
    #[must_use]
    pub fn platform(&self) -> Option<Platform> {
        self.platform_str.parse().ok()
    }
}

/// Fields supplied when recording a fresh download.
#[derive(Debug, Clone, Copy)]
pub struct NewToolchainRecord<'a> {
    pub url: &'a str,
    pub path: &'a str,
    pub filename: &'a str,
    pub platform: Platform,
}

/// Filter for [`ProvenanceStore::list`](super::ProvenanceStore::list).
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
    /// Only rows for this platform.
    pub platform: Option<Platform>,
    /// Only rows whose sync has not succeeded.
    pub pending_upload_only: bool,
}
