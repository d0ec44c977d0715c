//! Outcome and counter types for a mirror run.

use std::fmt;

use crate::platform::Platform;

/// What to do with one discovered link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
    /// The local file is already present; nothing is fetched or recorded.
    SkipExistsOnDisk,
    /// The store already has (platform, filename), even if the file is gone.
    SkipAlreadyRecorded {
        /// When the earlier download was recorded.
        downloaded_at: String,
    },
    /// Fetch, record, and sync.
    Download,
}

/// What happened to one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    SkippedOnDisk,
    SkippedRecorded,
    /// The URL had no usable filename.
    SkippedInvalid,
    /// Downloaded, recorded, and synced.
    Uploaded,
    /// Downloaded and recorded; the sync command failed.
    UploadFailed,
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub downloaded: usize,
    pub skipped_on_disk: usize,
    pub skipped_recorded: usize,
    pub skipped_invalid: usize,
    pub uploaded: usize,
    pub upload_failed: usize,
}

impl MirrorStats {
    /// Counts one link outcome.
    pub fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::SkippedOnDisk => self.skipped_on_disk += 1,
            LinkOutcome::SkippedRecorded => self.skipped_recorded += 1,
            LinkOutcome::SkippedInvalid => self.skipped_invalid += 1,
            LinkOutcome::Uploaded => {
                self.downloaded += 1;
                self.uploaded += 1;
            }
            LinkOutcome::UploadFailed => {
                self.downloaded += 1;
                self.upload_failed += 1;
            }
        }
    }

    /// Adds another platform's counters to this one.
    pub fn merge(&mut self, other: &MirrorStats) {
        self.downloaded += other.downloaded;
        self.skipped_on_disk += other.skipped_on_disk;
        self.skipped_recorded += other.skipped_recorded;
        self.skipped_invalid += other.skipped_invalid;
        self.uploaded += other.uploaded;
        self.upload_failed += other.upload_failed;
    }

    /// Number of links looked at.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped_on_disk + self.skipped_recorded + self.skipped_invalid
    }
}

/// Result of mirroring one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformOutcome {
    Mirrored(MirrorStats),
    /// The page yielded no qualifying link; nothing was downloaded.
    NoLinksFound,
}

/// Result of a whole run, mapped to the process exit status by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every platform was processed.
    Completed(MirrorStats),
    /// Stopped at the first platform without links; later ones were not touched.
    Aborted {
        platform: Platform,
        /// Counters for the platforms processed before the abort.
        stats: MirrorStats,
    },
}

impl RunOutcome {
    /// Process exit status: 0 on completion, 1 when aborted.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed(_) => 0,
            Self::Aborted { .. } => 1,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(stats) => write!(
                f,
                "completed: {} downloaded ({} uploaded, {} upload failures), {} skipped",
                stats.downloaded,
                stats.uploaded,
                stats.upload_failed,
                stats.skipped_on_disk + stats.skipped_recorded + stats.skipped_invalid
            ),
            Self::Aborted { platform, .. } => {
                write!(f, "aborted: no toolchains found for {platform}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_counts_downloads_once() {
        let mut stats = MirrorStats::default();
        stats.record(LinkOutcome::Uploaded);
        stats.record(LinkOutcome::UploadFailed);
        stats.record(LinkOutcome::SkippedOnDisk);
        stats.record(LinkOutcome::SkippedRecorded);

        assert_eq!(stats.downloaded, 2);
        assert_eq!(stats.uploaded, 1);
        assert_eq!(stats.upload_failed, 1);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn test_stats_merge_adds_fields() {
        let mut total = MirrorStats {
            downloaded: 1,
            uploaded: 1,
            ..MirrorStats::default()
        };
        total.merge(&MirrorStats {
            skipped_recorded: 2,
            ..MirrorStats::default()
        });
        assert_eq!(total.downloaded, 1);
        assert_eq!(total.skipped_recorded, 2);
    }

    #[test]
    fn test_run_outcome_exit_codes() {
        assert_eq!(RunOutcome::Completed(MirrorStats::default()).exit_code(), 0);
        let aborted = RunOutcome::Aborted {
            platform: Platform::Macos,
            stats: MirrorStats::default(),
        };
        assert_eq!(aborted.exit_code(), 1);
        assert!(aborted.to_string().contains("macos"));
    }
}
