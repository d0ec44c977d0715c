//! `rclone copy` based sync client.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error};

use super::SyncClient;

/// Program invoked when no override is configured.
pub const DEFAULT_SYNC_PROGRAM: &str = "rclone";

/// Runs `<program> copy --no-update-modtime -v <local> <remote>`.
///
/// Arguments are passed to the process directly, never through a shell, so
/// paths with spaces or quotes need no escaping. The child inherits stdout and
/// stderr so rclone's own progress output stays visible.
#[derive(Debug, Clone)]
pub struct RcloneSync {
    program: String,
}

impl RcloneSync {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn args<'a>(local_path: &'a Path, remote_dest: &'a str) -> [&'a std::ffi::OsStr; 5] {
        [
            "copy".as_ref(),
            "--no-update-modtime".as_ref(),
            "-v".as_ref(),
            local_path.as_os_str(),
            remote_dest.as_ref(),
        ]
    }
}

impl Default for RcloneSync {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_PROGRAM)
    }
}

#[async_trait]
impl SyncClient for RcloneSync {
    async fn copy(&self, local_path: &Path, remote_dest: &str) -> bool {
        let args = Self::args(local_path, remote_dest);
        debug!(
            command = %format!(
                "{} {}",
                self.program,
                args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
            ),
            "running sync command"
        );

        match Command::new(&self.program).args(args).status().await {
            Ok(status) if status.success() => true,
            Ok(status) => {
                debug!(%status, "sync command exited unsuccessfully");
                false
            }
            Err(e) => {
                error!(program = %self.program, error = %e, "failed to start sync command");
                false
            }
        }
    }
}
