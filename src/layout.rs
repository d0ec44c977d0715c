//! On-disk layout for logs, mirrored toolchains, and the provenance database.
//!
//! Everything lives under a single base directory:
//!
//! ```text
//! <base>/logs/download.log
//! <base>/toolchains/<platform>/<filename>
//! <base>/cache/database.sqlite3
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::platform::Platform;

const LOGS_DIR: &str = "logs";
const TOOLCHAINS_DIR: &str = "toolchains";
const CACHE_DIR: &str = "cache";
const LOG_FILE: &str = "download.log";
const DATABASE_FILE: &str = "database.sqlite3";

/// Failure to prepare a directory of the layout.
#[derive(Debug, Error)]
#[error("failed to create directory {path}: {source}")]
pub struct LayoutError {
    /// Directory that could not be created.
    pub path: PathBuf,
    /// Underlying IO error.
    #[source]
    pub source: std::io::Error,
}

/// Paths of the local mirror rooted at a base directory.
#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    /// Creates a layout rooted at `base`. Nothing is created on disk yet.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Returns the base directory.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.base.join(LOGS_DIR)
    }

    #[must_use]
    pub fn toolchains_dir(&self) -> PathBuf {
        self.base.join(TOOLCHAINS_DIR)
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.base.join(CACHE_DIR)
    }

    /// Active log file; rotations sit next to it.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE)
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.cache_dir().join(DATABASE_FILE)
    }

    #[must_use]
    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.toolchains_dir().join(platform.as_str())
    }

    /// Local destination of an artifact.
    #[must_use]
    pub fn artifact_path(&self, platform: Platform, filename: &str) -> PathBuf {
        self.platform_dir(platform).join(filename)
    }

    /// Creates the `logs/`, `toolchains/` and `cache/` directories if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] naming the directory that could not be created.
    pub fn ensure(&self) -> Result<(), LayoutError> {
        for dir in [self.logs_dir(), self.toolchains_dir(), self.cache_dir()] {
            create_dir(&dir)?;
        }
        Ok(())
    }

    /// Creates `toolchains/<platform>/` if absent and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the directory cannot be created.
    pub fn ensure_platform_dir(&self, platform: Platform) -> Result<PathBuf, LayoutError> {
        let dir = self.platform_dir(platform);
        create_dir(&dir)?;
        Ok(dir)
    }
}

fn create_dir(dir: &Path) -> Result<(), LayoutError> {
    if dir.is_dir() {
        return Ok(());
    }
    debug!(path = %dir.display(), "creating directory");
    std::fs::create_dir_all(dir).map_err(|source| LayoutError {
        path: dir.to_path_buf(),
        source,
    })
}
