use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use toolchain_mirror::SyncClient;

/// `SyncClient` double that records every copy and answers with a fixed outcome.
pub struct ScriptedSync {
    succeed: bool,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl ScriptedSync {
    pub fn succeeding() -> Self {
        Self::with_outcome(true)
    }

    pub fn failing() -> Self {
        Self::with_outcome(false)
    }

    fn with_outcome(succeed: bool) -> Self {
        Self {
            succeed,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().expect("sync double lock poisoned").clone()
    }
}

#[async_trait]
impl SyncClient for ScriptedSync {
    async fn copy(&self, local_path: &Path, remote_dest: &str) -> bool {
        self.calls
            .lock()
            .expect("sync double lock poisoned")
            .push((local_path.to_path_buf(), remote_dest.to_string()));
        self.succeed
    }
}
