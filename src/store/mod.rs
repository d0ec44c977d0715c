//! Provenance store for mirrored toolchains.
//!
//! The store is the sole source of truth for "has this filename been
//! downloaded for this platform before". It is consulted before any artifact
//! fetch and written once per successful download:
//!
//! - [`ProvenanceStore::insert`] records the download (`uploaded = false`)
//! - [`ProvenanceStore::mark_uploaded`] flips the flag after a successful sync
//!
//! Rows are never updated otherwise and never deleted.
//!
//! # Example
//!
//! ```ignore
//! use toolchain_mirror::{Database, DatabaseOptions, NewToolchainRecord, Platform, ProvenanceStore};
//!
//! let db = Database::new(path, &DatabaseOptions::default()).await?;
//! let store = ProvenanceStore::new(db);
//!
//! if !store.exists(Platform::Linux, "xtensa.tar.gz").await? {
//!     let id = store.insert(&NewToolchainRecord { .. }).await?;
//!     store.mark_uploaded(id).await?;
//! }
//! ```

mod error;
mod record;

pub use error::{StoreDbErrorKind, StoreError};
pub use record::{NewToolchainRecord, RecordFilter, ToolchainRecord};

use sqlx::Row;
use tracing::instrument;

use crate::db::Database;
use crate::platform::Platform;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// `SQLite`-backed provenance table access.
#[derive(Debug, Clone)]
pub struct ProvenanceStore {
    db: Database,
}

impl ProvenanceStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns true if a row exists for (`platform`, `filename`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn exists(&self, platform: Platform, filename: &str) -> Result<bool> {
        let row = sqlx::query(
            r"SELECT EXISTS(
                  SELECT 1 FROM toolchains WHERE filename = ? AND platform = ?
              ) AS present",
        )
        .bind(filename)
        .bind(platform.as_str())
        .fetch_one(self.db.pool())
        .await?;

        Ok(row.get::<bool, _>("present"))
    }

    /// Returns the row for (`platform`, `filename`) if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn find(
        &self,
        platform: Platform,
        filename: &str,
    ) -> Result<Option<ToolchainRecord>> {
        let record = sqlx::query_as::<_, ToolchainRecord>(
            r"SELECT * FROM toolchains WHERE filename = ? AND platform = ? LIMIT 1",
        )
        .bind(filename)
        .bind(platform.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record)
    }

    /// Returns the row with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<ToolchainRecord>> {
        let record = sqlx::query_as::<_, ToolchainRecord>("SELECT * FROM toolchains WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record)
    }

    /// Records a completed download with `uploaded = false`.
    ///
    /// `downloaded_at` is stamped by the database at insert time.
    ///
    /// # Returns
    ///
    /// The id of the new row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueConstraintViolation`] if the path or the
    /// filename is already recorded, [`StoreError::Database`] otherwise.
    #[instrument(
        skip(self, record),
        fields(platform = %record.platform, filename = %record.filename)
    )]
    pub async fn insert(&self, record: &NewToolchainRecord<'_>) -> Result<i64> {
        let result = sqlx::query(
            r"INSERT INTO toolchains (url, path, filename, platform, uploaded, downloaded_at)
              VALUES (?, ?, ?, ?, 0, datetime('now'))
              RETURNING id",
        )
        .bind(record.url)
        .bind(record.path)
        .bind(record.filename)
        .bind(record.platform.as_str())
        .fetch_one(self.db.pool())
        .await?;

        Ok(result.get("id"))
    }

    /// Sets `uploaded = true` for the row, whatever its current value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] if no row has this id.
    #[instrument(skip(self))]
    pub async fn mark_uploaded(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE toolchains SET uploaded = 1 WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(id));
        }
        Ok(())
    }

    /// Lists rows in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: RecordFilter) -> Result<Vec<ToolchainRecord>> {
        let platform = filter.platform.map(|p| p.as_str());
        let records = sqlx::query_as::<_, ToolchainRecord>(
            r"SELECT * FROM toolchains
              WHERE (?1 IS NULL OR platform = ?1)
                AND (?2 = 0 OR uploaded = 0)
              ORDER BY id ASC",
        )
        .bind(platform)
        .bind(filter.pending_upload_only)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn setup_store() -> ProvenanceStore {
        ProvenanceStore::new(Database::new_in_memory().await.unwrap())
    }

    fn linux_record<'a>(filename: &'a str, path: &'a str) -> NewToolchainRecord<'a> {
        NewToolchainRecord {
            url: "https://dl.espressif.com/dl/toolchain.tar.gz",
            path,
            filename,
            platform: Platform::Linux,
        }
    }

    #[tokio::test]
    async fn test_exists_false_on_empty_store() {
        let store = setup_store().await;
        assert!(!store.exists(Platform::Linux, "a.zip").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_then_exists_for_same_platform_only() {
        let store = setup_store().await;
        let id = store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();

        assert!(id > 0);
        assert!(store.exists(Platform::Linux, "a.zip").await.unwrap());
        assert!(!store.exists(Platform::Windows, "a.zip").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_sets_defaults() {
        let store = setup_store().await;
        let id = store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();

        let record = store.get(id).await.unwrap().unwrap();
        assert!(!record.uploaded);
        assert_eq!(record.platform(), Some(Platform::Linux));
        assert_eq!(record.path, "toolchains/linux/a.zip");
        assert!(!record.downloaded_at.is_empty());
    }

    #[tokio::test]
    async fn test_insert_duplicate_filename_is_unique_violation() {
        let store = setup_store().await;
        store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();

        let err = store
            .insert(&linux_record("a.zip", "elsewhere/a.zip"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_insert_duplicate_path_is_unique_violation() {
        let store = setup_store().await;
        store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();

        let err = store
            .insert(&linux_record("b.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_mark_uploaded_flips_flag() {
        let store = setup_store().await;
        let id = store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();

        store.mark_uploaded(id).await.unwrap();
        store.mark_uploaded(id).await.unwrap();

        assert!(store.get(id).await.unwrap().unwrap().uploaded);
    }

    #[tokio::test]
    async fn test_mark_uploaded_unknown_id() {
        let store = setup_store().await;
        let err = store.mark_uploaded(999).await.unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound(999)));
    }

    #[tokio::test]
    async fn test_find_returns_downloaded_at() {
        let store = setup_store().await;
        store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();

        let record = store.find(Platform::Linux, "a.zip").await.unwrap().unwrap();
        assert_eq!(record.filename, "a.zip");
        assert_eq!(record.downloaded_at.len(), "2024-01-01 00:00:00".len());
        assert!(store.find(Platform::Macos, "a.zip").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_platform_and_pending() {
        let store = setup_store().await;
        let a = store
            .insert(&linux_record("a.zip", "toolchains/linux/a.zip"))
            .await
            .unwrap();
        store
            .insert(&linux_record("b.zip", "toolchains/linux/b.zip"))
            .await
            .unwrap();
        store
            .insert(&NewToolchainRecord {
                url: "https://dl.espressif.com/dl/c.zip",
                path: "toolchains/windows/c.zip",
                filename: "c.zip",
                platform: Platform::Windows,
            })
            .await
            .unwrap();
        store.mark_uploaded(a).await.unwrap();

        let all = store.list(RecordFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|r| r.filename.as_str()).collect::<Vec<_>>(),
            ["a.zip", "b.zip", "c.zip"]
        );

        let linux_pending = store
            .list(RecordFilter {
                platform: Some(Platform::Linux),
                pending_upload_only: true,
            })
            .await
            .unwrap();
        assert_eq!(linux_pending.len(), 1);
        assert_eq!(linux_pending[0].filename, "b.zip");
    }
}
