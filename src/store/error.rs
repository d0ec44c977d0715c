//! Error types for provenance store operations.

use std::fmt;

use thiserror::Error;

/// Structured classification for store/database failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDbErrorKind {
    /// `SQLite` returned busy/locked.
    BusyOrLocked,
    /// UNIQUE constraint failure (duplicate path or filename).
    UniqueViolation,
    /// Any other constraint failure (check/not-null).
    ConstraintViolation,
    /// Expected row was not found.
    RowNotFound,
    /// Filesystem or transport IO failure.
    Io,
    /// Unclassified database failure.
    Other,
}

impl StoreDbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }
}

impl fmt::Display for StoreDbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::UniqueViolation => "unique_violation",
            Self::ConstraintViolation => "constraint_violation",
            Self::RowNotFound => "row_not_found",
            Self::Io => "io",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> StoreDbErrorKind {
    if database_error.is_unique_violation() {
        return StoreDbErrorKind::UniqueViolation;
    }

    let code = database_error.code();
    if matches!(
        code.as_deref(),
        Some("SQLITE_BUSY" | "SQLITE_LOCKED" | "5" | "6")
    ) {
        return StoreDbErrorKind::BusyOrLocked;
    }

    if database_error.is_check_violation()
        || code
            .as_deref()
            .is_some_and(|value| value.starts_with("SQLITE_CONSTRAINT"))
    {
        return StoreDbErrorKind::ConstraintViolation;
    }

    StoreDbErrorKind::Other
}

/// Errors that can occur during provenance store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A row with the same path or filename already exists.
    #[error("toolchain already recorded: {message}")]
    UniqueConstraintViolation {
        /// Database error text naming the violated column.
        message: String,
    },

    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        kind: StoreDbErrorKind,
        message: String,
    },

    /// No row with the given id.
    #[error("toolchain record not found: id {0}")]
    RecordNotFound(i64),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match StoreDbErrorKind::from_sqlx(&err) {
            StoreDbErrorKind::UniqueViolation => Self::UniqueConstraintViolation {
                message: err.to_string(),
            },
            kind => Self::Database {
                kind,
                message: err.to_string(),
            },
        }
    }
}

impl StoreError {
    /// Returns true when an insert collided with an existing path or filename.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation { .. })
    }
}
