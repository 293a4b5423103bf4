//! Store error types.

/// Unified error type for the Aria persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A blocking task failed to join (panic or runtime shutdown).
    #[error("store task failed: {0}")]
    TaskJoin(String),

    /// A schema migration could not be applied.
    #[error("migration to version {version} failed: {reason}")]
    Migration { version: i32, reason: String },
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin(e.to_string())
    }
}

/// Convenience alias used throughout the store crate.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
