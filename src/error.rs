use std::{io, path::PathBuf};

use thiserror::Error;

/// Main error type for the bookdex application.
///
/// Per-file problems during indexing or resolution are *not* represented
/// here: they are absorbed into [`crate::index::IndexSummary`] counters and
/// [`crate::dedup::ResolutionOutcome`] aggregates. Only failures that abort
/// a whole run (catalog open, configuration, task join) surface as errors.
#[derive(Debug, Error)]
pub enum Error {
   /// I/O error occurred during file or directory operations.
   #[error("io error: {0}")]
   Io(#[from] io::Error),

   /// Error occurred in the catalog store.
   #[error("catalog error: {0}")]
   Catalog(#[from] CatalogError),

   /// Configuration-related error occurred.
   #[error("config error: {0}")]
   Config(#[from] ConfigError),

   /// JSON serialization error occurred.
   #[error("json error: {0}")]
   Json(#[from] serde_json::Error),

   /// A worker task panicked or was cancelled.
   #[error("worker task failed: {0}")]
   Join(#[from] tokio::task::JoinError),

   /// The supplied root path does not exist or is not a directory.
   #[error("invalid root path: {path}", path = _0.display())]
   InvalidRoot(PathBuf),
}

impl Error {
   /// Process exit code for this error. Catalog-level failures get a
   /// distinct code so scripts can tell "rebuild the catalog" apart from
   /// ordinary failures.
   pub const fn exit_code(&self) -> i32 {
      match self {
         Self::Catalog(_) => 2,
         _ => 1,
      }
   }
}

/// Errors raised by the catalog store itself.
///
/// Any of these aborts the current run; per-file upsert failures inside an
/// indexing pass are counted, not raised.
#[derive(Debug, Error)]
pub enum CatalogError {
   /// Failed to open or create the catalog database file.
   #[error("failed to open catalog at {path}: {reason}", path = .path.display())]
   Open {
      path:   PathBuf,
      #[source]
      reason: rusqlite::Error,
   },

   /// Failed to create the directory that holds the catalog file.
   #[error("failed to create catalog directory {path}: {reason}", path = .path.display())]
   CreateDir {
      path:   PathBuf,
      #[source]
      reason: io::Error,
   },

   /// The on-disk schema was written by an incompatible version. There is
   /// no automatic migration; the operator re-creates the catalog.
   #[error(
      "catalog schema version {found} is not supported (expected {expected}); \
       delete the catalog file and re-index"
   )]
   SchemaVersion { found: i32, expected: i32 },

   /// SQLite statement or transaction error.
   #[error("sqlite error: {0}")]
   Sqlite(#[from] rusqlite::Error),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
   /// Config value is invalid or exceeds a safety cap.
   #[error("invalid config: {0}")]
   Invalid(String),
}

/// Standard result type using [`enum@Error`] as the default error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
