//! bookdex — incremental content-addressed catalog and duplicate resolution
//! for document collections.
//!
//! The catalog is a single-file SQLite database keyed by absolute path and
//! indexed by SHA-256 content fingerprint. Indexing is incremental: a file
//! whose `(size, mtime)` matches the stored record within a one-second
//! tolerance is skipped, so hashing and text extraction (the dominant
//! per-file costs) only run for new or changed files. Duplicate groups are
//! derived from the catalog on demand, either inside one root or across two
//! independently indexed roots.

pub mod catalog;
pub mod cmd;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod file;
pub mod fingerprint;
pub mod index;
pub mod util;

pub use error::{Error, Result};
