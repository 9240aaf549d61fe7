//! CLI command implementations for bookdex.
//!
//! Each module corresponds to one subcommand. Commands receive the loaded
//! [`crate::config::Config`] explicitly from `main`.

pub mod compare;
pub mod dupes;
pub mod index;
pub mod prune;
pub mod status;
