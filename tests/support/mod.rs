#![allow(dead_code, reason = "not every test file uses every helper")]

use std::path::{Path, PathBuf};

use bookdex::catalog::Catalog;
use tempfile::TempDir;

/// Creates a directory under `base` and canonicalizes it so stored catalog
/// paths compare equal to what the tests query with.
pub fn make_root(base: &TempDir, name: &str) -> PathBuf {
   let root = base.path().join(name);
   std::fs::create_dir_all(&root).expect("create root");
   root.canonicalize().expect("canonicalize root")
}

pub fn write_file(root: &Path, name: &str, contents: &[u8]) -> PathBuf {
   let path = root.join(name);
   std::fs::write(&path, contents).expect("write file");
   path
}

pub fn open_catalog(base: &TempDir) -> Catalog {
   Catalog::open(base.path().join("catalog/index.db")).expect("open catalog")
}
