//! File discovery for directory trees.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Abstraction over directory enumeration, so engines can be tested against
/// synthetic trees.
pub trait FileSystem: Send + Sync {
   /// Returns every regular file under `root`. Unreadable entries are
   /// skipped with a warning; enumeration itself never fails.
   fn get_files(&self, root: &Path) -> Vec<PathBuf>;
}

/// Local file system walker. Enumeration is single-threaded (it is cheap
/// relative to hashing and extraction); symlinks are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
   pub const fn new() -> Self {
      Self
   }
}

impl FileSystem for LocalFileSystem {
   fn get_files(&self, root: &Path) -> Vec<PathBuf> {
      let mut files = Vec::new();

      for entry in WalkDir::new(root).follow_links(false) {
         match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {},
            Err(e) => {
               tracing::warn!("walk error under {}: {e}", root.display());
            },
         }
      }

      files
   }
}

/// Canonical comparison key for a path: component-normalized and lowercased,
/// so the same physical file spelled with different separators or letter
/// case maps to one key. Used to keep a file from being reported as a
/// duplicate of itself.
pub fn path_identity_key(path: &Path) -> String {
   let parts: Vec<String> = path
      .components()
      .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
      .collect();
   parts.join("/")
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;

   #[test]
   fn finds_nested_regular_files_only() {
      let dir = TempDir::new().unwrap();
      std::fs::write(dir.path().join("top.txt"), b"a").unwrap();
      std::fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
      std::fs::write(dir.path().join("sub/deeper/nested.txt"), b"b").unwrap();

      let mut files = LocalFileSystem::new().get_files(dir.path());
      files.sort();

      assert_eq!(files.len(), 2);
      assert!(files.iter().all(|p| p.is_file()));
   }

   #[test]
   fn empty_root_yields_nothing() {
      let dir = TempDir::new().unwrap();
      assert!(LocalFileSystem::new().get_files(dir.path()).is_empty());
   }

   #[test]
   fn identity_key_ignores_case() {
      assert_eq!(
         path_identity_key(Path::new("/Books/A Title.pdf")),
         path_identity_key(Path::new("/books/a title.PDF")),
      );
   }

   #[test]
   fn identity_key_distinguishes_paths() {
      assert_ne!(
         path_identity_key(Path::new("/books/a.pdf")),
         path_identity_key(Path::new("/books/b.pdf")),
      );
   }
}
