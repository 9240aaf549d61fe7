//! Content fingerprinting and staleness decisions.
//!
//! A fingerprint is the SHA-256 of a file's full byte stream, computed in
//! fixed-size chunks so arbitrarily large files never load into memory.
//! Staleness compares the stored `(size, mtime)` pair against a fresh stat;
//! skipping fresh files is the primary cost-avoidance mechanism since
//! hashing and extraction dominate per-file cost.

use std::{
   fmt,
   fs::{self, File},
   io::{self, Read},
   path::Path,
   time::UNIX_EPOCH,
};

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::catalog::FileRecord;

/// Chunk size for streaming file hashing.
const HASH_BUF_SIZE: usize = 65536;

/// Modification-time comparison tolerance in seconds. Some filesystems
/// truncate sub-second precision, so mtimes closer than this are equal.
pub const MTIME_TOLERANCE_SECS: f64 = 1.0;

/// SHA-256 hash of file contents
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct FileHash([u8; 32]);

impl FileHash {
   pub const fn new(hash: [u8; 32]) -> Self {
      Self(hash)
   }

   /// Computes SHA-256 hash of an in-memory buffer
   pub fn sum(dat: impl AsRef<[u8]>) -> Self {
      Self(Sha256::digest(dat.as_ref()).into())
   }

   /// Parses the 64-character hex form produced by [`fmt::Display`]
   pub fn from_hex(hex_str: &str) -> Option<Self> {
      let bytes = hex::decode(hex_str).ok()?;
      let (this, rem) = bytes.split_first_chunk()?;
      rem.is_empty().then_some(Self(*this))
   }
}

impl AsRef<[u8]> for FileHash {
   fn as_ref(&self) -> &[u8] {
      &self.0
   }
}

impl fmt::Display for FileHash {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{}", hex::encode(self.0))
   }
}

impl fmt::Debug for FileHash {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "Hash({})", hex::encode(self.0))
   }
}

impl Serialize for FileHash {
   fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
      serializer.collect_str(self)
   }
}

/// Computes the content fingerprint of a file by streaming it through
/// SHA-256 in [`HASH_BUF_SIZE`] chunks.
pub fn fingerprint_file(path: &Path) -> io::Result<FileHash> {
   let mut file = File::open(path)?;
   let mut hasher = Sha256::new();
   let mut buf = vec![0u8; HASH_BUF_SIZE];

   loop {
      let n = file.read(&mut buf)?;
      if n == 0 {
         break;
      }
      hasher.update(&buf[..n]);
   }

   Ok(FileHash::new(hasher.finalize().into()))
}

/// Modification time of `metadata` as Unix seconds, 0.0 if unavailable
pub fn mtime_secs(metadata: &fs::Metadata) -> f64 {
   metadata
      .modified()
      .ok()
      .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
      .map_or(0.0, |d| d.as_secs_f64())
}

/// Whether a file needs (re-)indexing given its current stat and the
/// previously stored record. True when there is no prior record, when the
/// size differs, or when the mtime moved by at least
/// [`MTIME_TOLERANCE_SECS`].
pub fn is_stale(metadata: &fs::Metadata, stored: Option<&FileRecord>) -> bool {
   stale_against(metadata.len(), mtime_secs(metadata), stored)
}

fn stale_against(size_bytes: u64, mtime: f64, stored: Option<&FileRecord>) -> bool {
   let Some(record) = stored else {
      return true;
   };

   if record.size_bytes != size_bytes {
      return true;
   }

   (record.mtime - mtime).abs() >= MTIME_TOLERANCE_SECS
}

#[cfg(test)]
mod tests {
   use std::path::PathBuf;

   use tempfile::TempDir;

   use super::*;

   fn record(size_bytes: u64, mtime: f64) -> FileRecord {
      FileRecord {
         id: 1,
         path: PathBuf::from("/books/a.txt"),
         relative_path: Some("a.txt".to_string()),
         size_bytes,
         mtime,
         fingerprint: None,
         title: None,
         authors: None,
         needs_deep_extraction: false,
         indexed_at: String::new(),
      }
   }

   #[test]
   fn missing_record_is_stale() {
      assert!(stale_against(10, 100.0, None));
   }

   #[test]
   fn size_change_is_stale() {
      let rec = record(10, 100.0);
      assert!(stale_against(11, 100.0, Some(&rec)));
   }

   #[test]
   fn mtime_within_tolerance_is_fresh() {
      let rec = record(10, 100.0);
      assert!(!stale_against(10, 100.5, Some(&rec)));
      assert!(!stale_against(10, 99.5, Some(&rec)));
      assert!(!stale_against(10, 100.0, Some(&rec)));
   }

   #[test]
   fn mtime_at_tolerance_is_stale() {
      let rec = record(10, 100.0);
      assert!(stale_against(10, 101.0, Some(&rec)));
      assert!(stale_against(10, 99.0, Some(&rec)));
      assert!(stale_against(10, 250.0, Some(&rec)));
   }

   #[test]
   fn sum_is_deterministic() {
      assert_eq!(FileHash::sum(b"abc"), FileHash::sum(b"abc"));
      assert_ne!(FileHash::sum(b"abc"), FileHash::sum(b"abd"));
   }

   #[test]
   fn hex_roundtrip() {
      let hash = FileHash::sum(b"roundtrip");
      let parsed = FileHash::from_hex(&hash.to_string()).unwrap();
      assert_eq!(hash, parsed);

      assert!(FileHash::from_hex("not hex").is_none());
      assert!(FileHash::from_hex("abcd").is_none());
   }

   #[test]
   fn streaming_matches_one_shot() {
      let dir = TempDir::new().unwrap();
      let path = dir.path().join("big.bin");
      // Larger than one hash buffer so the loop runs more than once.
      let contents: Vec<u8> = (0u32..100_000).map(|i| (i % 251) as u8).collect();
      std::fs::write(&path, &contents).unwrap();

      assert_eq!(fingerprint_file(&path).unwrap(), FileHash::sum(&contents));
   }

   #[test]
   fn identical_bytes_under_different_names_match() {
      let dir = TempDir::new().unwrap();
      let a = dir.path().join("a.txt");
      let b = dir.path().join("copy of a.txt");
      std::fs::write(&a, b"same bytes").unwrap();
      std::fs::write(&b, b"same bytes").unwrap();

      assert_eq!(fingerprint_file(&a).unwrap(), fingerprint_file(&b).unwrap());
   }

   #[test]
   fn missing_file_fails() {
      assert!(fingerprint_file(Path::new("/no/such/file")).is_err());
   }
}
