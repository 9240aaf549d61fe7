//! Duplicate grouping and resolution.
//!
//! Groups are derived from the catalog on demand and never persisted. The
//! resolver only ever deletes paths it was explicitly handed; deleting a
//! path that is already gone is a success, and one failed deletion never
//! stops the rest — failures come back in aggregate.

use std::{
   collections::{HashMap, HashSet},
   io,
   path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::{
   Result,
   catalog::{CatalogConn, FileRecord},
   file::path_identity_key,
   fingerprint::FileHash,
};

/// Scope of a duplicate-group query.
#[derive(Debug, Clone)]
pub enum Scope {
   /// Every catalog entry regardless of root.
   Everything,
   /// Only entries under the given root path.
   UnderRoot(PathBuf),
}

/// Catalog entries sharing one content fingerprint; always ≥ 2 members.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
   pub fingerprint: FileHash,
   pub members:     Vec<FileRecord>,
}

/// One local record and its same-content matches inside the reference root.
#[derive(Debug, Clone, Serialize)]
pub struct CrossMatch {
   pub local:          FileRecord,
   pub remote_matches: Vec<FileRecord>,
}

/// Computes duplicate groups from the catalog. Fingerprint sets with a
/// single member are not duplicates and are excluded. Output order is
/// deterministic (by first member path).
pub fn group_duplicates(conn: &CatalogConn, scope: &Scope) -> Result<Vec<DuplicateGroup>> {
   let records = match scope {
      Scope::Everything => conn.all_files()?,
      Scope::UnderRoot(root) => conn.list_under_root(root)?,
   };

   let mut by_hash: HashMap<FileHash, Vec<FileRecord>> = HashMap::new();
   for record in records {
      if let Some(hash) = record.fingerprint {
         by_hash.entry(hash).or_default().push(record);
      }
   }

   let mut groups: Vec<DuplicateGroup> = by_hash
      .into_iter()
      .filter(|(_, members)| members.len() >= 2)
      .map(|(fingerprint, mut members)| {
         members.sort_by(|a, b| a.path.cmp(&b.path));
         DuplicateGroup { fingerprint, members }
      })
      .collect();
   groups.sort_by(|a, b| a.members[0].path.cmp(&b.members[0].path));

   Ok(groups)
}

/// Pre-selects the member with the longest file name — a proxy for "most
/// descriptive name already applied". Ties keep the path-order first member.
pub fn keep_longest_name(group: &DuplicateGroup) -> Option<&FileRecord> {
   group.members.iter().reduce(|best, candidate| {
      if file_name_len(candidate) > file_name_len(best) {
         candidate
      } else {
         best
      }
   })
}

/// Pre-selects the largest member. A distinct policy from
/// [`keep_longest_name`], used when resolving by size; the two are not
/// interchangeable.
pub fn keep_largest(group: &DuplicateGroup) -> Option<&FileRecord> {
   group.members.iter().reduce(|best, candidate| {
      if candidate.size_bytes > best.size_bytes {
         candidate
      } else {
         best
      }
   })
}

fn file_name_len(record: &FileRecord) -> usize {
   record
      .path
      .file_name()
      .map_or(0, |name| name.to_string_lossy().chars().count())
}

/// For each distinct local fingerprint, finds reference-root entries with
/// the same fingerprint and a *different* path. Path identity is compared
/// case-insensitively with separator normalization, so a file indexed twice
/// under two spellings is never reported as a duplicate of itself.
pub fn resolve_cross_collection(
   conn: &CatalogConn,
   local: &[FileRecord],
   reference_root: &Path,
) -> Result<Vec<CrossMatch>> {
   let mut seen: HashSet<FileHash> = HashSet::new();
   let mut matches = Vec::new();

   for record in local {
      let Some(hash) = record.fingerprint else {
         continue;
      };
      if !seen.insert(hash) {
         continue;
      }

      let local_key = path_identity_key(&record.path);
      let remote_matches: Vec<FileRecord> = conn
         .find_by_fingerprint(&hash)?
         .into_iter()
         .filter(|remote| remote.path.starts_with(reference_root))
         .filter(|remote| path_identity_key(&remote.path) != local_key)
         .collect();

      if !remote_matches.is_empty() {
         matches.push(CrossMatch { local: record.clone(), remote_matches });
      }
   }

   Ok(matches)
}

/// Resolution action for a duplicate pair or group.
#[derive(Debug, Clone)]
pub enum Resolution {
   /// Leave both sides alone.
   KeepBoth,
   /// Keep the local copy; delete the listed reference-root copies.
   KeepLocalDeleteRemote { remotes: Vec<PathBuf> },
   /// Keep the reference copy; delete the local one.
   KeepRemoteDeleteLocal { local: PathBuf },
   /// Intra-root group resolution: delete exactly these members.
   DeleteMembers { paths: Vec<PathBuf> },
}

/// Failed deletion of one path during resolution.
#[derive(Debug, Error)]
#[error("failed to delete {path}: {reason}", path = .path.display())]
pub struct DeletionError {
   pub path:   PathBuf,
   #[source]
   pub reason: io::Error,
}

/// Aggregate outcome of applying one resolution action.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
   pub deleted: Vec<PathBuf>,
   pub errors:  Vec<DeletionError>,
}

/// Applies a resolution action. Every deletion attempt is independent:
/// failures are collected, never raised, and a path that no longer exists
/// counts as success (idempotent under re-application). The catalog is not
/// touched — stale records are pruned explicitly, if at all.
pub fn apply_resolution(resolution: &Resolution) -> ResolutionOutcome {
   let targets: &[PathBuf] = match resolution {
      Resolution::KeepBoth => return ResolutionOutcome::default(),
      Resolution::KeepLocalDeleteRemote { remotes } => remotes,
      Resolution::KeepRemoteDeleteLocal { local } => std::slice::from_ref(local),
      Resolution::DeleteMembers { paths } => paths,
   };

   let mut outcome = ResolutionOutcome::default();
   for path in targets {
      match std::fs::remove_file(path) {
         Ok(()) => outcome.deleted.push(path.clone()),
         Err(e) if e.kind() == io::ErrorKind::NotFound => {},
         Err(reason) => outcome.errors.push(DeletionError { path: path.clone(), reason }),
      }
   }

   outcome
}
