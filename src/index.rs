//! Incremental indexing engine.
//!
//! A single-threaded walk enumerates the tree; per-file work (stat →
//! staleness check → hash → extract → upsert) runs on a bounded pool of
//! blocking tasks, each with its own catalog connection. Completion is
//! durable per file as soon as its upsert commits, so an interrupted run
//! re-processes only what it never finished — there is no run-spanning
//! transaction.

use std::{path::Path, sync::Arc};

use futures::{StreamExt, stream};
use indicatif::ProgressBar;
use serde::Serialize;

use crate::{
   Error, Result,
   catalog::{Catalog, NewFileRecord},
   extract::Extractor,
   file::FileSystem,
   fingerprint,
};

/// Progress snapshots are emitted every this many completed files.
const PROGRESS_INTERVAL: usize = 25;

/// Result summary from an indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
   pub processed: usize,
   pub skipped:   usize,
   pub failed:    usize,
}

/// Progress snapshot emitted during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
   pub processed:    usize,
   pub skipped:      usize,
   pub failed:       usize,
   pub total:        usize,
   pub current_file: Option<String>,
}

/// Trait for receiving scan progress updates
pub trait ScanProgressCallback: Send {
   fn progress(&mut self, progress: ScanProgress);
}

impl<F: FnMut(ScanProgress) + Send> ScanProgressCallback for F {
   fn progress(&mut self, progress: ScanProgress) {
      self(progress);
   }
}

impl ScanProgressCallback for () {
   fn progress(&mut self, _progress: ScanProgress) {}
}

impl ScanProgressCallback for ProgressBar {
   fn progress(&mut self, progress: ScanProgress) {
      let done = progress.processed + progress.skipped + progress.failed;
      self.update(|state| {
         state.set_len(progress.total as u64);
         state.set_pos(done as u64);
      });
      if let Some(file) = &progress.current_file {
         let short = file.rsplit('/').next().unwrap_or(file);
         self.set_message(short.to_string());
      }
   }
}

/// Options for one indexing run.
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
   /// Bounded worker-pool size.
   pub workers:       usize,
   /// Re-process every file regardless of staleness.
   pub force_reindex: bool,
}

/// Terminal state of one file inside a run. There is no per-file retry;
/// failures surface in the summary for a later run to pick up.
enum FileOutcome {
   Skipped,
   Indexed,
   Failed,
}

/// Engine that walks a tree and upserts catalog entries.
pub struct IndexEngine<F: FileSystem, X: Extractor> {
   file_system: F,
   extractor:   Arc<X>,
   catalog:     Catalog,
}

impl<F, X> IndexEngine<F, X>
where
   F: FileSystem,
   X: Extractor + 'static,
{
   pub fn new(file_system: F, extractor: X, catalog: Catalog) -> Self {
      Self { file_system, extractor: Arc::new(extractor), catalog }
   }

   pub fn catalog(&self) -> &Catalog {
      &self.catalog
   }

   /// Indexes every regular file under `root`. Idempotent and restartable:
   /// re-running on an unchanged tree skips everything.
   pub async fn index_tree(
      &self,
      root: &Path,
      options: &IndexOptions,
      callback: &mut dyn ScanProgressCallback,
   ) -> Result<IndexSummary> {
      if !root.is_dir() {
         return Err(Error::InvalidRoot(root.to_path_buf()));
      }
      let root = Arc::new(root.canonicalize().unwrap_or_else(|_| root.to_path_buf()));

      let files = self.file_system.get_files(&root);
      let total = files.len();
      let workers = options.workers.max(1);
      let force = options.force_reindex;

      tracing::info!("indexing {total} files under {} with {workers} workers", root.display());

      let mut summary = IndexSummary::default();
      let mut results = stream::iter(files.into_iter().map(|path| {
         let catalog = self.catalog.clone();
         let extractor = Arc::clone(&self.extractor);
         let root = Arc::clone(&root);
         tokio::task::spawn_blocking(move || {
            let outcome = index_one(&catalog, extractor.as_ref(), &root, &path, force);
            (path, outcome)
         })
      }))
      .buffer_unordered(workers);

      while let Some(joined) = results.next().await {
         let (path, outcome) = joined?;
         match outcome {
            FileOutcome::Skipped => summary.skipped += 1,
            FileOutcome::Indexed => summary.processed += 1,
            FileOutcome::Failed => summary.failed += 1,
         }

         let done = summary.processed + summary.skipped + summary.failed;
         if done % PROGRESS_INTERVAL == 0 || done == total {
            callback.progress(ScanProgress {
               processed:    summary.processed,
               skipped:      summary.skipped,
               failed:       summary.failed,
               total,
               current_file: Some(path.to_string_lossy().replace('\\', "/")),
            });
         }
      }

      tracing::info!(
         "indexing completed: {} processed, {} skipped, {} failed",
         summary.processed,
         summary.skipped,
         summary.failed
      );

      Ok(summary)
   }
}

/// Runs the full per-file pipeline. Every failure is absorbed here and
/// reported through the returned outcome; nothing aborts the tree walk.
fn index_one(
   catalog: &Catalog,
   extractor: &dyn Extractor,
   root: &Path,
   path: &Path,
   force: bool,
) -> FileOutcome {
   let metadata = match std::fs::metadata(path) {
      Ok(m) => m,
      Err(e) => {
         tracing::warn!("stat failed for {}: {e}", path.display());
         return FileOutcome::Failed;
      },
   };

   let mut conn = match catalog.connect() {
      Ok(c) => c,
      Err(e) => {
         tracing::warn!("catalog connection failed for {}: {e}", path.display());
         return FileOutcome::Failed;
      },
   };

   let stored = match conn.lookup_by_path(path) {
      Ok(stored) => stored,
      Err(e) => {
         tracing::warn!("catalog lookup failed for {}: {e}", path.display());
         return FileOutcome::Failed;
      },
   };

   if !force && !fingerprint::is_stale(&metadata, stored.as_ref()) {
      return FileOutcome::Skipped;
   }

   // A failed hash still produces a record (with a null fingerprint) so the
   // file stays visible in the catalog; the run counts it as failed.
   let (hash, hash_failed) = match fingerprint::fingerprint_file(path) {
      Ok(hash) => (Some(hash), false),
      Err(e) => {
         tracing::warn!("hashing failed for {}: {e}", path.display());
         (None, true)
      },
   };

   let extraction = extractor.extract(path);

   let record = NewFileRecord {
      path: path.to_path_buf(),
      relative_path: path
         .strip_prefix(root)
         .ok()
         .map(|p| p.to_string_lossy().into_owned()),
      size_bytes: metadata.len(),
      mtime: fingerprint::mtime_secs(&metadata),
      fingerprint: hash,
      title: extraction.title,
      authors: extraction.authors,
      needs_deep_extraction: extraction.needs_deep_extraction,
   };

   if let Err(e) = conn.upsert_file(&record, &extraction.text_blocks) {
      tracing::warn!("catalog upsert failed for {}: {e}", path.display());
      return FileOutcome::Failed;
   }

   if hash_failed { FileOutcome::Failed } else { FileOutcome::Indexed }
}

#[cfg(test)]
mod tests {
   use tempfile::TempDir;

   use super::*;
   use crate::{extract::NullExtractor, file::LocalFileSystem};

   fn engine(catalog: Catalog) -> IndexEngine<LocalFileSystem, NullExtractor> {
      IndexEngine::new(LocalFileSystem::new(), NullExtractor, catalog)
   }

   const OPTIONS: IndexOptions = IndexOptions { workers: 2, force_reindex: false };

   #[tokio::test]
   async fn missing_root_is_an_error() {
      let dir = TempDir::new().unwrap();
      let catalog = Catalog::open(dir.path().join("index.db")).unwrap();

      let result = engine(catalog)
         .index_tree(Path::new("/no/such/root"), &OPTIONS, &mut ())
         .await;
      assert!(matches!(result, Err(Error::InvalidRoot(_))));
   }

   #[tokio::test]
   async fn progress_reaches_total() {
      let dir = TempDir::new().unwrap();
      let catalog = Catalog::open(dir.path().join("index.db")).unwrap();
      let root = dir.path().join("books");
      std::fs::create_dir(&root).unwrap();
      for i in 0..5 {
         std::fs::write(root.join(format!("f{i}.txt")), format!("contents {i}")).unwrap();
      }

      let mut last = None;
      let mut callback = |progress: ScanProgress| last = Some(progress);
      let summary = engine(catalog)
         .index_tree(&root, &OPTIONS, &mut callback)
         .await
         .unwrap();

      assert_eq!(summary.processed, 5);
      let last = last.expect("final progress snapshot");
      assert_eq!(last.total, 5);
      assert_eq!(last.processed + last.skipped + last.failed, 5);
   }

   #[tokio::test]
   async fn force_reindex_reprocesses_fresh_files() {
      let dir = TempDir::new().unwrap();
      let catalog = Catalog::open(dir.path().join("index.db")).unwrap();
      let root = dir.path().join("books");
      std::fs::create_dir(&root).unwrap();
      std::fs::write(root.join("a.txt"), b"stable contents").unwrap();

      let engine = engine(catalog);
      engine.index_tree(&root, &OPTIONS, &mut ()).await.unwrap();

      let second = engine.index_tree(&root, &OPTIONS, &mut ()).await.unwrap();
      assert_eq!(second, IndexSummary { processed: 0, skipped: 1, failed: 0 });

      let forced = IndexOptions { force_reindex: true, ..OPTIONS };
      let third = engine.index_tree(&root, &forced, &mut ()).await.unwrap();
      assert_eq!(third, IndexSummary { processed: 1, skipped: 0, failed: 0 });
   }
}
