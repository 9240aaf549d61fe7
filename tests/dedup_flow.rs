mod support;

use bookdex::{
   dedup::{self, Resolution},
   extract::NullExtractor,
   file::LocalFileSystem,
   index::{IndexEngine, IndexOptions},
};
use support::{make_root, open_catalog, write_file};
use tempfile::TempDir;

const OPTIONS: IndexOptions = IndexOptions { workers: 4, force_reindex: false };

#[tokio::test]
async fn root_is_never_a_duplicate_of_itself() {
   let base = TempDir::new().expect("temp dir");
   let root = make_root(&base, "library");
   write_file(&root, "book.txt", b"shared contents");
   let catalog = open_catalog(&base);
   let engine = IndexEngine::new(LocalFileSystem::new(), NullExtractor, catalog.clone());

   engine.index_tree(&root, &OPTIONS, &mut ()).await.expect("index");

   let conn = catalog.connect().expect("connect");
   let locals = conn.list_under_root(&root).expect("list");
   assert_eq!(locals.len(), 1);

   // Querying a root as its own reference collection must report nothing.
   let matches = dedup::resolve_cross_collection(&conn, &locals, &root).expect("resolve");
   assert!(matches.is_empty());
}

#[tokio::test]
async fn cross_collection_resolution_keep_local() {
   let base = TempDir::new().expect("temp dir");
   let local_root = make_root(&base, "incoming");
   let library_root = make_root(&base, "library");

   write_file(&local_root, "new scan.txt", b"the same book");
   let library_copy = write_file(&library_root, "archived.txt", b"the same book");
   write_file(&library_root, "other.txt", b"different book");

   let catalog = open_catalog(&base);
   let engine = IndexEngine::new(LocalFileSystem::new(), NullExtractor, catalog.clone());
   engine.index_tree(&local_root, &OPTIONS, &mut ()).await.expect("index local");
   engine.index_tree(&library_root, &OPTIONS, &mut ()).await.expect("index library");

   let conn = catalog.connect().expect("connect");
   let locals = conn.list_under_root(&local_root).expect("list");
   let matches =
      dedup::resolve_cross_collection(&conn, &locals, &library_root).expect("resolve");

   assert_eq!(matches.len(), 1);
   assert_eq!(matches[0].remote_matches.len(), 1);
   assert_eq!(matches[0].remote_matches[0].path, library_copy);

   let outcome = dedup::apply_resolution(&Resolution::KeepLocalDeleteRemote {
      remotes: vec![library_copy.clone()],
   });
   assert_eq!(outcome.deleted, [library_copy.clone()]);
   assert!(outcome.errors.is_empty());
   assert!(!library_copy.exists());

   // The prior run already removed the remote; applying again still
   // succeeds with nothing to do.
   let again = dedup::apply_resolution(&Resolution::KeepLocalDeleteRemote {
      remotes: vec![library_copy.clone()],
   });
   assert!(again.errors.is_empty());
   assert!(again.deleted.is_empty());
}

#[tokio::test]
async fn cross_collection_resolution_keep_library() {
   let base = TempDir::new().expect("temp dir");
   let local_root = make_root(&base, "incoming");
   let library_root = make_root(&base, "library");

   let local_copy = write_file(&local_root, "download.txt", b"kept in the library");
   write_file(&library_root, "canonical.txt", b"kept in the library");

   let catalog = open_catalog(&base);
   let engine = IndexEngine::new(LocalFileSystem::new(), NullExtractor, catalog.clone());
   engine.index_tree(&local_root, &OPTIONS, &mut ()).await.expect("index local");
   engine.index_tree(&library_root, &OPTIONS, &mut ()).await.expect("index library");

   let conn = catalog.connect().expect("connect");
   let locals = conn.list_under_root(&local_root).expect("list");
   let matches =
      dedup::resolve_cross_collection(&conn, &locals, &library_root).expect("resolve");
   assert_eq!(matches.len(), 1);

   let outcome = dedup::apply_resolution(&Resolution::KeepRemoteDeleteLocal {
      local: local_copy.clone(),
   });
   assert_eq!(outcome.deleted, [local_copy.clone()]);
   assert!(!local_copy.exists());
}

#[tokio::test]
async fn prune_after_resolution_drops_stale_records() {
   let base = TempDir::new().expect("temp dir");
   let root = make_root(&base, "books");
   let doomed = write_file(&root, "doomed.txt", b"dup");
   write_file(&root, "survivor with long name.txt", b"dup");

   let catalog = open_catalog(&base);
   let engine = IndexEngine::new(LocalFileSystem::new(), NullExtractor, catalog.clone());
   engine.index_tree(&root, &OPTIONS, &mut ()).await.expect("index");

   let outcome =
      dedup::apply_resolution(&Resolution::DeleteMembers { paths: vec![doomed.clone()] });
   assert!(outcome.errors.is_empty());

   let mut conn = catalog.connect().expect("connect");
   // Deletion never auto-prunes; the stale record is still there until
   // prune is run explicitly.
   assert_eq!(conn.count_files().expect("count"), 2);
   assert_eq!(conn.prune_missing(&root).expect("prune"), 1);
   assert_eq!(conn.count_files().expect("count"), 1);
   assert!(conn.lookup_by_path(&doomed).expect("lookup").is_none());
}
