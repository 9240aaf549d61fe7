//! Persistent catalog of indexed files and their text snippets.
//!
//! The catalog is a single SQLite file with two tables: `files` (one row per
//! indexed path) and `texts` (bounded, ordered snippets per file). WAL mode
//! keeps readers unblocked while a long scan writes. [`Catalog`] itself is a
//! cheap clonable handle on the database path; every concurrent unit of work
//! opens its own scoped connection through [`Catalog::connect`], so workers
//! never share a handle.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use crate::{error::CatalogError, fingerprint::FileHash};

const SCHEMA_VERSION: i32 = 1;

/// Maximum number of text blocks retained per file.
pub const MAX_TEXT_BLOCKS_PER_FILE: usize = 10;

/// Maximum characters stored per text block, applied at write time. Caps
/// catalog growth independent of source document size.
pub const MAX_TEXT_BLOCK_CHARS: usize = 5000;

/// One catalog row, uniquely keyed by absolute path.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
   pub id:            i64,
   pub path:          PathBuf,
   pub relative_path: Option<String>,
   pub size_bytes:    u64,
   pub mtime:         f64,
   pub fingerprint:   Option<FileHash>,
   pub title:         Option<String>,
   pub authors:       Option<String>,
   /// True when the extracted text volume was below the usability
   /// threshold, signalling the deeper (external) extraction path.
   pub needs_deep_extraction: bool,
   /// RFC 3339 timestamp of the last successful index pass.
   pub indexed_at:    String,
}

/// Ordered text snippet belonging to one [`FileRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
   pub block_index: usize,
   pub text:        String,
}

/// Data for one file produced by an index pass, before it has a row id.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
   pub path:          PathBuf,
   pub relative_path: Option<String>,
   pub size_bytes:    u64,
   pub mtime:         f64,
   pub fingerprint:   Option<FileHash>,
   pub title:         Option<String>,
   pub authors:       Option<String>,
   pub needs_deep_extraction: bool,
}

/// Handle to the catalog database file.
///
/// Opening validates the schema once; afterwards the handle is just a path
/// and is cheap to clone into worker tasks.
#[derive(Debug, Clone)]
pub struct Catalog {
   path: PathBuf,
}

impl Catalog {
   /// Opens (creating if necessary) the catalog at `path` and validates the
   /// schema version. Schema creation is idempotent; a version written by
   /// an incompatible build is a hard error, never a silent migration.
   pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
      let path = path.as_ref().to_path_buf();

      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
      {
         std::fs::create_dir_all(parent).map_err(|reason| CatalogError::CreateDir {
            path:   parent.to_path_buf(),
            reason,
         })?;
      }

      let conn = open_connection(&path)?;
      init_schema(&conn)?;

      Ok(Self { path })
   }

   /// Opens a scoped connection for one unit of work. Each worker task
   /// calls this once and drops the connection when its file is done.
   pub fn connect(&self) -> Result<CatalogConn, CatalogError> {
      let conn = open_connection(&self.path)?;
      Ok(CatalogConn { conn })
   }

   pub fn path(&self) -> &Path {
      &self.path
   }
}

fn open_connection(path: &Path) -> Result<Connection, CatalogError> {
   let conn = Connection::open(path).map_err(|reason| CatalogError::Open {
      path: path.to_path_buf(),
      reason,
   })?;

   // WAL keeps concurrent readers off the writer's back; busy_timeout
   // absorbs short write contention between worker connections.
   conn.execute_batch(
      "
      PRAGMA journal_mode = WAL;
      PRAGMA busy_timeout = 5000;
      PRAGMA synchronous = NORMAL;
      PRAGMA foreign_keys = ON;
      ",
   )?;

   Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), CatalogError> {
   let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

   if version != 0 && version != SCHEMA_VERSION {
      return Err(CatalogError::SchemaVersion { found: version, expected: SCHEMA_VERSION });
   }

   if version == 0 {
      conn.execute_batch(&format!(
         "
         CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY,
            path TEXT UNIQUE NOT NULL,
            relpath TEXT,
            size INTEGER NOT NULL,
            mtime REAL NOT NULL,
            sha256 TEXT,
            title TEXT,
            authors TEXT,
            needs_deep_extraction INTEGER NOT NULL DEFAULT 0,
            indexed_at TEXT NOT NULL
         );

         CREATE TABLE IF NOT EXISTS texts (
            file_id INTEGER NOT NULL REFERENCES files(id),
            block_index INTEGER NOT NULL,
            text TEXT NOT NULL
         );

         CREATE INDEX IF NOT EXISTS idx_files_sha ON files(sha256);
         CREATE INDEX IF NOT EXISTS idx_files_mtime ON files(mtime);
         CREATE INDEX IF NOT EXISTS idx_texts_file ON texts(file_id);

         PRAGMA user_version = {SCHEMA_VERSION};
         "
      ))?;
   }

   Ok(())
}

/// A scoped connection to the catalog, owned by one unit of work.
pub struct CatalogConn {
   conn: Connection,
}

impl CatalogConn {
   /// Inserts or overwrites the record matched by `record.path` and replaces
   /// that file's text blocks wholesale (delete-all, insert-all) in the same
   /// transaction, so blocks never mix two file versions. Returns the row id.
   pub fn upsert_file(
      &mut self,
      record: &NewFileRecord,
      blocks: &[String],
   ) -> Result<i64, CatalogError> {
      let tx = self.conn.transaction()?;
      let path_text = record.path.to_string_lossy().into_owned();
      let indexed_at = now_rfc3339();

      let existing: Option<i64> = tx
         .query_row("SELECT id FROM files WHERE path = ?1", params![path_text], |row| row.get(0))
         .optional()?;

      let file_id = if let Some(id) = existing {
         tx.execute(
            "UPDATE files SET relpath = ?1, size = ?2, mtime = ?3, sha256 = ?4, title = ?5,
                              authors = ?6, needs_deep_extraction = ?7, indexed_at = ?8
             WHERE id = ?9",
            params![
               record.relative_path,
               record.size_bytes as i64,
               record.mtime,
               record.fingerprint.map(|h| h.to_string()),
               record.title,
               record.authors,
               record.needs_deep_extraction,
               indexed_at,
               id,
            ],
         )?;
         tx.execute("DELETE FROM texts WHERE file_id = ?1", params![id])?;
         id
      } else {
         tx.execute(
            "INSERT INTO files (path, relpath, size, mtime, sha256, title, authors,
                                needs_deep_extraction, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
               path_text,
               record.relative_path,
               record.size_bytes as i64,
               record.mtime,
               record.fingerprint.map(|h| h.to_string()),
               record.title,
               record.authors,
               record.needs_deep_extraction,
               indexed_at,
            ],
         )?;
         tx.last_insert_rowid()
      };

      for (block_index, block) in blocks.iter().take(MAX_TEXT_BLOCKS_PER_FILE).enumerate() {
         let text = cap_chars(block, MAX_TEXT_BLOCK_CHARS);
         if text.is_empty() {
            continue;
         }
         tx.execute(
            "INSERT INTO texts (file_id, block_index, text) VALUES (?1, ?2, ?3)",
            params![file_id, block_index as i64, text],
         )?;
      }

      tx.commit()?;
      Ok(file_id)
   }

   /// Point lookup by absolute path; `None` means never indexed.
   pub fn lookup_by_path(&self, path: &Path) -> Result<Option<FileRecord>, CatalogError> {
      let record = self
         .conn
         .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM files WHERE path = ?1"),
            params![path.to_string_lossy().into_owned()],
            row_to_record,
         )
         .optional()?;
      Ok(record)
   }

   /// Every record sharing `fingerprint`, across the whole catalog.
   pub fn find_by_fingerprint(
      &self,
      fingerprint: &FileHash,
   ) -> Result<Vec<FileRecord>, CatalogError> {
      let mut stmt = self.conn.prepare(&format!(
         "SELECT {RECORD_COLUMNS} FROM files WHERE sha256 = ?1 ORDER BY path"
      ))?;
      let records = stmt
         .query_map(params![fingerprint.to_string()], row_to_record)?
         .collect::<Result<Vec<_>, _>>()?;
      Ok(records)
   }

   /// All records whose path lies under `root`. Prefix matching is
   /// exact-segment: `/data/foo` never matches `/data/foobar`.
   pub fn list_under_root(&self, root: &Path) -> Result<Vec<FileRecord>, CatalogError> {
      let mut stmt = self.conn.prepare(&format!(
         "SELECT {RECORD_COLUMNS} FROM files WHERE path LIKE ?1 ESCAPE '\\' ORDER BY path"
      ))?;
      let pattern = format!("{}%", escape_like(&root.to_string_lossy()));
      let records = stmt
         .query_map(params![pattern], row_to_record)?
         .collect::<Result<Vec<_>, _>>()?;

      // LIKE narrows the scan; starts_with enforces segment boundaries.
      Ok(records.into_iter().filter(|r| r.path.starts_with(root)).collect())
   }

   /// Every record in the catalog, ordered by path.
   pub fn all_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
      let mut stmt = self
         .conn
         .prepare(&format!("SELECT {RECORD_COLUMNS} FROM files ORDER BY path"))?;
      let records = stmt
         .query_map([], row_to_record)?
         .collect::<Result<Vec<_>, _>>()?;
      Ok(records)
   }

   /// Text blocks for a file, in reading order.
   pub fn text_blocks(&self, file_id: i64) -> Result<Vec<TextBlock>, CatalogError> {
      let mut stmt = self.conn.prepare(
         "SELECT block_index, text FROM texts WHERE file_id = ?1 ORDER BY block_index",
      )?;
      let blocks = stmt
         .query_map(params![file_id], |row| {
            Ok(TextBlock { block_index: row.get::<_, i64>(0)? as usize, text: row.get(1)? })
         })?
         .collect::<Result<Vec<_>, _>>()?;
      Ok(blocks)
   }

   pub fn count_files(&self) -> Result<usize, CatalogError> {
      let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
      Ok(count as usize)
   }

   /// Number of fingerprints shared by two or more records.
   pub fn duplicate_fingerprint_count(&self) -> Result<usize, CatalogError> {
      let count: i64 = self.conn.query_row(
         "SELECT COUNT(*) FROM (
             SELECT sha256 FROM files WHERE sha256 IS NOT NULL
             GROUP BY sha256 HAVING COUNT(*) > 1
          )",
         [],
         |row| row.get(0),
      )?;
      Ok(count as usize)
   }

   /// Deletes records under `root` whose file no longer exists on disk.
   /// Never runs automatically; stale-but-present records are deliberate.
   /// Returns the number of removed records.
   pub fn prune_missing(&mut self, root: &Path) -> Result<usize, CatalogError> {
      let missing: Vec<i64> = self
         .list_under_root(root)?
         .into_iter()
         .filter(|record| !record.path.exists())
         .map(|record| record.id)
         .collect();

      let tx = self.conn.transaction()?;
      for id in &missing {
         tx.execute("DELETE FROM texts WHERE file_id = ?1", params![id])?;
         tx.execute("DELETE FROM files WHERE id = ?1", params![id])?;
      }
      tx.commit()?;

      Ok(missing.len())
   }
}

const RECORD_COLUMNS: &str =
   "id, path, relpath, size, mtime, sha256, title, authors, needs_deep_extraction, indexed_at";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
   let path: String = row.get(1)?;
   let sha: Option<String> = row.get(5)?;

   Ok(FileRecord {
      id: row.get(0)?,
      path: PathBuf::from(path),
      relative_path: row.get(2)?,
      size_bytes: row.get::<_, i64>(3)? as u64,
      mtime: row.get(4)?,
      fingerprint: sha.as_deref().and_then(FileHash::from_hex),
      title: row.get(6)?,
      authors: row.get(7)?,
      needs_deep_extraction: row.get(8)?,
      indexed_at: row.get(9)?,
   })
}

fn now_rfc3339() -> String {
   chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Escapes LIKE wildcards in a literal prefix.
fn escape_like(prefix: &str) -> String {
   let mut out = String::with_capacity(prefix.len());
   for c in prefix.chars() {
      if matches!(c, '%' | '_' | '\\') {
         out.push('\\');
      }
      out.push(c);
   }
   out
}

fn cap_chars(text: &str, max_chars: usize) -> String {
   text.chars().take(max_chars).collect()
}
