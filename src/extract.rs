//! Extraction adapter boundary.
//!
//! Format-specific extraction (PDF, DOCX, EPUB, ...) lives outside this
//! crate; the indexer consumes it through the [`Extractor`] trait. The
//! built-in [`PlainTextExtractor`] covers the raw-text fallback path:
//! paragraphs split on blank lines, capped in count, with a usability
//! threshold deciding whether the deeper extraction path is still needed.

use std::path::Path;

use crate::catalog::MAX_TEXT_BLOCKS_PER_FILE;

/// Minimum total extracted characters before a file counts as having
/// usable text. Below this the record is flagged for deeper extraction.
pub const MIN_USABLE_TEXT_CHARS: usize = 200;

/// Metadata and text extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
   pub title:       Option<String>,
   pub authors:     Option<String>,
   pub text_blocks: Vec<String>,
   pub needs_deep_extraction: bool,
}

/// Boundary to the external extraction subsystem.
///
/// Implementations must not fail: unsupported or unreadable formats yield
/// `Extraction::default()` and indexing carries on with empty metadata.
pub trait Extractor: Send + Sync {
   fn extract(&self, path: &Path) -> Extraction;
}

/// Extractor that yields no metadata at all; for fingerprint-only catalogs
/// and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExtractor;

impl Extractor for NullExtractor {
   fn extract(&self, _path: &Path) -> Extraction {
      Extraction::default()
   }
}

/// Raw-text fallback extractor: decodes the file lossily as UTF-8 and
/// splits it into blank-line-separated paragraphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
   pub const fn new() -> Self {
      Self
   }
}

impl Extractor for PlainTextExtractor {
   fn extract(&self, path: &Path) -> Extraction {
      let Ok(bytes) = std::fs::read(path) else {
         return Extraction::default();
      };

      let text = String::from_utf8_lossy(&bytes);
      let text_blocks: Vec<String> = text
         .split("\n\n")
         .map(str::trim)
         .filter(|block| !block.is_empty())
         .take(MAX_TEXT_BLOCKS_PER_FILE)
         .map(ToString::to_string)
         .collect();

      let total_chars: usize = text_blocks.iter().map(|b| b.chars().count()).sum();

      Extraction {
         title: None,
         authors: None,
         needs_deep_extraction: total_chars < MIN_USABLE_TEXT_CHARS,
         text_blocks,
      }
   }
}
