//! Index command: walk a root and bring the catalog up to date.

use std::path::PathBuf;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
   Result,
   catalog::Catalog,
   config::Config,
   extract::PlainTextExtractor,
   file::LocalFileSystem,
   index::{IndexEngine, IndexOptions},
};

pub async fn execute(
   config: &Config,
   path: Option<PathBuf>,
   workers: Option<usize>,
   rebuild: bool,
) -> Result<()> {
   let root = match path {
      Some(p) => p,
      None => std::env::current_dir()?,
   };

   let catalog = Catalog::open(config.catalog_path())?;
   let engine = IndexEngine::new(LocalFileSystem::new(), PlainTextExtractor::new(), catalog);
   let options = IndexOptions {
      workers:       config.effective_workers(workers),
      force_reindex: rebuild,
   };

   let mut bar = ProgressBar::new(0);
   if let Ok(bar_style) =
      ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
   {
      bar.set_style(bar_style);
   }

   let summary = engine.index_tree(&root, &options, &mut bar).await?;
   bar.finish_and_clear();

   println!(
      "{} {} processed, {} skipped, {} failed",
      style("Indexed.").bold(),
      summary.processed,
      summary.skipped,
      summary.failed
   );
   if summary.failed > 0 {
      println!(
         "{}",
         style("Some files failed; re-run to retry, or see warnings above.").yellow()
      );
   }

   Ok(())
}
