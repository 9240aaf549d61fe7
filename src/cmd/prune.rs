//! Prune command: drop catalog records whose files no longer exist.

use std::path::PathBuf;

use console::style;

use crate::{Result, catalog::Catalog, config::Config};

pub fn execute(config: &Config, path: PathBuf) -> Result<()> {
   let root = path.canonicalize().unwrap_or(path);

   let catalog = Catalog::open(config.catalog_path())?;
   let mut conn = catalog.connect()?;
   let removed = conn.prune_missing(&root)?;

   if removed == 0 {
      println!("{}", style("Nothing to prune").dim());
   } else {
      println!("{} {removed} stale records removed", style("Pruned.").bold());
   }

   Ok(())
}
