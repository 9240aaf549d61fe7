//! Status command: catalog statistics.

use console::style;

use crate::{Result, catalog::Catalog, config::Config, util::format_size};

pub fn execute(config: &Config, json: bool) -> Result<()> {
   let catalog_path = config.catalog_path();
   let catalog = Catalog::open(&catalog_path)?;
   let conn = catalog.connect()?;

   let files = conn.count_files()?;
   let duplicate_groups = conn.duplicate_fingerprint_count()?;
   let size_bytes = std::fs::metadata(&catalog_path).map(|m| m.len()).unwrap_or(0);

   if json {
      let report = serde_json::json!({
         "catalog": catalog_path,
         "files": files,
         "duplicate_groups": duplicate_groups,
         "size_bytes": size_bytes,
      });
      println!("{}", serde_json::to_string_pretty(&report)?);
      return Ok(());
   }

   println!("{}", style("Catalog status").bold());
   println!("  path:             {}", catalog_path.display());
   println!("  files:            {files}");
   println!("  duplicate groups: {duplicate_groups}");
   println!("  size:             {}", format_size(size_bytes));

   Ok(())
}
