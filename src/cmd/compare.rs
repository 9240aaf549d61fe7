//! Compare command: find content shared between a local root and an
//! indexed reference library, and optionally resolve it.

use std::path::PathBuf;

use clap::ValueEnum;
use console::style;

use crate::{
   Result,
   catalog::Catalog,
   config::Config,
   dedup::{self, Resolution},
};

/// Which side of each cross-collection match to keep when applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApplyChoice {
   /// Keep the local copy, delete the library copies.
   KeepLocal,
   /// Keep the library copy, delete the local one.
   KeepLibrary,
}

pub fn execute(
   config: &Config,
   path: Option<PathBuf>,
   library: PathBuf,
   apply: Option<ApplyChoice>,
   json: bool,
) -> Result<()> {
   let root = match path {
      Some(p) => p,
      None => std::env::current_dir()?,
   };
   let root = root.canonicalize().unwrap_or(root);
   let library = library.canonicalize().unwrap_or(library);

   let catalog = Catalog::open(config.catalog_path())?;
   let conn = catalog.connect()?;

   let locals = conn.list_under_root(&root)?;
   let matches = dedup::resolve_cross_collection(&conn, &locals, &library)?;

   if json {
      println!("{}", serde_json::to_string_pretty(&matches)?);
      return Ok(());
   }

   if matches.is_empty() {
      println!("{}", style("No shared content with the library").dim());
      return Ok(());
   }

   for m in &matches {
      println!("{} {}", style("local  ").blue(), m.local.path.display());
      for remote in &m.remote_matches {
         println!("{} {}", style("library").red(), remote.path.display());
      }
   }

   let Some(choice) = apply else {
      return Ok(());
   };

   let mut deleted = 0usize;
   let mut errors = Vec::new();
   for m in &matches {
      let resolution = match choice {
         ApplyChoice::KeepLocal => Resolution::KeepLocalDeleteRemote {
            remotes: m.remote_matches.iter().map(|r| r.path.clone()).collect(),
         },
         ApplyChoice::KeepLibrary => {
            Resolution::KeepRemoteDeleteLocal { local: m.local.path.clone() }
         },
      };
      let outcome = dedup::apply_resolution(&resolution);
      deleted += outcome.deleted.len();
      errors.extend(outcome.errors);
   }

   println!("{} {deleted} files deleted", style("Done.").bold());
   for error in &errors {
      println!("  {} {error}", style("error:").red());
   }

   Ok(())
}
