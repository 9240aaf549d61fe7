//! Dupes command: list (and optionally resolve) duplicate groups inside a
//! root.

use std::path::PathBuf;

use console::style;

use crate::{
   Result,
   catalog::Catalog,
   config::Config,
   dedup::{self, DuplicateGroup, Resolution, Scope},
   util::format_size,
};

pub fn execute(
   config: &Config,
   path: Option<PathBuf>,
   by_size: bool,
   delete: bool,
   json: bool,
) -> Result<()> {
   let root = match path {
      Some(p) => p,
      None => std::env::current_dir()?,
   };
   let root = root.canonicalize().unwrap_or(root);

   let catalog = Catalog::open(config.catalog_path())?;
   let conn = catalog.connect()?;
   let groups = dedup::group_duplicates(&conn, &Scope::UnderRoot(root))?;

   if json {
      println!("{}", serde_json::to_string_pretty(&groups)?);
      return Ok(());
   }

   if groups.is_empty() {
      println!("{}", style("No duplicate groups found").dim());
      return Ok(());
   }

   let mut deleted = 0usize;
   let mut errors = Vec::new();

   for (i, group) in groups.iter().enumerate() {
      let keep = pre_select(group, by_size);
      println!(
         "{} {} members, {}",
         style(format!("Group {}:", i + 1)).bold(),
         group.members.len(),
         style(&group.fingerprint.to_string()[..12]).dim()
      );
      for member in &group.members {
         let marker = if Some(&member.path) == keep.as_ref() { "keep  " } else { "extra " };
         println!(
            "  {} {} ({})",
            style(marker).cyan(),
            member.path.display(),
            format_size(member.size_bytes)
         );
      }

      if delete {
         let extras: Vec<PathBuf> = group
            .members
            .iter()
            .map(|m| m.path.clone())
            .filter(|p| Some(p) != keep.as_ref())
            .collect();
         let outcome = dedup::apply_resolution(&Resolution::DeleteMembers { paths: extras });
         deleted += outcome.deleted.len();
         errors.extend(outcome.errors);
      }
   }

   if delete {
      println!("{} {deleted} files deleted", style("Done.").bold());
      for error in &errors {
         println!("  {} {error}", style("error:").red());
      }
   }

   Ok(())
}

fn pre_select(group: &DuplicateGroup, by_size: bool) -> Option<PathBuf> {
   let keep = if by_size {
      dedup::keep_largest(group)
   } else {
      dedup::keep_longest_name(group)
   };
   keep.map(|record| record.path.clone())
}
