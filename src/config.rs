//! Configuration management for catalog location and performance tuning.

use std::{
   fs,
   path::PathBuf,
   sync::OnceLock,
};

use directories::BaseDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hard cap on the worker-pool size, whatever the config says.
pub const MAX_WORKERS_CAP: usize = 32;

/// Ceiling for the automatic worker count. The workload is I/O- and
/// hashing-bound, so piling on cores past this buys nothing.
pub const AUTO_WORKERS_CAP: usize = 8;

/// Application configuration loaded from config file and environment
/// variables. Loaded once by the caller and passed into engines explicitly;
/// there is no process-global config state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   /// Worker-pool size; 0 means derive from CPU count.
   pub workers:      usize,
   pub max_workers:  usize,
   /// Catalog database file; defaults to `<base>/data/index.db`.
   pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         workers:      0,
         max_workers:  MAX_WORKERS_CAP,
         catalog_path: None,
      }
   }
}

impl Config {
   /// Loads configuration: defaults, then the global config file, then
   /// `BOOKDEX_`-prefixed environment variables.
   pub fn load() -> Self {
      let config_path = ensure_global_config();

      Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(config_path))
         .merge(Env::prefixed("BOOKDEX_").lowercase(true))
         .extract()
         .inspect_err(|e| tracing::warn!("failed to parse config: {e}"))
         .unwrap_or_default()
   }

   fn create_default_config(path: &std::path::Path) {
      if let Some(parent) = path.parent() {
         let _ = fs::create_dir_all(parent);
      }
      if let Ok(toml) = toml::to_string_pretty(&Self::default()) {
         let _ = fs::write(path, toml);
      }
   }

   /// Effective worker count: an explicit override wins, then the config
   /// value, then `min(8, cpus)`; always clamped to `[1, max_workers]`.
   pub fn effective_workers(&self, override_workers: Option<usize>) -> usize {
      let requested = override_workers.unwrap_or(self.workers);
      let n = if requested == 0 {
         num_cpus::get().min(AUTO_WORKERS_CAP)
      } else {
         requested
      };
      n.clamp(1, self.max_workers.min(MAX_WORKERS_CAP).max(1))
   }

   /// Location of the catalog database file.
   pub fn catalog_path(&self) -> PathBuf {
      self
         .catalog_path
         .clone()
         .unwrap_or_else(|| data_dir().join("index.db"))
   }

   /// Rejects values that exceed the hard caps.
   pub fn validate(&self) -> Result<(), ConfigError> {
      if self.max_workers > MAX_WORKERS_CAP {
         return Err(ConfigError::Invalid(format!(
            "max_workers {} exceeds hard cap {MAX_WORKERS_CAP}",
            self.max_workers
         )));
      }
      if self.workers > self.max_workers {
         return Err(ConfigError::Invalid(format!(
            "workers {} exceeds max_workers {}",
            self.workers, self.max_workers
         )));
      }
      Ok(())
   }
}

/// Returns the base directory for bookdex data and configuration
pub fn base_dir() -> &'static PathBuf {
   static ONCE: OnceLock<PathBuf> = OnceLock::new();
   ONCE.get_or_init(|| resolve_base_dir(".bookdex"))
}

fn ensure_global_config() -> PathBuf {
   let config_path = config_file_path();
   if !config_path.exists() {
      Config::create_default_config(config_path);
   }
   config_path.to_path_buf()
}

fn resolve_base_dir(dir_name: &str) -> PathBuf {
   BaseDirs::new()
      .map(|d| d.home_dir().join(dir_name))
      .or_else(|| {
         std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(dir_name))
      })
      .unwrap_or_else(|| {
         std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(dir_name)
      })
}

macro_rules! define_paths {
   ($($fn_name:ident: $path:literal),* $(,)?) => {
      $(
         pub fn $fn_name() -> &'static PathBuf {
            static ONCE: OnceLock<PathBuf> = OnceLock::new();
            ONCE.get_or_init(|| base_dir().join($path))
         }
      )*
   };
}

define_paths! {
   config_file_path: "config.toml",
   data_dir: "data",
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn explicit_override_wins() {
      let config = Config::default();
      assert_eq!(config.effective_workers(Some(3)), 3);
   }

   #[test]
   fn auto_workers_bounded() {
      let config = Config::default();
      let n = config.effective_workers(None);
      assert!(n >= 1);
      assert!(n <= AUTO_WORKERS_CAP);
   }

   #[test]
   fn workers_clamped_to_cap() {
      let config = Config { max_workers: 4, ..Config::default() };
      assert_eq!(config.effective_workers(Some(100)), 4);
      assert_eq!(config.effective_workers(Some(0)).min(4), config.effective_workers(Some(0)));
   }

   #[test]
   fn catalog_path_override() {
      let config = Config { catalog_path: Some(PathBuf::from("/tmp/x.db")), ..Config::default() };
      assert_eq!(config.catalog_path(), PathBuf::from("/tmp/x.db"));
   }

   #[test]
   fn validate_rejects_excessive_workers() {
      assert!(Config::default().validate().is_ok());

      let over_cap = Config { max_workers: MAX_WORKERS_CAP + 1, ..Config::default() };
      assert!(over_cap.validate().is_err());

      let inconsistent = Config { workers: 10, max_workers: 4, ..Config::default() };
      assert!(inconsistent.validate().is_err());
   }
}
