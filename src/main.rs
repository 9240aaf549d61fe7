use std::path::PathBuf;

use bookdex::{Result, cmd, cmd::compare::ApplyChoice, config::Config};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the bookdex application
#[derive(Parser)]
#[command(name = "bookdex")]
#[command(about = "Content-addressed catalog and duplicate finder for document collections")]
#[command(version)]
struct Cli {
   #[command(subcommand)]
   command: Cmd,
}

/// Available subcommands for bookdex
#[derive(Subcommand)]
enum Cmd {
   #[command(about = "Index a directory tree into the catalog")]
   Index {
      #[arg(help = "Root directory to index (default: cwd)")]
      path: Option<PathBuf>,

      #[arg(short = 'w', long, env = "BOOKDEX_WORKERS", help = "Worker count (default: min(8, cpus))")]
      workers: Option<usize>,

      #[arg(long, help = "Re-index every file, ignoring staleness checks")]
      rebuild: bool,
   },

   #[command(about = "List duplicate groups inside a root")]
   Dupes {
      #[arg(help = "Root directory to inspect (default: cwd)")]
      path: Option<PathBuf>,

      #[arg(long, help = "Pre-select the largest member instead of the longest name")]
      by_size: bool,

      #[arg(long, help = "Delete every member except the pre-selected one")]
      delete: bool,

      #[arg(long, help = "JSON output")]
      json: bool,
   },

   #[command(about = "Compare a root against an indexed reference library")]
   Compare {
      #[arg(help = "Local root to compare (default: cwd)")]
      path: Option<PathBuf>,

      #[arg(short = 'l', long, help = "Reference library root (must already be indexed)")]
      library: PathBuf,

      #[arg(long, value_enum, help = "Resolve matches by keeping one side")]
      apply: Option<ApplyChoice>,

      #[arg(long, help = "JSON output")]
      json: bool,
   },

   #[command(about = "Show catalog statistics")]
   Status {
      #[arg(long, help = "JSON output")]
      json: bool,
   },

   #[command(about = "Remove catalog records whose files no longer exist under a root")]
   Prune {
      #[arg(help = "Root directory to prune")]
      path: PathBuf,
   },
}

#[tokio::main]
async fn main() {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
      .init();

   let cli = Cli::parse();
   if let Err(err) = run(cli).await {
      eprintln!("{err}");
      std::process::exit(err.exit_code());
   }
}

async fn run(cli: Cli) -> Result<()> {
   let config = Config::load();
   config.validate()?;

   match cli.command {
      Cmd::Index { path, workers, rebuild } => {
         cmd::index::execute(&config, path, workers, rebuild).await
      },
      Cmd::Dupes { path, by_size, delete, json } => {
         cmd::dupes::execute(&config, path, by_size, delete, json)
      },
      Cmd::Compare { path, library, apply, json } => {
         cmd::compare::execute(&config, path, library, apply, json)
      },
      Cmd::Status { json } => cmd::status::execute(&config, json),
      Cmd::Prune { path } => cmd::prune::execute(&config, path),
   }
}
