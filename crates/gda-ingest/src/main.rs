//! GDA Ingest - annotation acquisition tool

use anyhow::{Context, Result};
use gda_common::logging::{init_logging, LogConfig};
use gda_ingest::cache::{Memoizer, ResultStore};
use gda_ingest::config::IngestConfig;
use gda_ingest::mondo::MondoSource;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gda-ingest")]
#[command(author, version, about = "Gene-disease annotation acquisition tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Result cache directory (default: ~/.annotations)
    #[arg(long, global = true, env = "GDA_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rare diseases from the MONDO ontology, with their top-level category
    Mondo {
        /// Write the table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore cached results and download again
        #[arg(long)]
        refresh: bool,

        /// Only parse the first N terms
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Inspect or empty the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached results, newest first
    List,
    /// Delete every cached result
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // --verbose wins over LOG_LEVEL
    let log_config = LogConfig::builder()
        .log_file_prefix("gda-ingest")
        .build()
        .merge_env()?
        .with_verbose(cli.verbose);

    init_logging(&log_config)?;

    let mut config = IngestConfig::from_env()?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }

    match cli.command {
        Command::Mondo {
            output,
            refresh,
            limit,
        } => {
            if let Some(limit) = limit {
                config.parse_limit = Some(limit);
            }
            let freshness = if refresh {
                Duration::ZERO
            } else {
                config.freshness()
            };
            let memoizer = Memoizer::new(open_store(&config)?).with_freshness(freshness);

            let table = MondoSource::new(&config)?
                .rare_disease_table(&memoizer)
                .await?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    table.write_tsv(BufWriter::new(file))?;
                    info!(path = %path.display(), rows = table.len(), "Wrote MONDO table");
                },
                None => table.write_tsv(io::stdout().lock())?,
            }
        },
        Command::Cache { action } => {
            let store = open_store(&config)?;
            match action {
                CacheAction::List => {
                    let now = chrono::Utc::now();
                    let mut out = io::stdout().lock();
                    for entry in store.list()? {
                        let fresh = if entry.is_fresh(config.freshness(), now) {
                            "fresh"
                        } else {
                            "stale"
                        };
                        writeln!(
                            out,
                            "{}\t{}\t{}\t{}\t{}\t{}",
                            entry.operation,
                            entry.key,
                            entry.format,
                            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                            entry.size_bytes,
                            fresh
                        )?;
                    }
                },
                CacheAction::Clear => {
                    let removed = store.clear()?;
                    info!(removed, root = %store.root().display(), "Cleared cache");
                },
            }
        },
    }

    Ok(())
}

fn open_store(config: &IngestConfig) -> Result<ResultStore> {
    ResultStore::open(&config.cache_dir)
        .with_context(|| format!("Failed to open cache at {}", config.cache_dir.display()))
}
