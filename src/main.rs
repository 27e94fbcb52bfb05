//! fscache - command-line front end
//!
//! Exercises the cache from the shell: store, retrieve, invalidate, and
//! purge entries under a configured cache root.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fscache::{CacheStore, Config, Lookup, SaveOutcome};

#[derive(Parser)]
#[command(
    name = "fscache",
    version,
    about = "Filesystem-backed key/value cache with dogpile avoidance"
)]
struct Cli {
    /// Cache root directory (overrides CACHE_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve the value stored under KEY
    Get {
        key: String,
        /// Print the raw stored bytes instead of JSON
        #[arg(long)]
        raw: bool,
    },
    /// Store VALUE under KEY
    Set {
        key: String,
        /// JSON text, or opaque bytes with --raw
        value: String,
        /// Store VALUE verbatim without JSON parsing
        #[arg(long)]
        raw: bool,
    },
    /// Delete the entry stored under KEY
    Invalidate { key: String },
    /// Remove expired entries and stale write markers
    Purge,
}

fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing subscriber with env filter.
    // Defaults to "info" level, can be overridden with RUST_LOG env var.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fscache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.dir {
        config.cache_dir = dir;
    }
    let store = CacheStore::new(&config);

    match cli.command {
        Command::Get { key, raw } => {
            if raw {
                match store.retrieve_raw(&key)? {
                    Lookup::Hit(bytes) => {
                        io::stdout().write_all(&bytes)?;
                        Ok(ExitCode::SUCCESS)
                    }
                    Lookup::Miss => {
                        eprintln!("cache miss: {key}");
                        Ok(ExitCode::FAILURE)
                    }
                }
            } else {
                match store.retrieve::<serde_json::Value>(&key)? {
                    Lookup::Hit(value) => {
                        println!("{}", serde_json::to_string_pretty(&value)?);
                        Ok(ExitCode::SUCCESS)
                    }
                    Lookup::Miss => {
                        eprintln!("cache miss: {key}");
                        Ok(ExitCode::FAILURE)
                    }
                }
            }
        }
        Command::Set { key, value, raw } => {
            let outcome = if raw {
                store.save_raw(&key, value.as_bytes())?
            } else {
                let parsed: serde_json::Value =
                    serde_json::from_str(&value).context("VALUE is not valid JSON")?;
                store.save(&key, &parsed)?
            };
            match outcome {
                SaveOutcome::Saved => Ok(ExitCode::SUCCESS),
                SaveOutcome::Skipped => {
                    eprintln!("save skipped: another writer owns {key}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Invalidate { key } => {
            store.invalidate(&key)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Purge => {
            let removed = store.purge_expired()?;
            println!("removed {removed} expired files");
            Ok(ExitCode::SUCCESS)
        }
    }
}
