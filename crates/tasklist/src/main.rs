//! CLI entry point for tasklist.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasklist_app::{AppConfig, TaskIntents, TaskRepository};
use tasklist_store::MemoryStore;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;
mod render;

/// Shared task list backed by a hierarchical key-value store.
#[derive(Parser, Debug)]
#[command(
    name = "tasklist",
    version,
    about = "tasklist: a shared to-do list with soft delete and progress stats"
)]
struct Cli {
    /// Config file (defaults to <config dir>/tasklist/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store file, overriding `store.path` from the config.
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task.
    Add {
        /// Task text. Leading and trailing whitespace is dropped.
        text: String,
    },

    /// Mark a task as done.
    Check { id: String },

    /// Mark a task as not done.
    Uncheck { id: String },

    /// Move a task to the archive.
    Rm { id: String },

    /// List active tasks, open ones first.
    Ls {
        #[arg(long)]
        json: bool,
    },

    /// Show completion and archive statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let Cli { config, store, cmd } = Cli::parse();
    install_tracing();

    let config_path = config.or_else(default_config_path);
    let config = match &config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let store_path = store
        .or_else(|| config.store.path.clone())
        .or_else(default_store_path);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?
        .block_on(execute_command(cmd, &config, store_path.as_deref()))
}

async fn execute_command(command: Command, config: &AppConfig, store_path: Option<&Path>) -> Result<()> {
    let store = open_store(config, store_path).await?;
    let repo = TaskRepository::connect(Arc::new(store))
        .await
        .context("failed to connect to the task store")?;
    let intents = TaskIntents::new(Arc::new(repo), &config.sync);

    let mut out = io::stdout();
    let result = commands::run(command, &intents, &mut out).await;
    intents.repository().shutdown();
    result
}

async fn open_store(config: &AppConfig, store_path: Option<&Path>) -> Result<MemoryStore> {
    match store_path {
        Some(path) if config.store.persist => MemoryStore::open(path)
            .await
            .with_context(|| format!("failed to open store {}", path.display())),
        _ => {
            info!("Using an in-memory store; changes are discarded on exit");
            Ok(MemoryStore::new())
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tasklist").join("config.toml"))
}

fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("tasklist").join("store.json"))
}

fn install_tracing() {
    // RUST_LOG overrides; stdout stays clean for command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
