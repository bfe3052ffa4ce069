//! CLI command handlers
//!
//! Commands are thin wrappers that build the engine from config and flags,
//! delegate to services, and print the result.
//!
//! ## Module Organization
//!
//! - `triage`: `run` and `status`
//! - `actions`: `archive`, `defer`, and button `callback` payloads

mod actions;
mod triage;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::adapters::{SnapshotSource, ThreadSource};
use crate::config::{load_config, TriageConfig};
use crate::error::{Result, TriageError};
use crate::services::TriageEngine;
use crate::state::SqliteStateStore;

#[derive(Debug, Parser)]
#[command(name = "mail-triage", version, about = "Find mail threads waiting for a reply")]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Mailbox snapshot (JSON) to triage
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Suppression database (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one triage pass and print the digest
    Run {
        #[arg(long)]
        window_hours: Option<i64>,
    },
    /// Archive a thread and remove it from the inbox
    Archive { id: String },
    /// Hide a thread from runs for a while
    Defer {
        id: String,
        #[arg(long)]
        hours: Option<i64>,
    },
    /// Apply a button payload such as `archive:<id>` or `defer:<id>`
    Callback { payload: String },
    /// Show suppression store counts, or one thread's record
    Status {
        #[arg(long)]
        id: Option<String>,
    },
}

pub async fn execute(cli: Cli) -> Result<()> {
    let context = CommandContext::load(&cli)?;
    match cli.command {
        Command::Run { window_hours } => triage::run(&context, window_hours).await,
        Command::Archive { id } => actions::archive(&context, &id).await,
        Command::Defer { id, hours } => actions::defer(&context, &id, hours).await,
        Command::Callback { payload } => actions::callback(&context, &payload).await,
        Command::Status { id } => triage::status(&context, id.as_deref()),
    }
}

/// Everything a handler needs, resolved from flags and config.
pub(crate) struct CommandContext {
    config: TriageConfig,
    snapshot: Option<PathBuf>,
    database: PathBuf,
    json: bool,
}

impl CommandContext {
    fn load(cli: &Cli) -> Result<Self> {
        let config = load_config(cli.config.as_deref())?;
        let database = match &cli.db {
            Some(path) => path.clone(),
            None => config.database_path()?,
        };
        debug!("Using state database at {:?}", database);

        Ok(Self {
            config,
            snapshot: cli.snapshot.clone(),
            database,
            json: cli.json,
        })
    }

    fn open_store(&self) -> Result<SqliteStateStore> {
        Ok(SqliteStateStore::open(&self.database)?)
    }

    /// Engine over the snapshot; commands that must reach the mailbox pass
    /// `needs_mailbox` and fail early without `--snapshot`.
    async fn engine(&self, needs_mailbox: bool) -> Result<TriageEngine> {
        let source: Arc<dyn ThreadSource> = match &self.snapshot {
            Some(path) => Arc::new(SnapshotSource::open(path).await?),
            None if needs_mailbox => {
                return Err(TriageError::InvalidInput(
                    "--snapshot is required for this command".to_string(),
                ))
            }
            None => Arc::new(SnapshotSource::from_threads(Vec::new())),
        };
        let store = Arc::new(self.open_store()?);
        TriageEngine::new(self.config.clone(), source, store)
    }

    /// Print `value` as JSON with `--json`, otherwise the text rendering.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}
