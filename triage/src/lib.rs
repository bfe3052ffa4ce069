//! Mail Triage - unanswered-thread triage for a mailbox
//!
//! Finds conversations where a reply is owed (by the account owner or to
//! them), hands out a digest, and remembers which threads the user archived
//! or deferred.
//!
//! ## Module Organization
//!
//! - `commands/`: CLI handlers (thin wrappers)
//! - `services/`: Triage engine and user actions (front-end agnostic)
//! - `state/`: Suppression store (archive/defer records)
//! - `adapters/`: Mailbox sources and SQLite persistence
//! - `types/`: Queries and response types
//! - `config/`: Configuration management
//! - `clock`: Injectable time source

pub mod adapters;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod types;

pub use adapters::{SnapshotSource, ThreadSource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TriageConfig;
pub use error::{AdapterError, PersistenceError, Result, TriageError};
pub use services::{ActionOutcome, ActionRequest, TriageEngine};
pub use state::{ArchiveOutcome, DeferOutcome, SqliteStateStore, SuppressionStore};
pub use types::responses::{FlaggedItem, RunStats, TriageReport};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            // Debug build: show debug logs for our crate, info for others
            EnvFilter::new("mail_triage_lib=debug,info")
        } else {
            EnvFilter::new("mail_triage_lib=info,warn")
        }
    });

    // Logs go to stderr so stdout stays clean for digests and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
