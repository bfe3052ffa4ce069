use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::CommandContext;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::services::{hours_to_duration, validate_thread_id};
use crate::state::{StoreStats, SuppressionStore};

pub(super) async fn run(context: &CommandContext, window_hours: Option<i64>) -> Result<()> {
    let window = match window_hours {
        Some(hours) => hours_to_duration(hours)?,
        None => context.config.classification_window()?,
    };
    info!("Running triage over the last {} hours", window.num_hours());

    let engine = context.engine(true).await?;
    let report = engine.run_triage(window).await?;

    context.emit(&report, || {
        if report.is_empty() {
            "No unanswered threads.".to_string()
        } else {
            report.summary.clone()
        }
    })
}

#[derive(Debug, Serialize)]
struct StatusReport {
    database: PathBuf,
    stats: StoreStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread: Option<ThreadStatus>,
}

#[derive(Debug, Serialize)]
struct ThreadStatus {
    id: String,
    archived: bool,
    deferred_until: Option<DateTime<Utc>>,
    suppressed: bool,
}

pub(super) fn status(context: &CommandContext, id: Option<&str>) -> Result<()> {
    let store = context.open_store()?;
    let now = SystemClock.now();

    let thread = match id {
        Some(id) => {
            let id = validate_thread_id(id)?;
            Some(ThreadStatus {
                id: id.to_string(),
                archived: store.is_archived(id)?,
                deferred_until: store.deferred_until(id)?,
                suppressed: store.is_suppressed(id, now)?,
            })
        }
        None => None,
    };

    let report = StatusReport {
        database: context.database.clone(),
        stats: store.stats(now)?,
        thread,
    };

    context.emit(&report, || {
        let mut out = format!(
            "Database: {}\nArchived: {}\nDeferred: {} ({} active)",
            report.database.display(),
            report.stats.archived,
            report.stats.deferred,
            report.stats.actively_deferred
        );
        if let Some(thread) = &report.thread {
            let deferred = thread
                .deferred_until
                .map(|until| until.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "\n\nThread {}\n  archived: {}\n  deferred until: {}\n  hidden from runs: {}",
                thread.id, thread.archived, deferred, thread.suppressed
            ));
        }
        out
    })
}
