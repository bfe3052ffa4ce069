//! User actions on flagged threads
//!
//! Archive and defer write the suppression store; archive also takes the
//! thread out of the remote inbox. Both are safe to repeat.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use super::helpers::{run_blocking, shift_forward, validate_thread_id, with_timeout};
use super::triage::TriageEngine;
use crate::error::{Result, TriageError};
use crate::state::{ArchiveOutcome, DeferOutcome};
use crate::types::ThreadId;

/// An action as delivered by a front end button or command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Archive { id: ThreadId },
    /// `duration` falls back to the configured default.
    Defer {
        id: ThreadId,
        #[serde(skip)]
        duration: Option<Duration>,
    },
}

impl ActionRequest {
    pub fn id(&self) -> &str {
        match self {
            Self::Archive { id } | Self::Defer { id, .. } => id,
        }
    }
}

/// Parses callback payloads of the form `archive:<id>` or `defer:<id>`.
impl FromStr for ActionRequest {
    type Err = TriageError;

    fn from_str(payload: &str) -> Result<Self> {
        let (verb, id) = payload.trim().split_once(':').ok_or_else(|| {
            TriageError::InvalidInput(format!("Malformed action payload: {:?}", payload))
        })?;
        let id = validate_thread_id(id)?.to_string();

        match verb {
            "archive" => Ok(Self::Archive { id }),
            "defer" => Ok(Self::Defer { id, duration: None }),
            other => Err(TriageError::InvalidInput(format!(
                "Unknown action: {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Archived(ArchiveOutcome),
    Deferred(DeferOutcome),
}

impl ActionOutcome {
    /// Short confirmation for the user.
    pub fn message(&self) -> String {
        match self {
            Self::Archived(ArchiveOutcome::Changed) => "Archived.".to_string(),
            Self::Archived(ArchiveOutcome::NoOp) => "Already archived.".to_string(),
            Self::Deferred(DeferOutcome::Applied { until }) => {
                format!("Deferred until {}.", until.format("%Y-%m-%d %H:%M UTC"))
            }
        }
    }
}

impl TriageEngine {
    /// Mark a thread archived and remove it from the inbox.
    ///
    /// The record is committed before the mailbox call. If that call fails the
    /// error is returned but the record stays; stale-thread hygiene removes
    /// the thread from the inbox later.
    pub async fn on_archive(&self, id: &str) -> Result<ArchiveOutcome> {
        let id = validate_thread_id(id)?;
        let now = self.clock.now();
        let store = Arc::clone(&self.store);
        let owned = id.to_string();
        let outcome = run_blocking(move || Ok(store.archive(&owned, now)?)).await?;

        if outcome == ArchiveOutcome::NoOp {
            info!(thread_id = %id, "Thread already archived");
            return Ok(outcome);
        }

        info!(thread_id = %id, "Archived thread");
        with_timeout(self.remote_timeout, self.source.remove_from_inbox(id))
            .await
            .map_err(|e| {
                warn!(thread_id = %id, error = %e, "Archive recorded but inbox removal failed");
                TriageError::from(e)
            })?;
        Ok(outcome)
    }

    /// Hide a thread from runs until `now + duration`. Never touches the mailbox.
    pub async fn on_defer(&self, id: &str, duration: Duration) -> Result<DeferOutcome> {
        let id = validate_thread_id(id)?;
        if duration <= Duration::zero() {
            return Err(TriageError::InvalidInput(
                "defer duration must be positive".to_string(),
            ));
        }

        let now = self.clock.now();
        let until = shift_forward(now, duration)?;
        let store = Arc::clone(&self.store);
        let owned = id.to_string();
        let outcome = run_blocking(move || Ok(store.defer(&owned, until, now)?)).await?;
        info!(thread_id = %id, until = %until, "Deferred thread");
        Ok(outcome)
    }

    /// Dispatch a parsed action.
    pub async fn apply(&self, request: ActionRequest) -> Result<ActionOutcome> {
        match request {
            ActionRequest::Archive { id } => self.on_archive(&id).await.map(ActionOutcome::Archived),
            ActionRequest::Defer { id, duration } => {
                let duration = match duration {
                    Some(duration) => duration,
                    None => self.config.defer_duration()?,
                };
                self.on_defer(&id, duration).await.map(ActionOutcome::Deferred)
            }
        }
    }
}
