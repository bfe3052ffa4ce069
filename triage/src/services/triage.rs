//! Triage engine
//!
//! One pass over the mailbox:
//! 1. Remove stale threads from the inbox (hygiene, independent of classification)
//! 2. List threads active within the window
//! 3. Skip archived and still-deferred threads
//! 4. Fetch and classify the rest with bounded concurrency
//! 5. Sort flagged threads by recency and build the digest
//!
//! A pass only reads the suppression store. Per-thread mailbox failures drop
//! that thread; a failed listing or a fatal mailbox error fails the pass.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use thread_classifier::{ClassificationVerdict, ThreadClassifier};

use super::helpers::{run_blocking, shift_back, with_timeout};
use super::summary::build_summary;
use crate::adapters::ThreadSource;
use crate::clock::{Clock, SystemClock};
use crate::config::TriageConfig;
use crate::error::{AdapterError, Result, TriageError};
use crate::state::SuppressionStore;
use crate::types::responses::{display_sender, truncate_subject, FlaggedItem, RunStats, TriageReport};
use crate::types::{Direction, QuerySpec, Thread, ThreadId};

/// Triage engine for one mailbox.
///
/// Concurrent `run_triage` calls are serialized; archive and defer actions
/// run alongside a pass without waiting for it.
pub struct TriageEngine {
    pub(super) source: Arc<dyn ThreadSource>,
    pub(super) store: Arc<dyn SuppressionStore>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) config: TriageConfig,
    pub(super) remote_timeout: std::time::Duration,
    classifier: ThreadClassifier,
    run_lock: Mutex<()>,
}

impl TriageEngine {
    pub fn new(
        config: TriageConfig,
        source: Arc<dyn ThreadSource>,
        store: Arc<dyn SuppressionStore>,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = config.build_classifier()?;
        Ok(Self {
            source,
            store,
            clock: Arc::new(SystemClock),
            remote_timeout: config.remote_timeout(),
            config,
            classifier,
            run_lock: Mutex::new(()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the per-call mailbox deadline (finer than the config's seconds).
    pub fn with_remote_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SuppressionStore> {
        &self.store
    }

    /// Run one triage pass over threads active within `window`.
    pub async fn run_triage(&self, window: Duration) -> Result<TriageReport> {
        if window <= Duration::zero() {
            return Err(TriageError::InvalidInput(
                "triage window must be positive".to_string(),
            ));
        }

        let _guard = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        let span = info_span!("triage_run", %run_id, window_hours = window.num_hours());

        self.run_pass(window).instrument(span).await
    }

    async fn run_pass(&self, window: Duration) -> Result<TriageReport> {
        let start = std::time::Instant::now();
        let now = self.clock.now();
        let mut stats = RunStats::default();

        // Resolve both cutoffs before any mailbox call.
        let recent_after = shift_back(now, window)?;
        let stale_before = shift_back(now, self.config.staleness()?)?;

        self.archive_stale(stale_before, &mut stats).await?;

        let query = QuerySpec::recent(recent_after, &self.config.sender_denylist);
        let listed = with_timeout(self.remote_timeout, self.source.list_threads(&query))
            .await
            .map_err(|e| {
                warn!(error = %e, "Listing recent threads failed, aborting run");
                TriageError::from(e)
            })?;
        stats.listed = listed.len();

        let store = Arc::clone(&self.store);
        let candidates: Vec<ThreadId> =
            run_blocking(move || Ok(unsuppressed(store.as_ref(), listed, now))).await?;
        stats.suppressed_by_state = stats.listed - candidates.len();

        let fetched: Vec<(ThreadId, std::result::Result<Thread, AdapterError>)> =
            stream::iter(candidates)
                .map(|id| async move {
                    let result = with_timeout(self.remote_timeout, self.source.get_thread(&id)).await;
                    (id, result)
                })
                .buffered(self.config.max_concurrent_fetches)
                .collect()
                .await;

        let mut flagged = Vec::new();
        for (id, result) in fetched {
            let thread = match result {
                Ok(thread) => thread,
                Err(e) => {
                    warn!(thread_id = %id, error = %e, "Dropping thread after fetch failure");
                    stats.fetch_failures += 1;
                    continue;
                }
            };
            stats.classified += 1;

            let explanation = self.classifier.explain(&thread);
            match explanation.verdict {
                ClassificationVerdict::NeedsReply(direction) => {
                    debug!(
                        thread_id = %id,
                        %direction,
                        signal = explanation.matched.as_deref().unwrap_or(""),
                        "Thread needs a reply"
                    );
                    if let Some(item) = self.flagged_item(&id, &thread, direction) {
                        flagged.push(item);
                    }
                }
                ClassificationVerdict::Suppressed(reason) => {
                    debug!(
                        thread_id = %id,
                        %reason,
                        matched = explanation.matched.as_deref().unwrap_or(""),
                        "Thread suppressed"
                    );
                }
            }
        }

        // Stable: equal timestamps keep listing order.
        flagged.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

        let summary = build_summary(&flagged);
        info!(
            listed = stats.listed,
            suppressed = stats.suppressed_by_state,
            classified = stats.classified,
            flagged = flagged.len(),
            fetch_failures = stats.fetch_failures,
            stale_archived = stats.stale_archived,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Triage run complete"
        );

        Ok(TriageReport {
            summary,
            flagged,
            stats,
        })
    }

    /// Remove inbox threads quiet for longer than the staleness window.
    ///
    /// Only a fatal listing error aborts; everything else is logged and skipped.
    async fn archive_stale(&self, before: DateTime<Utc>, stats: &mut RunStats) -> Result<()> {
        let query = QuerySpec::stale(before);
        let stale = match with_timeout(self.remote_timeout, self.source.list_threads(&query)).await {
            Ok(ids) => ids,
            Err(e) if e.is_fatal() => {
                warn!(error = %e, "Mailbox unusable, aborting run");
                return Err(e.into());
            }
            Err(e) => {
                warn!(error = %e, "Skipping stale-thread archival: listing failed");
                return Ok(());
            }
        };

        for id in stale {
            match with_timeout(self.remote_timeout, self.source.remove_from_inbox(&id)).await {
                Ok(()) => {
                    debug!(thread_id = %id, "Archived stale thread");
                    stats.stale_archived += 1;
                }
                Err(e) => {
                    warn!(thread_id = %id, error = %e, "Failed to archive stale thread");
                    stats.stale_failures += 1;
                }
            }
        }
        Ok(())
    }

    fn flagged_item(&self, id: &str, thread: &Thread, direction: Direction) -> Option<FlaggedItem> {
        let last = thread.last_message()?;
        Some(FlaggedItem {
            id: id.to_string(),
            message_id: last.id.clone(),
            sender: display_sender(&last.sender),
            subject_line: truncate_subject(&last.subject_line, self.config.subject_max_chars),
            deep_link: self.config.deep_link(id),
            direction,
            last_activity: thread.last_activity().unwrap_or(last.timestamp),
        })
    }
}

/// Drop archived and still-deferred ids.
///
/// A failed read counts as not suppressed.
fn unsuppressed(store: &dyn SuppressionStore, ids: Vec<ThreadId>, now: DateTime<Utc>) -> Vec<ThreadId> {
    ids.into_iter()
        .filter(|id| match store.is_suppressed(id, now) {
            Ok(true) => {
                debug!(thread_id = %id, "Skipping archived or deferred thread");
                false
            }
            Ok(false) => true,
            Err(e) => {
                warn!(thread_id = %id, error = %e, "State store read failed, treating thread as open");
                true
            }
        })
        .collect()
}
