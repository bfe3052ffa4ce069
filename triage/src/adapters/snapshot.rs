//! Mailbox snapshot source
//!
//! Serves threads from a JSON export of a mailbox instead of a live
//! provider. Used by the CLI for offline runs and by tests, which can also
//! inject per-thread failures and latency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::source::{SourceFuture, ThreadSource};
use crate::error::{AdapterError, Result, TriageError};
use crate::types::{MessageRef, QuerySpec, Thread, ThreadId};

/// One thread as stored in the snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotThread {
    pub id: ThreadId,
    #[serde(default = "default_true")]
    pub in_inbox: bool,
    #[serde(default)]
    pub messages: Vec<MessageRef>,
}

impl SnapshotThread {
    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).max()
    }

    fn to_thread(&self) -> Thread {
        Thread::new(self.id.clone(), self.messages.clone())
    }
}

/// Snapshot file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailboxSnapshot {
    #[serde(default)]
    pub threads: Vec<SnapshotThread>,
}

impl MailboxSnapshot {
    /// Fill in message thread ids left empty in hand-written snapshots.
    fn normalize(mut self) -> Self {
        for thread in &mut self.threads {
            for message in &mut thread.messages {
                if message.thread_id.is_empty() {
                    message.thread_id = thread.id.clone();
                }
            }
        }
        self
    }
}

fn default_true() -> bool {
    true
}

/// Injected misbehaviour for one thread.
#[derive(Debug, Clone)]
enum Fault {
    Fail(AdapterError),
    Delay(Duration),
}

pub struct SnapshotSource {
    mailbox: RwLock<MailboxSnapshot>,
    write_back: Option<PathBuf>,
    faults: RwLock<HashMap<ThreadId, Fault>>,
    listing_fault: RwLock<Option<AdapterError>>,
    remove_calls: AtomicUsize,
}

impl SnapshotSource {
    pub fn new(snapshot: MailboxSnapshot) -> Self {
        Self {
            mailbox: RwLock::new(snapshot.normalize()),
            write_back: None,
            faults: RwLock::new(HashMap::new()),
            listing_fault: RwLock::new(None),
            remove_calls: AtomicUsize::new(0),
        }
    }

    pub fn from_threads(threads: Vec<SnapshotThread>) -> Self {
        Self::new(MailboxSnapshot { threads })
    }

    /// Load a snapshot file; inbox removals are written back to it.
    pub async fn open(path: &Path) -> Result<Self> {
        info!("Loading mailbox snapshot from {:?}", path);
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TriageError::Io(format!("Failed to read snapshot {:?}: {}", path, e))
        })?;
        let snapshot: MailboxSnapshot = serde_json::from_str(&content)?;

        let mut source = Self::new(snapshot);
        source.write_back = Some(path.to_path_buf());
        Ok(source)
    }

    /// Make every call touching `id` fail with `error`.
    pub async fn fail_thread(&self, id: &str, error: AdapterError) {
        self.faults
            .write()
            .await
            .insert(id.to_string(), Fault::Fail(error));
    }

    /// Make every call touching `id` take at least `delay`.
    pub async fn delay_thread(&self, id: &str, delay: Duration) {
        self.faults
            .write()
            .await
            .insert(id.to_string(), Fault::Delay(delay));
    }

    /// Make listing fail with `error`; `None` restores normal listing.
    pub async fn fail_listing(&self, error: Option<AdapterError>) {
        *self.listing_fault.write().await = error;
    }

    /// Append a message to an existing thread, or start a new thread.
    pub async fn push_message(&self, message: MessageRef) {
        let mut mailbox = self.mailbox.write().await;
        match mailbox.threads.iter_mut().find(|t| t.id == message.thread_id) {
            Some(thread) => {
                thread.in_inbox = true;
                thread.messages.push(message);
            }
            None => mailbox.threads.push(SnapshotThread {
                id: message.thread_id.clone(),
                in_inbox: true,
                messages: vec![message],
            }),
        }
    }

    pub async fn is_in_inbox(&self, id: &str) -> Option<bool> {
        let mailbox = self.mailbox.read().await;
        mailbox.threads.iter().find(|t| t.id == id).map(|t| t.in_inbox)
    }

    /// Number of `remove_from_inbox` calls that reached the mailbox.
    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    async fn apply_fault(&self, id: &str) -> std::result::Result<(), AdapterError> {
        let fault = self.faults.read().await.get(id).cloned();
        match fault {
            Some(Fault::Fail(error)) => Err(error),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn persist(&self) -> std::result::Result<(), AdapterError> {
        let Some(path) = &self.write_back else {
            return Ok(());
        };
        let json = {
            let mailbox = self.mailbox.read().await;
            serde_json::to_string_pretty(&*mailbox)
                .map_err(|e| AdapterError::Transport(e.to_string()))?
        };
        tokio::fs::write(path, json)
            .await
            .map_err(|e| AdapterError::Transport(format!("Failed to write {:?}: {}", path, e)))
    }
}

fn matches_query(thread: &SnapshotThread, query: &QuerySpec) -> bool {
    if query.in_inbox && !thread.in_inbox {
        return false;
    }

    let Some(last_activity) = thread.last_activity() else {
        return query.after.is_none() && query.before.is_none();
    };
    if query.after.is_some_and(|after| last_activity < after) {
        return false;
    }
    if query.before.is_some_and(|before| last_activity >= before) {
        return false;
    }

    // Exclusion follows the last sender, like a provider's thread view.
    if let Some(last) = thread.messages.last() {
        let sender = last.sender.to_lowercase();
        if query
            .exclude_senders
            .iter()
            .any(|excluded| sender.contains(&excluded.to_lowercase()))
        {
            return false;
        }
    }
    true
}

impl ThreadSource for SnapshotSource {
    fn list_threads<'a>(&'a self, query: &'a QuerySpec) -> SourceFuture<'a, Vec<ThreadId>> {
        Box::pin(async move {
            if let Some(error) = self.listing_fault.read().await.clone() {
                return Err(error);
            }

            let mailbox = self.mailbox.read().await;
            let mut matching: Vec<&SnapshotThread> = mailbox
                .threads
                .iter()
                .filter(|t| matches_query(t, query))
                .collect();
            matching.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));

            debug!(query = %query.to_search_string(), count = matching.len(), "Listed snapshot threads");
            Ok(matching.into_iter().map(|t| t.id.clone()).collect())
        })
    }

    fn get_thread<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Thread> {
        Box::pin(async move {
            self.apply_fault(id).await?;

            let mailbox = self.mailbox.read().await;
            mailbox
                .threads
                .iter()
                .find(|t| t.id == id)
                .map(SnapshotThread::to_thread)
                .ok_or_else(|| AdapterError::NotFound(id.to_string()))
        })
    }

    fn remove_from_inbox<'a>(&'a self, id: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            self.apply_fault(id).await?;

            {
                let mut mailbox = self.mailbox.write().await;
                let thread = mailbox
                    .threads
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| AdapterError::NotFound(id.to_string()))?;
                thread.in_inbox = false;
            }
            self.remove_calls.fetch_add(1, Ordering::SeqCst);
            self.persist().await
        })
    }
}
