use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque provider thread identifier.
pub type ThreadId = String;

/// One message as seen by the classifier.
///
/// Only the short provider snippet is kept; bodies are never loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: ThreadId,
    /// Raw `From` header, e.g. `"Jane Doe <jane@example.com>"`.
    pub sender: String,
    #[serde(default)]
    pub subject_line: String,
    #[serde(default)]
    pub snippet: String,
    /// Provider labels. The configured sent label marks the account owner's messages.
    #[serde(default)]
    pub direction_labels: BTreeSet<String>,
    pub timestamp: DateTime<Utc>,
}

impl MessageRef {
    pub fn has_label(&self, label: &str) -> bool {
        self.direction_labels.contains(label)
    }
}

/// A conversation: messages in provider position order.
///
/// Position order is not guaranteed to match timestamp order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    #[serde(default)]
    pub messages: Vec<MessageRef>,
}

impl Thread {
    pub fn new(id: impl Into<ThreadId>, messages: Vec<MessageRef>) -> Self {
        Self {
            id: id.into(),
            messages,
        }
    }

    /// The message the verdict is keyed on.
    pub fn last_message(&self) -> Option<&MessageRef> {
        self.messages.last()
    }

    /// Newest timestamp anywhere in the thread.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).max()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
