//! Response types handed to front ends
//!
//! These types are serialized for the chat front end and the CLI.
//! They should be lean and contain only what a front end needs.

use chrono::{DateTime, Utc};
use mailparse::MailAddr;
use serde::{Deserialize, Serialize};

use super::{Direction, ThreadId};

// ============================================================================
// Triage Response Types
// ============================================================================

/// A thread that needs attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedItem {
    /// Thread id; pass this back to archive/defer
    pub id: ThreadId,
    /// Id of the message the verdict was based on
    pub message_id: String,
    /// Display form of the last sender
    pub sender: String,
    /// Subject, truncated to a display-safe length
    pub subject_line: String,
    /// Opaque link into the provider UI
    pub deep_link: String,
    pub direction: Direction,
    pub last_activity: DateTime<Utc>,
}

/// Counters for one triage pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Threads returned by the classification query
    pub listed: usize,
    /// Skipped because archived or deferred
    pub suppressed_by_state: usize,
    /// Fetched and classified
    pub classified: usize,
    /// Dropped after a fetch error or timeout
    pub fetch_failures: usize,
    /// Stale threads removed from the inbox
    pub stale_archived: usize,
    /// Stale threads whose removal failed
    pub stale_failures: usize,
}

/// Result of `run_triage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageReport {
    /// Human-readable digest grouped by direction; empty when nothing is flagged
    pub summary: String,
    /// Newest activity first
    pub flagged: Vec<FlaggedItem>,
    pub stats: RunStats,
}

impl TriageReport {
    /// Flagged items awaiting the owner's reply.
    pub fn inbound(&self) -> impl Iterator<Item = &FlaggedItem> {
        self.flagged
            .iter()
            .filter(|item| item.direction == Direction::Inbound)
    }

    /// Flagged items where the owner is waiting on someone else.
    pub fn outbound(&self) -> impl Iterator<Item = &FlaggedItem> {
        self.flagged
            .iter()
            .filter(|item| item.direction == Direction::Outbound)
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }
}

// ============================================================================
// Display helpers
// ============================================================================

/// Truncate to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_subject(subject: &str, max_chars: usize) -> String {
    let trimmed = subject.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = trimmed.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Display name if present, otherwise the bare address, otherwise the raw header.
pub fn display_sender(raw: &str) -> String {
    let first = mailparse::addrparse(raw)
        .ok()
        .and_then(|list| list.iter().next().cloned());

    match first {
        Some(MailAddr::Single(info)) => info
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(info.addr),
        Some(MailAddr::Group(group)) => group.group_name,
        None => raw.trim().to_string(),
    }
}
