pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use thread_classifier::{
    ClassificationVerdict, Direction, MessageRef, SuppressionReason, Thread, ThreadId,
};

/// Thread listing request handed to a source adapter.
///
/// Cutoffs are absolute so a run sees one consistent window even when its
/// calls are spread over several seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Only threads with activity at or after this instant
    pub after: Option<DateTime<Utc>>,
    /// Only threads with no activity at or after this instant
    pub before: Option<DateTime<Utc>>,
    /// Restrict to threads still in the inbox
    pub in_inbox: bool,
    /// Senders to leave out where the provider can filter server-side
    pub exclude_senders: Vec<String>,
}

impl QuerySpec {
    /// Threads active since `after`, minus denylisted senders.
    pub fn recent(after: DateTime<Utc>, exclude_senders: &[String]) -> Self {
        Self {
            after: Some(after),
            before: None,
            in_inbox: false,
            exclude_senders: exclude_senders.to_vec(),
        }
    }

    /// Inbox threads quiet since `before`.
    pub fn stale(before: DateTime<Utc>) -> Self {
        Self {
            after: None,
            before: Some(before),
            in_inbox: true,
            exclude_senders: Vec::new(),
        }
    }

    /// Gmail-style search string, for adapters that speak that grammar.
    pub fn to_search_string(&self) -> String {
        let mut parts = Vec::new();
        if self.in_inbox {
            parts.push("in:inbox".to_string());
        }
        if let Some(after) = self.after {
            parts.push(format!("after:{}", after.timestamp()));
        }
        if let Some(before) = self.before {
            parts.push(format!("before:{}", before.timestamp()));
        }
        for sender in &self.exclude_senders {
            parts.push(format!("-from:{}", sender));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_string_for_recent_query() {
        let after = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let query = QuerySpec::recent(after, &["news@example.com".to_string()]);
        assert_eq!(
            query.to_search_string(),
            format!("after:{} -from:news@example.com", after.timestamp())
        );
    }

    #[test]
    fn test_search_string_for_stale_query() {
        let before = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let query = QuerySpec::stale(before);
        assert_eq!(
            query.to_search_string(),
            format!("in:inbox before:{}", before.timestamp())
        );
    }
}
