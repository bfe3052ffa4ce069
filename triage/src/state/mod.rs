//! Suppression state
//!
//! The only state that survives between runs: which threads the user
//! archived and which ones are deferred until when. Both records are written
//! only by explicit user actions; triage runs just read them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::adapters::sqlite::{pool, suppression, DbPool};
use crate::error::PersistenceError;

/// Whether an archive call changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveOutcome {
    Changed,
    NoOp,
}

/// Defer always records the new expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferOutcome {
    Applied { until: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub archived: u64,
    pub deferred: u64,
    pub actively_deferred: u64,
}

/// Durable archive/defer records.
///
/// Every method is individually atomic; callers need no cross-id locking.
pub trait SuppressionStore: Send + Sync {
    /// Archived, or deferred with `now < defer_until`.
    fn is_suppressed(&self, id: &str, now: DateTime<Utc>) -> Result<bool, PersistenceError>;

    fn is_archived(&self, id: &str) -> Result<bool, PersistenceError>;

    /// Idempotent. Leaves any defer record for the id in place.
    fn archive(&self, id: &str, now: DateTime<Utc>) -> Result<ArchiveOutcome, PersistenceError>;

    /// Set or overwrite the expiry. Recorded even when the id is archived.
    fn defer(
        &self,
        id: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<DeferOutcome, PersistenceError>;

    fn deferred_until(&self, id: &str) -> Result<Option<DateTime<Utc>>, PersistenceError>;

    fn stats(&self, now: DateTime<Utc>) -> Result<StoreStats, PersistenceError>;
}

/// SQLite-backed store behind an r2d2 pool.
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: DbPool,
}

impl SqliteStateStore {
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        debug!("Opening state store at {:?}", path);
        Ok(Self {
            pool: pool::create_pool(path)?,
        })
    }

    pub fn in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            pool: pool::create_memory_pool()?,
        })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SuppressionStore for SqliteStateStore {
    fn is_suppressed(&self, id: &str, now: DateTime<Utc>) -> Result<bool, PersistenceError> {
        suppression::is_suppressed(&self.pool, id, now)
    }

    fn is_archived(&self, id: &str) -> Result<bool, PersistenceError> {
        suppression::is_archived(&self.pool, id)
    }

    fn archive(&self, id: &str, now: DateTime<Utc>) -> Result<ArchiveOutcome, PersistenceError> {
        if suppression::insert_archived(&self.pool, id, now)? {
            Ok(ArchiveOutcome::Changed)
        } else {
            Ok(ArchiveOutcome::NoOp)
        }
    }

    fn defer(
        &self,
        id: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<DeferOutcome, PersistenceError> {
        suppression::upsert_deferred(&self.pool, id, until, now)?;
        Ok(DeferOutcome::Applied { until })
    }

    fn deferred_until(&self, id: &str) -> Result<Option<DateTime<Utc>>, PersistenceError> {
        suppression::get_deferred_until(&self.pool, id)
    }

    fn stats(&self, now: DateTime<Utc>) -> Result<StoreStats, PersistenceError> {
        let counts = suppression::counts(&self.pool, now)?;
        Ok(StoreStats {
            archived: counts.archived,
            deferred: counts.deferred,
            actively_deferred: counts.actively_deferred,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_archive_is_idempotent() {
        let store = SqliteStateStore::in_memory().unwrap();

        assert_eq!(store.archive("t1", t0()).unwrap(), ArchiveOutcome::Changed);
        let after_once = store.stats(t0()).unwrap();
        assert_eq!(store.archive("t1", t0()).unwrap(), ArchiveOutcome::NoOp);
        let after_twice = store.stats(t0()).unwrap();

        assert_eq!(after_once, after_twice);
        assert_eq!(after_twice.archived, 1);
        assert!(store.is_suppressed("t1", t0()).unwrap());
    }

    #[test]
    fn test_defer_expires_at_deadline() {
        let store = SqliteStateStore::in_memory().unwrap();
        let until = t0() + Duration::hours(6);
        store.defer("t1", until, t0()).unwrap();

        assert!(store.is_suppressed("t1", t0()).unwrap());
        assert!(store.is_suppressed("t1", until - Duration::milliseconds(1)).unwrap());
        assert!(!store.is_suppressed("t1", until).unwrap());
        assert!(!store.is_suppressed("t1", until + Duration::hours(1)).unwrap());
        // Expired rows are kept.
        assert_eq!(store.deferred_until("t1").unwrap(), Some(until));
    }

    #[test]
    fn test_redefer_overwrites_expiry() {
        let store = SqliteStateStore::in_memory().unwrap();
        store.defer("t1", t0() + Duration::hours(6), t0()).unwrap();
        store
            .defer("t1", t0() + Duration::hours(1), t0())
            .unwrap();

        assert_eq!(
            store.deferred_until("t1").unwrap(),
            Some(t0() + Duration::hours(1))
        );
        assert!(!store.is_suppressed("t1", t0() + Duration::hours(2)).unwrap());
    }

    #[test]
    fn test_archive_keeps_defer_record() {
        let store = SqliteStateStore::in_memory().unwrap();
        let until = t0() + Duration::hours(6);
        store.defer("t1", until, t0()).unwrap();
        store.archive("t1", t0()).unwrap();

        assert_eq!(store.deferred_until("t1").unwrap(), Some(until));
        // Archive outlives the defer expiry.
        assert!(store.is_suppressed("t1", until + Duration::days(30)).unwrap());
    }

    #[test]
    fn test_defer_of_archived_id_is_recorded() {
        let store = SqliteStateStore::in_memory().unwrap();
        store.archive("t1", t0()).unwrap();
        let outcome = store.defer("t1", t0() + Duration::hours(6), t0()).unwrap();

        assert_eq!(
            outcome,
            DeferOutcome::Applied {
                until: t0() + Duration::hours(6)
            }
        );
        assert!(store.deferred_until("t1").unwrap().is_some());
        assert!(store.is_archived("t1").unwrap());
    }

    #[test]
    fn test_unknown_id_is_not_suppressed() {
        let store = SqliteStateStore::in_memory().unwrap();
        assert!(!store.is_suppressed("missing", t0()).unwrap());
        assert!(!store.is_archived("missing").unwrap());
        assert_eq!(store.deferred_until("missing").unwrap(), None);
    }

    #[test]
    fn test_stats_counts_active_defers() {
        let store = SqliteStateStore::in_memory().unwrap();
        store.archive("a", t0()).unwrap();
        store.defer("b", t0() + Duration::hours(1), t0()).unwrap();
        store.defer("c", t0() - Duration::hours(1), t0()).unwrap();

        assert_eq!(
            store.stats(t0()).unwrap(),
            StoreStats {
                archived: 1,
                deferred: 2,
                actively_deferred: 1,
            }
        );
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.sqlite");
        let until = t0() + Duration::hours(6);

        {
            let store = SqliteStateStore::open(&path).unwrap();
            store.archive("t1", t0()).unwrap();
            store.defer("t2", until, t0()).unwrap();
        }

        let reopened = SqliteStateStore::open(&path).unwrap();
        assert!(reopened.is_archived("t1").unwrap());
        assert_eq!(reopened.deferred_until("t2").unwrap(), Some(until));
        assert_eq!(reopened.archive("t1", t0()).unwrap(), ArchiveOutcome::NoOp);
    }

    #[test]
    fn test_concurrent_archive_of_same_id_changes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStateStore::open(&dir.path().join("state.sqlite")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.archive("t1", t0()).unwrap())
            })
            .collect();

        let changed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| *outcome == ArchiveOutcome::Changed)
            .count();
        assert_eq!(changed, 1);
    }
}
