use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, OptionalExtension};

use super::DbPool;
use crate::error::PersistenceError;

/// Insert an archive row. Returns true if the row is new.
pub fn insert_archived(
    pool: &DbPool,
    id: &str,
    at: DateTime<Utc>,
) -> Result<bool, PersistenceError> {
    let conn = pool.get()?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO archived (id, archived_at) VALUES (?1, ?2)",
        params![id, at.timestamp_millis()],
    )?;
    Ok(inserted == 1)
}

pub fn is_archived(pool: &DbPool, id: &str) -> Result<bool, PersistenceError> {
    let conn = pool.get()?;
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM archived WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Set or overwrite the defer expiry for an id.
pub fn upsert_deferred(
    pool: &DbPool,
    id: &str,
    until: DateTime<Utc>,
    at: DateTime<Utc>,
) -> Result<(), PersistenceError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO deferred (id, defer_until, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
             defer_until = excluded.defer_until,
             updated_at  = excluded.updated_at",
        params![id, until.timestamp_millis(), at.timestamp_millis()],
    )?;
    Ok(())
}

pub fn get_deferred_until(
    pool: &DbPool,
    id: &str,
) -> Result<Option<DateTime<Utc>>, PersistenceError> {
    let conn = pool.get()?;
    let millis: Option<i64> = conn
        .query_row(
            "SELECT defer_until FROM deferred WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    millis.map(|ms| from_millis(id, ms)).transpose()
}

/// Archived, or deferred with an expiry still in the future, in one read.
pub fn is_suppressed(
    pool: &DbPool,
    id: &str,
    now: DateTime<Utc>,
) -> Result<bool, PersistenceError> {
    let conn = pool.get()?;
    let suppressed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM archived WHERE id = ?1)
             OR EXISTS(SELECT 1 FROM deferred WHERE id = ?1 AND defer_until > ?2)",
        params![id, now.timestamp_millis()],
        |row| row.get(0),
    )?;
    Ok(suppressed)
}

pub struct SuppressionCounts {
    pub archived: u64,
    pub deferred: u64,
    pub actively_deferred: u64,
}

pub fn counts(pool: &DbPool, now: DateTime<Utc>) -> Result<SuppressionCounts, PersistenceError> {
    let conn = pool.get()?;
    let (archived, deferred, actively_deferred): (i64, i64, i64) = conn.query_row(
        "SELECT
             (SELECT COUNT(*) FROM archived),
             (SELECT COUNT(*) FROM deferred),
             (SELECT COUNT(*) FROM deferred WHERE defer_until > ?1)",
        params![now.timestamp_millis()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(SuppressionCounts {
        archived: archived as u64,
        deferred: deferred as u64,
        actively_deferred: actively_deferred as u64,
    })
}

fn from_millis(id: &str, ms: i64) -> Result<DateTime<Utc>, PersistenceError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| PersistenceError::Corrupt {
            id: id.to_string(),
            detail: format!("invalid timestamp {}", ms),
        })
}
