use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::initialize_schema;
use crate::error::PersistenceError;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Open (or create) the state database and bring its schema up to date.
pub fn create_pool(db_path: &Path) -> Result<DbPool, PersistenceError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Database(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        // busy_timeout must come before the WAL switch, which takes a lock.
        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
    });

    let pool = Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    initialize_schema(&conn)?;

    Ok(pool)
}

/// Single-connection in-memory database, for tests.
pub fn create_memory_pool() -> Result<DbPool, PersistenceError> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager)?;

    let conn = pool.get()?;
    initialize_schema(&conn)?;

    Ok(pool)
}
