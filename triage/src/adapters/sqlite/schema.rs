use rusqlite::Connection;

use crate::error::PersistenceError;

pub fn initialize_schema(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute_batch(
        "
        -- Threads the user marked handled. Append-only.
        CREATE TABLE IF NOT EXISTS archived (
            id              TEXT PRIMARY KEY,   -- provider thread id
            archived_at     INTEGER NOT NULL    -- unix epoch ms
        );

        -- Threads postponed until defer_until. Rows outlive their expiry.
        CREATE TABLE IF NOT EXISTS deferred (
            id              TEXT PRIMARY KEY,   -- provider thread id
            defer_until     INTEGER NOT NULL,   -- unix epoch ms
            updated_at      INTEGER NOT NULL    -- unix epoch ms
        );

        CREATE INDEX IF NOT EXISTS idx_deferred_until ON deferred(defer_until);
        ",
    )?;

    Ok(())
}
