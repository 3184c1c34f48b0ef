//! Versioned schema for the board database.
//!
//! Each step runs at most once, inside its own transaction, and records its
//! version in `schema_version`. Opening a database always brings it up to
//! [`SCHEMA_VERSION`].

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};

/// Newest schema this build knows how to create.
pub const SCHEMA_VERSION: i32 = 1;

/// `(version, DDL)` in application order.
const STEPS: &[(i32, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS workout_state (
        id          INTEGER PRIMARY KEY DEFAULT 1,
        data        TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );",
)];

/// Apply every step newer than the database's recorded version.
///
/// # Errors
/// Returns an error if any step fails; earlier steps stay applied.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);")?;

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        tracing::warn!(current, known = SCHEMA_VERSION, "database schema is newer than this build");
    }

    for &(version, ddl) in STEPS.iter().filter(|(v, _)| *v > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(ddl)?;
        tx.execute("DELETE FROM schema_version", [])?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
        tracing::debug!(version, "applied schema migration");
    }
    Ok(())
}

/// Recorded schema version; 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> SqliteResult<i32> {
    Ok(conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0))
}
