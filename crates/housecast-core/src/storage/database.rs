//! SQLite-backed board storage.
//!
//! The whole board is kept as one JSON document in row `id = 1` of
//! `workout_state`, replaced wholesale on every save.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{migrations, StateStore};
use crate::board::Board;
use crate::error::{Result, StorageError};

/// SQLite database holding the persisted board.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        Self::with_connection(conn, Some(path))
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn, path })
    }

    pub fn load_board(&self) -> Result<Option<Board>> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM workout_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_board(&self, board: &Board) -> Result<()> {
        let json = serde_json::to_string(board)?;
        self.conn.execute(
            "INSERT INTO workout_state (id, data, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// RFC 3339 time of the last save, if any.
    #[cfg(test)]
    fn updated_at(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT updated_at FROM workout_state WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl StateStore for Database {
    fn load(&mut self) -> Result<Option<Board>> {
        self.load_board()
    }

    fn save(&mut self, board: &Board) -> Result<()> {
        self.save_board(board)
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite::memory:".into(),
        }
    }
}
