mod config;
pub mod database;
mod fallback;
pub mod file;
pub mod migrations;

pub use config::{Config, CountdownConfig, RuntimeConfig, StorageBackend, StorageConfig};
pub use database::Database;
pub use fallback::FallbackStore;
pub use file::JsonFileStore;

use std::path::PathBuf;

use crate::board::Board;
use crate::error::Result;

/// Where the board is persisted between runs.
pub trait StateStore: Send {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<Board>>;

    fn save(&mut self, board: &Board) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Keeps the board in memory only. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    board: Option<Board>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(board: Board) -> Self {
        Self {
            board: Some(board),
            saves: 0,
        }
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Board>> {
        Ok(self.board.clone())
    }

    fn save(&mut self, board: &Board) -> Result<()> {
        self.board = Some(board.clone());
        self.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

/// Open the store selected by `config`.
///
/// With the SQLite backend the JSON data file stands behind the database: it
/// seeds an empty database and takes over whenever the database fails. A
/// database that cannot be opened at all leaves the data file on its own.
pub fn open_store(config: &Config) -> Result<Box<dyn StateStore>> {
    let dir = data_dir()?;
    let file = JsonFileStore::new(config.storage.data_file_path(&dir));
    match config.storage.backend {
        StorageBackend::File => Ok(Box::new(file)),
        StorageBackend::Sqlite => {
            match Database::open_at(config.storage.database_file_path(&dir)) {
                Ok(db) => Ok(Box::new(FallbackStore::new(Box::new(db), Box::new(file)))),
                Err(e) => {
                    tracing::error!("database unavailable, using {}: {e}", file.describe());
                    Ok(Box::new(file))
                }
            }
        }
    }
}

/// Returns `$HOUSECAST_DATA_DIR`, or `~/.config/housecast[-dev]/` based on
/// HOUSECAST_ENV.
///
/// Set HOUSECAST_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HOUSECAST_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("HOUSECAST_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("housecast-dev")
            } else {
                base_dir.join("housecast")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
