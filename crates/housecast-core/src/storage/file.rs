//! JSON data-file storage (`data.json`).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::StateStore;
use crate::board::Board;
use crate::error::{Result, StorageError};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read a board from a JSON file. Missing files yield `Ok(None)`.
pub fn read_board(path: &Path) -> Result<Option<Board>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::File {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into())
        }
    };
    let mut board: Board = serde_json::from_str(&content)?;
    board.normalize();
    Ok(Some(board))
}

/// Write a board as pretty-printed JSON.
pub fn write_board(path: &Path, board: &Board) -> Result<()> {
    let content = serde_json::to_string_pretty(board)?;
    std::fs::write(path, content).map_err(|e| StorageError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

impl StateStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<Board>> {
        read_board(&self.path)
    }

    fn save(&mut self, board: &Board) -> Result<()> {
        write_board(&self.path, board)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
