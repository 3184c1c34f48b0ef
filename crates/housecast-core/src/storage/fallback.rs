//! Primary store backed by a secondary one.
//!
//! Reads and writes go to the primary (the database). When it fails, the
//! secondary (the data file) is used instead so the board is never lost. An
//! empty primary is seeded from the secondary on first load.

use super::StateStore;
use crate::board::Board;
use crate::error::Result;

pub struct FallbackStore {
    primary: Box<dyn StateStore>,
    secondary: Box<dyn StateStore>,
}

impl FallbackStore {
    pub fn new(primary: Box<dyn StateStore>, secondary: Box<dyn StateStore>) -> Self {
        Self { primary, secondary }
    }
}

impl StateStore for FallbackStore {
    fn load(&mut self) -> Result<Option<Board>> {
        match self.primary.load() {
            Ok(Some(board)) => Ok(Some(board)),
            Ok(None) => {
                let seed = self.secondary.load()?;
                if let Some(board) = &seed {
                    match self.primary.save(board) {
                        Ok(()) => tracing::info!(
                            from = %self.secondary.describe(),
                            to = %self.primary.describe(),
                            "migrated board"
                        ),
                        Err(e) => tracing::warn!(
                            store = %self.primary.describe(),
                            "could not migrate board: {e}"
                        ),
                    }
                }
                Ok(seed)
            }
            Err(e) => {
                tracing::error!(
                    store = %self.primary.describe(),
                    fallback = %self.secondary.describe(),
                    "load failed, using fallback: {e}"
                );
                self.secondary.load()
            }
        }
    }

    fn save(&mut self, board: &Board) -> Result<()> {
        if let Err(e) = self.primary.save(board) {
            tracing::error!(
                store = %self.primary.describe(),
                fallback = %self.secondary.describe(),
                "save failed, using fallback: {e}"
            );
            return self.secondary.save(board);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} (fallback {})", self.primary.describe(), self.secondary.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Day;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    /// Every operation fails, like a database that went away.
    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&mut self) -> Result<Option<Board>> {
            Err(StorageError::Locked.into())
        }

        fn save(&mut self, _board: &Board) -> Result<()> {
            Err(StorageError::QueryFailed("disk I/O error".into()).into())
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    fn board_on(day: Day) -> Board {
        Board {
            active_day: day,
            ..Board::default()
        }
    }

    #[test]
    fn failed_load_reads_the_secondary() {
        let mut store = FallbackStore::new(
            Box::new(BrokenStore),
            Box::new(MemoryStore::with_board(board_on(Day::Tuesday))),
        );
        assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Tuesday));
    }

    #[test]
    fn failed_save_writes_the_secondary() {
        let mut store = FallbackStore::new(Box::new(BrokenStore), Box::new(MemoryStore::new()));
        store.save(&board_on(Day::Thursday)).unwrap();
        // Reads fall through to the copy the secondary kept.
        assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Thursday));
    }

    #[test]
    fn healthy_primary_is_preferred() {
        let mut store = FallbackStore::new(
            Box::new(MemoryStore::with_board(board_on(Day::Friday))),
            Box::new(MemoryStore::with_board(board_on(Day::Sunday))),
        );
        assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Friday));
        store.save(&board_on(Day::Monday)).unwrap();
        assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Monday));
    }

    #[test]
    fn empty_primary_is_seeded_from_secondary() {
        let mut store = FallbackStore::new(
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::with_board(board_on(Day::Saturday))),
        );
        assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Saturday));
        assert!(store.describe().starts_with("memory (fallback"));
    }

    #[test]
    fn both_empty_is_a_fresh_start() {
        let mut store = FallbackStore::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()));
        assert!(store.load().unwrap().is_none());
    }
}
