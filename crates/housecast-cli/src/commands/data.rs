use std::path::PathBuf;

use clap::Subcommand;
use housecast_core::storage::file::{read_board, write_board};
use housecast_core::Config;

use super::{open_hub, CliResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write the whole board as JSON
    Export {
        /// Destination file
        file: PathBuf,
    },
    /// Replace the whole board with a JSON file
    Import {
        /// Source file
        file: PathBuf,
    },
}

pub async fn run(action: DataAction) -> CliResult {
    let config = Config::load()?;
    let hub = open_hub(&config)?;

    match action {
        DataAction::Export { file } => {
            write_board(&file, &hub.board().await)?;
            eprintln!("board exported to {}", file.display());
        }
        DataAction::Import { file } => {
            let board = read_board(&file)?
                .ok_or_else(|| format!("{} does not exist", file.display()))?;
            let snapshot = hub.replace_board(board).await;
            eprintln!(
                "board imported from {} (active day: {})",
                file.display(),
                snapshot.active_day
            );
        }
    }
    Ok(())
}
