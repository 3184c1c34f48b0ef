pub mod config;
pub mod control;
pub mod data;
pub mod day;
pub mod resolve;
pub mod serve;
pub mod status;
pub mod timer;
pub mod workout;

use std::error::Error;
use std::sync::Arc;

use housecast_core::{storage, Config, Day, HouseId, Hub, SystemClock};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Open the configured store and load the board into a hub.
pub fn open_hub(config: &Config) -> CliResult<Hub> {
    let store = storage::open_store(config)?;
    Ok(Hub::open(store, Arc::new(SystemClock))?)
}

/// `day`, or the board's active day when none was given.
pub async fn target_day(hub: &Hub, day: Option<Day>) -> Day {
    match day {
        Some(day) => day,
        None => hub.board().await.active_day,
    }
}

/// clap value parser for house numbers.
pub fn parse_house(s: &str) -> Result<HouseId, String> {
    let n: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a house number"))?;
    HouseId::new(n).map_err(|e| e.to_string())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
