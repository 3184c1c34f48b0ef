use housecast_core::{Config, Day};

use super::{open_hub, print_json, target_day, CliResult};

pub async fn run(day: Option<Day>) -> CliResult {
    let config = Config::load()?;
    let hub = open_hub(&config)?;
    let day = target_day(&hub, day).await;
    print_json(&hub.snapshot_for(day).await)
}
