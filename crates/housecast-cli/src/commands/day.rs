use clap::Subcommand;
use housecast_core::{Config, ControlCommand, Day};

use super::{open_hub, print_json, CliResult};

#[derive(Subcommand)]
pub enum DayAction {
    /// Print the active day
    Show,
    /// Make a day the active one
    Set {
        /// monday..sunday
        day: Day,
    },
}

pub async fn run(action: DayAction) -> CliResult {
    let config = Config::load()?;
    let hub = open_hub(&config)?;

    match action {
        DayAction::Show => {
            println!("{}", hub.board().await.active_day);
        }
        DayAction::Set { day } => {
            if let Some(event) = hub.apply(ControlCommand::SetDay { day }).await? {
                print_json(&event)?;
            }
        }
    }
    Ok(())
}
