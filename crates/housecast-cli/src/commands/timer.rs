use clap::Subcommand;
use housecast_core::timer::TimerSpec;
use housecast_core::{Config, ControlCommand, Day, HouseId};

use super::{open_hub, parse_house, print_json, target_day, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Replace a house's timer program
    Set {
        /// House number (1-3)
        #[arg(value_parser = parse_house)]
        house: HouseId,
        /// Timer mode (fortime, interval, emom, rounds)
        #[arg(long)]
        mode: String,
        /// Program parameter as key=value; repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Day to edit (defaults to the active day)
        #[arg(long)]
        day: Option<Day>,
    },
}

pub async fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Set {
            house,
            mode,
            params,
            day,
        } => {
            let mut timer = TimerSpec::new(mode);
            for pair in &params {
                timer.insert_pair(pair)?;
            }

            let config = Config::load()?;
            let hub = open_hub(&config)?;
            let day = target_day(&hub, day).await;
            hub.apply(ControlCommand::UpdateTimer { day, house, timer })
                .await?;

            let board = hub.board().await;
            if let Some(state) = board.day(day).and_then(|d| d.houses.get(&house)) {
                print_json(&state.timer)?;
            }
        }
    }
    Ok(())
}
