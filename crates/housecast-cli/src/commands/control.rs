use clap::Subcommand;
use housecast_core::{Config, ControlCommand, Day};

use super::{open_hub, print_json, target_day, CliResult};

#[derive(Subcommand)]
pub enum ControlAction {
    /// Start a fresh pre-start countdown
    Play {
        /// Countdown seconds (defaults to countdown.default_seconds)
        #[arg(long)]
        countdown: Option<u64>,
        #[arg(long)]
        day: Option<Day>,
    },
    /// Freeze the clock
    Pause {
        #[arg(long)]
        day: Option<Day>,
    },
    /// Continue after a pause
    Resume {
        #[arg(long)]
        day: Option<Day>,
    },
    /// Return every house to idle
    Stop {
        #[arg(long)]
        day: Option<Day>,
    },
}

pub async fn run(action: ControlAction) -> CliResult {
    let config = Config::load()?;
    let hub = open_hub(&config)?;

    let command = match action {
        ControlAction::Play { countdown, day } => ControlCommand::Play {
            day: target_day(&hub, day).await,
            countdown_seconds: countdown.unwrap_or(config.countdown.default_seconds),
        },
        ControlAction::Pause { day } => ControlCommand::Pause {
            day: target_day(&hub, day).await,
        },
        ControlAction::Resume { day } => ControlCommand::Resume {
            day: target_day(&hub, day).await,
        },
        ControlAction::Stop { day } => ControlCommand::Stop {
            day: target_day(&hub, day).await,
        },
    };

    match hub.apply(command).await? {
        Some(event) => print_json(&event),
        None => print_json(&hub.snapshot().await),
    }
}
