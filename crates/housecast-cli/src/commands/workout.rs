use clap::Subcommand;
use housecast_core::{Config, ControlCommand, Day, Exercise, HouseId};

use super::{open_hub, parse_house, print_json, target_day, CliResult};

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Edit a house's workout card; omitted fields keep their current value
    Set {
        /// House number (1-3)
        #[arg(value_parser = parse_house)]
        house: HouseId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        label: Option<String>,
        /// Display scale factor
        #[arg(long)]
        font_size: Option<f64>,
        #[arg(long)]
        show_sets: Option<bool>,
        /// Exercise row as "name:sets:reps"; repeatable, replaces the list
        #[arg(long = "exercise", value_name = "NAME:SETS:REPS")]
        exercises: Vec<Exercise>,
        /// Day to edit (defaults to the active day)
        #[arg(long)]
        day: Option<Day>,
    },
}

pub async fn run(action: WorkoutAction) -> CliResult {
    match action {
        WorkoutAction::Set {
            house,
            title,
            label,
            font_size,
            show_sets,
            exercises,
            day,
        } => {
            let config = Config::load()?;
            let hub = open_hub(&config)?;
            let day = target_day(&hub, day).await;

            let mut workout = hub
                .board()
                .await
                .day(day)
                .and_then(|d| d.houses.get(&house))
                .map(|h| h.workout.clone())
                .unwrap_or_default();
            if title.is_some() {
                workout.title = title;
            }
            if let Some(label) = label {
                workout.label = label;
            }
            if let Some(font_size) = font_size.filter(|f| f.is_finite() && *f != 0.0) {
                workout.font_size = font_size;
            }
            if let Some(show_sets) = show_sets {
                workout.show_sets = show_sets;
            }
            if !exercises.is_empty() {
                workout.exercises = exercises;
            }

            hub.apply(ControlCommand::UpdateWorkout {
                day,
                house,
                workout: workout.clone(),
            })
            .await?;
            print_json(&workout)?;
        }
    }
    Ok(())
}
