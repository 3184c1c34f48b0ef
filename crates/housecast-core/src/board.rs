//! Board state: seven days, three houses per day.
//!
//! The board is what gets persisted. Each day carries one schedule record
//! shared by its three houses, and each house carries a workout card and a
//! timer program. The JSON layout matches the data file the displays have
//! always used:
//!
//! ```text
//! { "activeDay": "monday",
//!   "days": { "monday": { "houses": { "1": {...}, "2": {...}, "3": {...} },
//!                         "startedAt": null, "pauseAt": null,
//!                         "countdown": { "active": false, "remaining": 0 } } } }
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::timer::{resolve_phase, Countdown, PhaseResult, Program, ScheduleRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl FromStr for Day {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Day::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| ValidationError::UnknownDay(s.to_string()))
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// House number, 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct HouseId(u8);

impl HouseId {
    pub const COUNT: u8 = 3;
    pub const ALL: [HouseId; 3] = [HouseId(1), HouseId(2), HouseId(3)];

    pub fn new(n: u32) -> Result<Self, ValidationError> {
        if (1..=u32::from(Self::COUNT)).contains(&n) {
            Ok(HouseId(n as u8))
        } else {
            Err(ValidationError::HouseOutOfRange(n))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for HouseId {
    type Error = ValidationError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        HouseId::new(n)
    }
}

impl From<HouseId> for u32 {
    fn from(id: HouseId) -> Self {
        u32::from(id.0)
    }
}

impl std::fmt::Display for HouseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row on a workout card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub sets: String,
    #[serde(default)]
    pub reps: String,
}

/// Parses `name[:sets[:reps]]`.
impl FromStr for Exercise {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':').map(str::trim);
        let exercise = parts.next().unwrap_or_default();
        if exercise.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "exercise".into(),
                message: format!("'{s}' has no exercise name"),
            });
        }
        Ok(Exercise {
            exercise: exercise.to_string(),
            sets: parts.next().unwrap_or_default().to_string(),
            reps: parts.next().unwrap_or_default().to_string(),
        })
    }
}

/// Workout card shown above a house's timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawWorkout")]
pub struct Workout {
    pub exercises: Vec<Exercise>,
    /// Display scale factor.
    pub font_size: f64,
    pub label: String,
    pub show_sets: bool,
    pub title: Option<String>,
}

impl Default for Workout {
    fn default() -> Self {
        Self {
            exercises: Vec::new(),
            font_size: 1.0,
            label: String::new(),
            show_sets: true,
            title: None,
        }
    }
}

/// Lenient incoming shape; every field may be absent or null.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorkout {
    #[serde(default)]
    exercises: Option<Vec<Exercise>>,
    #[serde(default)]
    font_size: Option<f64>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    show_sets: Option<bool>,
    #[serde(default)]
    title: Option<String>,
}

impl From<RawWorkout> for Workout {
    fn from(raw: RawWorkout) -> Self {
        let font_size = raw
            .font_size
            .filter(|f| f.is_finite() && *f != 0.0)
            .unwrap_or(1.0);
        Self {
            exercises: raw.exercises.unwrap_or_default(),
            font_size,
            label: raw.label.unwrap_or_default(),
            show_sets: raw.show_sets != Some(false),
            title: raw.title,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_status() -> String {
    "stopped".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workout: Workout,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timer: Program,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Default for HouseState {
    fn default() -> Self {
        Self {
            workout: Workout::default(),
            timer: Program::default(),
            status: default_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub houses: BTreeMap<HouseId, HouseState>,
    #[serde(flatten)]
    pub record: ScheduleRecord,
}

impl Default for DayState {
    fn default() -> Self {
        Self {
            houses: HouseId::ALL
                .into_iter()
                .map(|id| (id, HouseState::default()))
                .collect(),
            record: ScheduleRecord::default(),
        }
    }
}

impl DayState {
    pub fn house_mut(&mut self, house: HouseId) -> &mut HouseState {
        self.houses.entry(house).or_default()
    }

    /// Evaluate every house against this day's record at one instant.
    pub fn runtime(&self, now_ms: u64) -> BTreeMap<HouseId, HouseRuntime> {
        HouseId::ALL
            .into_iter()
            .map(|id| {
                let house = self.houses.get(&id).cloned().unwrap_or_default();
                let runtime = resolve_phase(&house.timer, &self.record, now_ms);
                (
                    id,
                    HouseRuntime {
                        workout: house.workout,
                        timer: house.timer,
                        status: house.status,
                        runtime,
                    },
                )
            })
            .collect()
    }
}

fn lenient_day<'de, D>(deserializer: D) -> Result<Day, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}

/// Everything the control panel edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default, deserialize_with = "lenient_day")]
    pub active_day: Day,
    #[serde(default)]
    pub days: BTreeMap<Day, DayState>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            active_day: Day::Monday,
            days: Day::ALL
                .into_iter()
                .map(|d| (d, DayState::default()))
                .collect(),
        }
    }
}

impl Board {
    /// Fill in any day or house missing from a loaded board.
    pub fn normalize(&mut self) {
        for day in Day::ALL {
            let state = self.days.entry(day).or_default();
            for house in HouseId::ALL {
                state.houses.entry(house).or_default();
            }
        }
    }

    pub fn day(&self, day: Day) -> Option<&DayState> {
        self.days.get(&day)
    }

    pub fn day_mut(&mut self, day: Day) -> &mut DayState {
        self.days.entry(day).or_default()
    }

    /// Runtime view of the active day, as pushed to the displays.
    pub fn snapshot(&self, now_ms: u64) -> RuntimeSnapshot {
        self.snapshot_for(self.active_day, now_ms)
    }

    pub fn snapshot_for(&self, day: Day, now_ms: u64) -> RuntimeSnapshot {
        let fallback;
        let state = match self.day(day) {
            Some(state) => state,
            None => {
                fallback = DayState::default();
                &fallback
            }
        };
        RuntimeSnapshot {
            active_day: self.active_day,
            day,
            countdown: state.record.countdown,
            houses: state.runtime(now_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseRuntime {
    pub workout: Workout,
    pub timer: Program,
    pub status: String,
    pub runtime: PhaseResult,
}

/// One published frame: every house of a day, evaluated at the same instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub active_day: Day,
    /// Day the houses were evaluated for.
    pub day: Day,
    pub countdown: Countdown,
    pub houses: BTreeMap<HouseId, HouseRuntime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{ForTime, Phase};
    use serde_json::json;

    #[test]
    fn default_board_has_every_day_and_house() {
        let board = Board::default();
        assert_eq!(board.days.len(), 7);
        for state in board.days.values() {
            assert_eq!(state.houses.len(), 3);
        }
    }

    #[test]
    fn loads_sparse_legacy_file() {
        let raw = json!({
            "activeDay": "someday",
            "days": {
                "friday": {
                    "houses": {
                        "2": {
                            "workout": {"exercises": [{"exercise": "Row", "sets": "3"}], "fontSize": null},
                            "timer": {"mode": "emom", "params": {"total": 300}}
                        }
                    },
                    "startedAt": 1000,
                    "pauseAt": null
                }
            }
        });
        let mut board: Board = serde_json::from_value(raw).unwrap();
        assert_eq!(board.active_day, Day::Monday);
        board.normalize();
        assert_eq!(board.days.len(), 7);

        let friday = board.day(Day::Friday).unwrap();
        assert_eq!(friday.record.started_at, Some(1000));
        assert!(!friday.record.countdown.active);

        let house = &friday.houses[&HouseId::new(2).unwrap()];
        assert_eq!(house.workout.font_size, 1.0);
        assert!(house.workout.show_sets);
        assert_eq!(house.workout.exercises[0].reps, "");
        assert_eq!(house.status, "stopped");
        assert_eq!(friday.houses.len(), 3);
    }

    #[test]
    fn board_json_round_trips() {
        let mut board = Board::default();
        board.active_day = Day::Thursday;
        board.day_mut(Day::Thursday).record.play(10);
        board
            .day_mut(Day::Thursday)
            .house_mut(HouseId::new(3).unwrap())
            .timer = Program::ForTime(ForTime { total: 90, blocks: 2, changeover: 15 });
        let text = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&text).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn house_keys_serialize_as_strings() {
        let json = serde_json::to_value(DayState::default()).unwrap();
        let houses = json["houses"].as_object().unwrap();
        assert_eq!(houses.keys().collect::<Vec<_>>(), ["1", "2", "3"]);
        assert_eq!(json["startedAt"], json!(null));
    }

    #[test]
    fn house_numbers_are_validated() {
        assert!(HouseId::new(0).is_err());
        assert!(HouseId::new(4).is_err());
        assert_eq!(HouseId::new(3).unwrap().get(), 3);
        assert!(serde_json::from_value::<HouseId>(json!(7)).is_err());
    }

    #[test]
    fn day_names_parse_case_insensitively() {
        assert_eq!("Sunday".parse::<Day>().unwrap(), Day::Sunday);
        assert!("caturday".parse::<Day>().is_err());
    }

    #[test]
    fn exercise_rows_parse_from_colon_form() {
        let e: Exercise = "Deadlift:5:3".parse().unwrap();
        assert_eq!((e.exercise.as_str(), e.sets.as_str(), e.reps.as_str()), ("Deadlift", "5", "3"));
        let e: Exercise = "Plank".parse().unwrap();
        assert_eq!(e.sets, "");
        assert!(":3:10".parse::<Exercise>().is_err());
    }

    #[test]
    fn snapshot_evaluates_all_houses_at_one_instant() {
        let mut board = Board::default();
        board.day_mut(Day::Monday).record.started_at = Some(0);
        let snap = board.snapshot(30_000);
        assert_eq!(snap.houses.len(), 3);
        for house in snap.houses.values() {
            assert_eq!(house.runtime.phase, Phase::Active);
            assert_eq!(house.runtime.remaining, Some(570));
        }
    }

    #[test]
    fn workout_update_coerces_blank_fields() {
        let w: Workout = serde_json::from_value(json!({
            "exercises": null,
            "fontSize": 0,
            "showSets": null,
            "title": "Leg day"
        }))
        .unwrap();
        assert!(w.exercises.is_empty());
        assert_eq!(w.font_size, 1.0);
        assert!(w.show_sets);
        assert_eq!(w.title.as_deref(), Some("Leg day"));
    }
}
