use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Day, HouseId};
use crate::timer::Mode;

/// Every state change made through the hub produces an Event.
/// The CLI prints them; the hub logs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    DaySelected {
        day: Day,
        at: DateTime<Utc>,
    },
    WorkoutUpdated {
        day: Day,
        house: HouseId,
        at: DateTime<Utc>,
    },
    /// `mode` is `None` when the editor sent a mode this build doesn't know.
    TimerUpdated {
        day: Day,
        house: HouseId,
        mode: Option<Mode>,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        day: Day,
        seconds: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero and the main timer began.
    TimerStarted {
        day: Day,
        at: DateTime<Utc>,
    },
    TimerPaused {
        day: Day,
        at: DateTime<Utc>,
    },
    TimerResumed {
        day: Day,
        paused_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        day: Day,
        at: DateTime<Utc>,
    },
}

/// Epoch milliseconds as a UTC timestamp.
pub fn timestamp(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
