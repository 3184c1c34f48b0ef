//! Schedule record: the temporal control block for one day.
//!
//! All timestamps are epoch milliseconds. The record is only ever mutated by
//! control actions (`play`/`pause`/`resume`/`stop`) and by the runtime tick's
//! countdown step; the phase engine reads it and never writes.

use serde::{Deserialize, Serialize};

/// Pre-start countdown state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub remaining: u64,
}

/// Which top-level mode a record is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Idle,
    Countdown,
    Running,
    Paused,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// No countdown in progress.
    Inactive,
    /// Countdown is paused; nothing changed.
    Held,
    /// One second was taken off; this many remain.
    Decremented(u64),
    /// Countdown hit zero and the main timer started at this instant.
    Started(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    #[serde(default)]
    pub countdown: Countdown,
    /// When the main timer began (not the countdown).
    #[serde(default)]
    pub started_at: Option<u64>,
    /// When the current pause began; `None` while running.
    #[serde(default)]
    pub pause_at: Option<u64>,
}

impl ScheduleRecord {
    pub fn state(&self) -> RecordState {
        if self.countdown.active {
            RecordState::Countdown
        } else if self.started_at.is_none() {
            RecordState::Idle
        } else if self.pause_at.is_some() {
            RecordState::Paused
        } else {
            RecordState::Running
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_at.is_some()
    }

    /// Restart from a fresh pre-start countdown, discarding any run.
    pub fn play(&mut self, countdown_secs: u64) {
        self.countdown = Countdown {
            active: true,
            remaining: countdown_secs,
        };
        self.started_at = None;
        self.pause_at = None;
    }

    /// Freeze the clock. Returns `false` when already paused.
    ///
    /// Pausing during the countdown holds the countdown.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.pause_at.is_some() {
            return false;
        }
        self.pause_at = Some(now_ms);
        true
    }

    /// Unfreeze the clock, shifting `started_at` forward by the paused span.
    /// Returns `false` when not paused.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        let Some(paused_at) = self.pause_at.take() else {
            return false;
        };
        if let Some(started) = self.started_at {
            self.started_at = Some(started.saturating_add(now_ms.saturating_sub(paused_at)));
        }
        true
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.pause_at = None;
        self.countdown = Countdown::default();
    }

    /// Advance the pre-start countdown by one second.
    ///
    /// This is the only transition from countdown into the running state.
    pub fn tick_countdown(&mut self, now_ms: u64) -> CountdownTick {
        if !self.countdown.active {
            return CountdownTick::Inactive;
        }
        if self.is_paused() {
            return CountdownTick::Held;
        }
        self.countdown.remaining = self.countdown.remaining.saturating_sub(1);
        if self.countdown.remaining == 0 {
            self.countdown.active = false;
            self.started_at = Some(now_ms);
            CountdownTick::Started(now_ms)
        } else {
            CountdownTick::Decremented(self.countdown.remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_discards_run_in_progress() {
        let mut record = ScheduleRecord {
            countdown: Countdown::default(),
            started_at: Some(1_000),
            pause_at: Some(5_000),
        };
        record.play(10);
        assert_eq!(record.state(), RecordState::Countdown);
        assert_eq!(record.countdown, Countdown { active: true, remaining: 10 });
        assert_eq!(record.started_at, None);
        assert_eq!(record.pause_at, None);
    }

    #[test]
    fn countdown_starts_timer_at_zero() {
        let mut record = ScheduleRecord::default();
        record.play(2);
        assert_eq!(record.tick_countdown(1_000), CountdownTick::Decremented(1));
        assert_eq!(record.tick_countdown(2_000), CountdownTick::Started(2_000));
        assert_eq!(record.state(), RecordState::Running);
        assert_eq!(record.started_at, Some(2_000));
        assert_eq!(record.tick_countdown(3_000), CountdownTick::Inactive);
    }

    #[test]
    fn zero_second_countdown_starts_on_first_tick() {
        let mut record = ScheduleRecord::default();
        record.play(0);
        assert_eq!(record.tick_countdown(7_000), CountdownTick::Started(7_000));
    }

    #[test]
    fn pause_holds_countdown() {
        let mut record = ScheduleRecord::default();
        record.play(5);
        assert!(record.pause(1_000));
        assert_eq!(record.tick_countdown(2_000), CountdownTick::Held);
        assert_eq!(record.countdown.remaining, 5);
        assert!(record.resume(3_000));
        assert_eq!(record.started_at, None);
        assert_eq!(record.tick_countdown(4_000), CountdownTick::Decremented(4));
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut record = ScheduleRecord {
            started_at: Some(10_000),
            ..Default::default()
        };
        assert!(!record.resume(11_000));
        assert!(record.pause(12_000));
        assert!(!record.pause(13_000));
        assert_eq!(record.pause_at, Some(12_000));
        assert_eq!(record.state(), RecordState::Paused);
    }

    #[test]
    fn resume_shifts_start_by_paused_span() {
        let mut record = ScheduleRecord {
            started_at: Some(10_000),
            ..Default::default()
        };
        record.pause(40_000);
        record.resume(100_000);
        assert_eq!(record.started_at, Some(70_000));
        assert_eq!(record.pause_at, None);
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut record = ScheduleRecord::default();
        record.play(3);
        record.pause(1);
        record.stop();
        assert_eq!(record, ScheduleRecord::default());
        assert_eq!(record.state(), RecordState::Idle);
    }

    #[test]
    fn serializes_camel_case_with_nulls() {
        let json = serde_json::to_value(ScheduleRecord::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "countdown": {"active": false, "remaining": 0},
                "startedAt": null,
                "pauseAt": null
            })
        );
    }
}
