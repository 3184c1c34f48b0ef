//! Runtime hub.
//!
//! Owns the board, applies control commands, advances the pre-start
//! countdown once per tick and publishes a [`RuntimeSnapshot`] after every
//! change. All writes go through one async mutex, so a tick can never
//! interleave with a half-applied command.
//!
//! ## Usage
//!
//! ```ignore
//! let hub = Hub::open(store, Arc::new(SystemClock))?;
//! let mut rx = hub.subscribe();
//! let ticker = hub.spawn_ticker(Duration::from_secs(1));
//! hub.apply(ControlCommand::Play { day: Day::Monday, countdown_seconds: 10 }).await?;
//! while let Ok(snapshot) = rx.recv().await { /* push to displays */ }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::board::{Board, Day, HouseId, RuntimeSnapshot, Workout};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{timestamp, Event};
use crate::storage::StateStore;
use crate::timer::{CountdownTick, Program, TimerSpec};

/// Countdown used when a play command doesn't name one.
pub const DEFAULT_COUNTDOWN_SECS: u64 = 10;

/// Parameters an edited program starts from before the editor's values are
/// laid over it.
const TIMER_UPDATE_DEFAULTS: [(&str, u64); 3] = [("total", 600), ("blocks", 1), ("changeover", 0)];

const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

fn default_countdown_secs() -> u64 {
    DEFAULT_COUNTDOWN_SECS
}

/// A control-panel action, in the same vocabulary the panel sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlCommand {
    SetDay {
        day: Day,
    },
    UpdateWorkout {
        day: Day,
        house: HouseId,
        workout: Workout,
    },
    UpdateTimer {
        day: Day,
        house: HouseId,
        timer: TimerSpec,
    },
    #[serde(rename_all = "camelCase")]
    Play {
        day: Day,
        #[serde(default = "default_countdown_secs")]
        countdown_seconds: u64,
    },
    Pause {
        day: Day,
    },
    Resume {
        day: Day,
    },
    Stop {
        day: Day,
    },
}

struct Inner {
    board: Board,
    store: Box<dyn StateStore>,
}

impl Inner {
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.board) {
            tracing::error!(store = %self.store.describe(), "failed to save board: {e}");
        }
    }
}

/// Shared handle; clones refer to the same board.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
    tx: broadcast::Sender<RuntimeSnapshot>,
}

impl Hub {
    pub fn new(board: Board, store: Box<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner { board, store })),
            clock,
            tx,
        }
    }

    /// Load the board from `store`, falling back to a fresh board.
    ///
    /// # Errors
    /// Returns an error if the store holds a board that cannot be read.
    pub fn open(mut store: Box<dyn StateStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut board = match store.load()? {
            Some(board) => {
                tracing::info!(store = %store.describe(), "loaded board");
                board
            }
            None => {
                tracing::info!(store = %store.describe(), "no saved board, starting fresh");
                Board::default()
            }
        };
        board.normalize();
        Ok(Self::new(board, store, clock))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeSnapshot> {
        self.tx.subscribe()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub async fn board(&self) -> Board {
        self.inner.lock().await.board.clone()
    }

    /// Runtime view of the active day right now.
    pub async fn snapshot(&self) -> RuntimeSnapshot {
        let inner = self.inner.lock().await;
        inner.board.snapshot(self.clock.now_ms())
    }

    pub async fn snapshot_for(&self, day: Day) -> RuntimeSnapshot {
        let inner = self.inner.lock().await;
        inner.board.snapshot_for(day, self.clock.now_ms())
    }

    /// Replace the whole board (data import) and publish.
    pub async fn replace_board(&self, mut board: Board) -> RuntimeSnapshot {
        board.normalize();
        let mut inner = self.inner.lock().await;
        inner.board = board;
        inner.persist();
        let snapshot = inner.board.snapshot(self.clock.now_ms());
        drop(inner);
        self.publish(snapshot.clone());
        snapshot
    }

    /// Apply one control command, persist, and publish.
    ///
    /// Returns `None` when the command changed nothing (pausing a paused
    /// day, resuming a running one); the board is still saved and a snapshot
    /// still goes out, exactly as for any other command.
    pub async fn apply(&self, command: ControlCommand) -> Result<Option<Event>> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now_ms();
        let at = timestamp(now);
        let board = &mut inner.board;

        let event = match command {
            ControlCommand::SetDay { day } => {
                board.active_day = day;
                Some(Event::DaySelected { day, at })
            }
            ControlCommand::UpdateWorkout { day, house, workout } => {
                board.day_mut(day).house_mut(house).workout = workout;
                Some(Event::WorkoutUpdated { day, house, at })
            }
            ControlCommand::UpdateTimer { day, house, mut timer } => {
                timer.fill_missing(&TIMER_UPDATE_DEFAULTS);
                let program = Program::from(timer);
                let mode = program.mode();
                if mode.is_none() {
                    tracing::warn!(%day, %house, "timer saved with unrecognized mode");
                }
                board.day_mut(day).house_mut(house).timer = program;
                Some(Event::TimerUpdated { day, house, mode, at })
            }
            ControlCommand::Play {
                day,
                countdown_seconds,
            } => {
                board.day_mut(day).record.play(countdown_seconds);
                Some(Event::CountdownStarted {
                    day,
                    seconds: countdown_seconds,
                    at,
                })
            }
            ControlCommand::Pause { day } => board
                .day_mut(day)
                .record
                .pause(now)
                .then_some(Event::TimerPaused { day, at }),
            ControlCommand::Resume { day } => {
                let record = &mut board.day_mut(day).record;
                match record.pause_at {
                    Some(paused_at) => {
                        record.resume(now);
                        Some(Event::TimerResumed {
                            day,
                            paused_ms: now.saturating_sub(paused_at),
                            at,
                        })
                    }
                    None => None,
                }
            }
            ControlCommand::Stop { day } => {
                board.day_mut(day).record.stop();
                Some(Event::TimerStopped { day, at })
            }
        };

        match &event {
            Some(event) => tracing::info!(?event, "applied control command"),
            None => tracing::debug!("control command changed nothing"),
        }

        inner.persist();
        let snapshot = inner.board.snapshot(now);
        drop(inner);
        self.publish(snapshot.clone());
        Ok(event)
    }

    /// One runtime tick: advance the active day's countdown and publish.
    pub async fn tick(&self) -> (RuntimeSnapshot, Option<Event>) {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now_ms();
        let day = inner.board.active_day;

        let event = match inner.board.day_mut(day).record.tick_countdown(now) {
            CountdownTick::Inactive | CountdownTick::Held => None,
            CountdownTick::Decremented(remaining) => {
                tracing::trace!(%day, remaining, "countdown");
                inner.persist();
                None
            }
            CountdownTick::Started(started_at) => {
                tracing::info!(%day, "countdown finished, timer running");
                inner.persist();
                Some(Event::TimerStarted {
                    day,
                    at: timestamp(started_at),
                })
            }
        };

        let snapshot = inner.board.snapshot(now);
        drop(inner);
        self.publish(snapshot.clone());
        (snapshot, event)
    }

    /// Run [`Hub::tick`] every `period` until the handle is aborted.
    ///
    /// The first tick fires one period from now.
    pub fn spawn_ticker(&self, period: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                hub.tick().await;
            }
        })
    }

    fn publish(&self, snapshot: RuntimeSnapshot) {
        // No subscribers is fine; nobody is watching yet.
        let _ = self.tx.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use crate::timer::Phase;
    use serde_json::json;

    fn hub_at(start_ms: u64) -> (Hub, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start_ms));
        let hub = Hub::new(Board::default(), Box::new(MemoryStore::new()), clock.clone());
        (hub, clock)
    }

    fn house(n: u32) -> HouseId {
        HouseId::new(n).unwrap()
    }

    #[test]
    fn commands_parse_from_panel_json() {
        let cmd: ControlCommand =
            serde_json::from_value(json!({"action": "play", "day": "monday"})).unwrap();
        assert_eq!(
            cmd,
            ControlCommand::Play { day: Day::Monday, countdown_seconds: 10 }
        );

        let cmd: ControlCommand = serde_json::from_value(json!({
            "action": "updateTimer",
            "day": "tuesday",
            "house": 2,
            "timer": {"mode": "emom", "params": {"total": 300}}
        }))
        .unwrap();
        assert!(matches!(cmd, ControlCommand::UpdateTimer { day: Day::Tuesday, .. }));

        assert!(serde_json::from_value::<ControlCommand>(
            json!({"action": "pause", "day": "someday"})
        )
        .is_err());
        assert!(serde_json::from_value::<ControlCommand>(
            json!({"action": "updateWorkout", "day": "monday", "house": 9, "workout": {}})
        )
        .is_err());
    }

    #[tokio::test]
    async fn countdown_ticks_into_running() {
        let (hub, clock) = hub_at(1_000_000);
        hub.apply(ControlCommand::Play { day: Day::Monday, countdown_seconds: 2 })
            .await
            .unwrap();
        assert_eq!(hub.snapshot().await.houses[&house(1)].runtime.phase, Phase::Countdown);

        clock.advance_secs(1);
        let (snap, event) = hub.tick().await;
        assert!(event.is_none());
        assert_eq!(snap.countdown.remaining, 1);
        assert_eq!(snap.houses[&house(1)].runtime.remaining, Some(1));

        clock.advance_secs(1);
        let (snap, event) = hub.tick().await;
        assert!(matches!(event, Some(Event::TimerStarted { day: Day::Monday, .. })));
        assert!(!snap.countdown.active);
        let runtime = &snap.houses[&house(1)].runtime;
        assert_eq!((runtime.phase, runtime.remaining), (Phase::Active, Some(600)));
        assert_eq!(hub.board().await.days[&Day::Monday].record.started_at, Some(1_002_000));
    }

    #[tokio::test]
    async fn ticks_only_touch_the_active_day() {
        let (hub, clock) = hub_at(0);
        hub.apply(ControlCommand::Play { day: Day::Friday, countdown_seconds: 3 })
            .await
            .unwrap();
        clock.advance_secs(1);
        hub.tick().await;
        let board = hub.board().await;
        assert_eq!(board.days[&Day::Friday].record.countdown.remaining, 3);
    }

    #[tokio::test]
    async fn pause_and_resume_keep_elapsed_continuous() {
        let (hub, clock) = hub_at(0);
        hub.apply(ControlCommand::Play { day: Day::Monday, countdown_seconds: 0 })
            .await
            .unwrap();
        hub.tick().await;

        clock.advance_secs(100);
        let event = hub.apply(ControlCommand::Pause { day: Day::Monday }).await.unwrap();
        assert!(matches!(event, Some(Event::TimerPaused { .. })));
        assert!(hub.apply(ControlCommand::Pause { day: Day::Monday }).await.unwrap().is_none());

        clock.advance_secs(45);
        assert_eq!(hub.snapshot().await.houses[&house(2)].runtime.remaining, Some(500));

        let event = hub.apply(ControlCommand::Resume { day: Day::Monday }).await.unwrap();
        assert!(matches!(event, Some(Event::TimerResumed { paused_ms: 45_000, .. })));
        clock.advance_secs(10);
        assert_eq!(hub.snapshot().await.houses[&house(2)].runtime.remaining, Some(490));
    }

    #[tokio::test]
    async fn update_timer_lays_params_over_edit_defaults() {
        let (hub, _clock) = hub_at(0);
        let timer = TimerSpec::new("fortime").with_param("blocks", 3);
        hub.apply(ControlCommand::UpdateTimer { day: Day::Monday, house: house(3), timer })
            .await
            .unwrap();
        let board = hub.board().await;
        assert_eq!(
            board.days[&Day::Monday].houses[&house(3)].timer,
            Program::ForTime(crate::timer::ForTime { total: 600, blocks: 3, changeover: 0 })
        );
    }

    #[tokio::test]
    async fn every_command_publishes_a_snapshot() {
        let (hub, _clock) = hub_at(0);
        let mut rx = hub.subscribe();
        hub.apply(ControlCommand::SetDay { day: Day::Sunday }).await.unwrap();
        let snap = rx.recv().await.unwrap();
        assert_eq!(snap.active_day, Day::Sunday);

        hub.apply(ControlCommand::Resume { day: Day::Sunday }).await.unwrap();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn stop_returns_houses_to_idle() {
        let (hub, _clock) = hub_at(0);
        hub.apply(ControlCommand::Play { day: Day::Monday, countdown_seconds: 5 })
            .await
            .unwrap();
        hub.apply(ControlCommand::Stop { day: Day::Monday }).await.unwrap();
        let snap = hub.snapshot().await;
        assert!(snap.houses.values().all(|h| h.runtime.phase == Phase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_runs_on_its_period() {
        let (hub, clock) = hub_at(0);
        hub.apply(ControlCommand::Play { day: Day::Monday, countdown_seconds: 3 })
            .await
            .unwrap();
        let mut rx = hub.subscribe();
        let ticker = hub.spawn_ticker(Duration::from_secs(1));
        for expected in [2, 1] {
            clock.advance_secs(1);
            let snap = rx.recv().await.unwrap();
            assert_eq!(snap.countdown.remaining, expected);
        }
        ticker.abort();
    }
}
