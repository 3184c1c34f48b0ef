//! # Housecast Core Library
//!
//! This library drives synchronized workout displays ("houses") from a single
//! control panel. Operators give each house a workout card and a timer program
//! per day; every display renders a live countdown derived from that program.
//!
//! ## Architecture
//!
//! - **Phase engine**: a pure function from (program, schedule record, now) to
//!   the current phase and time remaining. It keeps no state and never
//!   touches the clock itself.
//! - **Board**: the persisted state, seven days of three houses each.
//! - **Hub**: owns the board, applies control commands, ticks the pre-start
//!   countdown and publishes runtime snapshots.
//! - **Storage**: SQLite or JSON-file board storage and TOML configuration.
//!
//! ## Key Components
//!
//! - [`resolve_phase`]: the phase engine
//! - [`Program`]: timer program, one variant per mode
//! - [`ScheduleRecord`]: countdown / start / pause control block
//! - [`Hub`]: runtime broadcaster and control surface
//! - [`Config`]: application configuration management

pub mod board;
pub mod clock;
pub mod error;
pub mod events;
pub mod hub;
pub mod storage;
pub mod timer;

pub use board::{Board, Day, DayState, Exercise, HouseId, HouseRuntime, HouseState, RuntimeSnapshot, Workout};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use hub::{ControlCommand, Hub, DEFAULT_COUNTDOWN_SECS};
pub use storage::{Config, Database, FallbackStore, JsonFileStore, MemoryStore, StateStore};
pub use timer::{resolve_phase, Mode, Phase, PhaseResult, Program, ScheduleRecord, Subphase, TimerSpec};
