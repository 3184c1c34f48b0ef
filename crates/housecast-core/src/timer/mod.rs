mod phase;
mod program;
mod record;

pub use phase::{
    resolve_elapsed, resolve_phase, ModeEcho, Phase, PhaseResult, Subphase, ROUNDS_PER_BLOCK,
};
pub use program::{Emom, ForTime, Interval, Mode, Program, Rounds, TimerSpec, EMOM_ROUND_SECS};
pub use record::{Countdown, CountdownTick, RecordState, ScheduleRecord};
