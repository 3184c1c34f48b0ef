//! Timer phase computation.
//!
//! [`resolve_phase`] is a pure function of a program, a schedule record and
//! the current wall-clock time. It keeps no state between calls, so a ticker
//! may evaluate it as often as it likes and always see the same answer for the
//! same inputs.
//!
//! ## Evaluation order
//!
//! ```text
//! countdown.active      -> Countdown(remaining)
//! started_at == None    -> Idle
//! otherwise             -> elapsed = (pause_at or now) - started_at
//!                          dispatch on mode
//! ```
//!
//! Block-based modes (fortime, interval, rounds) share one cycle layout:
//!
//! ```text
//! |<-- block_len -->|<- changeover ->|<-- block_len -->|<- changeover ->| done
//! ```

use serde::Serialize;

use super::program::{Emom, ForTime, Interval, Program, Rounds, EMOM_ROUND_SECS};
use super::record::ScheduleRecord;

/// Halves per block in rounds mode.
pub const ROUNDS_PER_BLOCK: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Countdown,
    Active,
    Work,
    Rest,
    Changeover,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subphase {
    Work,
    Rest,
    Half1,
    Break,
    Half2,
}

/// Resolved parameters echoed back for progress-bar rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ModeEcho {
    #[serde(rename_all = "camelCase")]
    ForTime { per_block: u64, changeover: u64 },
    #[serde(rename_all = "camelCase")]
    Interval {
        on: u64,
        off: u64,
        changeover: u64,
        round_len: u64,
    },
    #[serde(rename_all = "camelCase")]
    Rounds {
        half: u64,
        break_sec: u64,
        changeover: u64,
    },
}

/// One evaluation of a house's timer. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResult {
    pub phase: Phase,
    /// Seconds left in the current phase; `None` only while idle.
    pub remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subphase: Option<Subphase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u64>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub echo: Option<ModeEcho>,
}

impl PhaseResult {
    fn new(phase: Phase, remaining: u64) -> Self {
        Self {
            phase,
            remaining: Some(remaining),
            block_index: None,
            blocks: None,
            subphase: None,
            round: None,
            rounds: None,
            echo: None,
        }
    }

    pub fn idle() -> Self {
        Self {
            remaining: None,
            ..Self::new(Phase::Idle, 0)
        }
    }

    pub fn countdown(remaining: u64) -> Self {
        Self::new(Phase::Countdown, remaining)
    }

    fn in_block(phase: Phase, remaining: u64, block_index: u64, blocks: u64) -> Self {
        Self {
            block_index: Some(block_index),
            blocks: Some(blocks),
            ..Self::new(phase, remaining)
        }
    }

    fn done(blocks: u64) -> Self {
        Self::in_block(Phase::Done, 0, blocks, blocks)
    }

    fn subphase(mut self, subphase: Subphase) -> Self {
        self.subphase = Some(subphase);
        self
    }

    fn round(mut self, round: u64, rounds: u64) -> Self {
        self.round = Some(round);
        self.rounds = Some(rounds);
        self
    }

    fn echo(mut self, echo: ModeEcho) -> Self {
        self.echo = Some(echo);
        self
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

/// Compute the phase of `program` under `record` at `now_ms` (epoch millis).
pub fn resolve_phase(program: &Program, record: &ScheduleRecord, now_ms: u64) -> PhaseResult {
    if record.countdown.active {
        return PhaseResult::countdown(record.countdown.remaining);
    }
    let Some(started_at) = record.started_at else {
        return PhaseResult::idle();
    };

    // A paused record is evaluated at the pause instant.
    let effective_now = record.pause_at.unwrap_or(now_ms);
    let elapsed = effective_now.saturating_sub(started_at) / 1000;

    resolve_elapsed(program, elapsed)
}

/// Mode dispatch for a running program `elapsed` whole seconds in.
pub fn resolve_elapsed(program: &Program, elapsed: u64) -> PhaseResult {
    match program {
        Program::ForTime(p) => resolve_fortime(p, elapsed),
        Program::Interval(p) => resolve_interval(p, elapsed),
        Program::Emom(p) => resolve_emom(p, elapsed),
        Program::Rounds(p) => resolve_rounds(p, elapsed),
        Program::Unrecognized(_) => PhaseResult::idle(),
    }
}

// ── Shared cycle algebra ─────────────────────────────────────────────

/// Where `elapsed` falls in a repeated block + changeover layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CyclePosition {
    Done,
    /// `offset` seconds into the work portion of block `index`.
    Block { index: u64, offset: u64 },
    /// In the changeover after block `index`.
    Changeover { index: u64, remaining: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Cycle {
    block_len: u64,
    changeover: u64,
    blocks: u64,
}

impl Cycle {
    fn locate(self, elapsed: u64) -> CyclePosition {
        let cycle_len = self.block_len.saturating_add(self.changeover);
        // A program with no duration at all is finished as soon as it starts.
        if cycle_len == 0 {
            return CyclePosition::Done;
        }
        let index = elapsed / cycle_len;
        if index >= self.blocks {
            return CyclePosition::Done;
        }
        let in_cycle = elapsed % cycle_len;
        if in_cycle < self.block_len {
            CyclePosition::Block {
                index,
                offset: in_cycle,
            }
        } else {
            CyclePosition::Changeover {
                index,
                remaining: self.changeover - (in_cycle - self.block_len),
            }
        }
    }
}

// ── Per-mode resolvers ───────────────────────────────────────────────

fn resolve_fortime(p: &ForTime, elapsed: u64) -> PhaseResult {
    let cycle = Cycle {
        block_len: p.total,
        changeover: p.changeover,
        blocks: p.blocks,
    };
    let echo = ModeEcho::ForTime {
        per_block: p.total,
        changeover: p.changeover,
    };
    match cycle.locate(elapsed) {
        CyclePosition::Done => PhaseResult::done(p.blocks),
        CyclePosition::Block { index, offset } => {
            PhaseResult::in_block(Phase::Active, p.total - offset, index, p.blocks)
                .subphase(Subphase::Work)
                .echo(echo)
        }
        CyclePosition::Changeover { index, remaining } => {
            PhaseResult::in_block(Phase::Changeover, remaining, index, p.blocks)
                .subphase(Subphase::Rest)
                .echo(echo)
        }
    }
}

fn resolve_interval(p: &Interval, elapsed: u64) -> PhaseResult {
    let round_len = p.on.saturating_add(p.off).max(1);
    let rounds = (p.total / round_len).max(1);
    let cycle = Cycle {
        block_len: rounds.saturating_mul(round_len),
        changeover: p.changeover,
        blocks: p.blocks,
    };
    let echo = ModeEcho::Interval {
        on: p.on,
        off: p.off,
        changeover: p.changeover,
        round_len,
    };
    match cycle.locate(elapsed) {
        CyclePosition::Done => PhaseResult::done(p.blocks),
        CyclePosition::Block { index, offset } => {
            let in_round = offset % round_len;
            let (phase, remaining) = if in_round < p.on {
                (Phase::Work, p.on - in_round)
            } else {
                (Phase::Rest, round_len - in_round)
            };
            PhaseResult::in_block(phase, remaining, index, p.blocks).echo(echo)
        }
        CyclePosition::Changeover { index, remaining } => {
            PhaseResult::in_block(Phase::Changeover, remaining, index, p.blocks).echo(echo)
        }
    }
}

fn resolve_emom(p: &Emom, elapsed: u64) -> PhaseResult {
    if p.total.saturating_sub(elapsed) == 0 {
        return PhaseResult::new(Phase::Done, 0);
    }
    let into_round = elapsed % EMOM_ROUND_SECS;
    let remaining = match (EMOM_ROUND_SECS - into_round) % EMOM_ROUND_SECS {
        0 => EMOM_ROUND_SECS,
        r => r,
    };
    PhaseResult::new(Phase::Active, remaining)
}

fn resolve_rounds(p: &Rounds, elapsed: u64) -> PhaseResult {
    let half = p.half;
    let brk = p.break_secs;
    let cycle = Cycle {
        block_len: half.saturating_add(brk).saturating_add(half),
        changeover: p.changeover,
        blocks: p.blocks,
    };
    let echo = ModeEcho::Rounds {
        half,
        break_sec: brk,
        changeover: p.changeover,
    };
    match cycle.locate(elapsed) {
        CyclePosition::Done => PhaseResult::done(p.blocks)
            .round(ROUNDS_PER_BLOCK, ROUNDS_PER_BLOCK)
            .echo(echo),
        CyclePosition::Block { index, offset } => {
            let result = if offset < half {
                PhaseResult::in_block(Phase::Work, half - offset, index, p.blocks)
                    .subphase(Subphase::Half1)
                    .round(1, ROUNDS_PER_BLOCK)
            } else if offset - half < brk {
                PhaseResult::in_block(Phase::Rest, brk - (offset - half), index, p.blocks)
                    .subphase(Subphase::Break)
                    .round(1, ROUNDS_PER_BLOCK)
            } else {
                // offset < half + brk + half here, so this stays below `half`.
                let into_half2 = offset - half - brk;
                PhaseResult::in_block(Phase::Work, half - into_half2, index, p.blocks)
                    .subphase(Subphase::Half2)
                    .round(2, ROUNDS_PER_BLOCK)
            };
            result.echo(echo)
        }
        CyclePosition::Changeover { index, remaining } => {
            PhaseResult::in_block(Phase::Changeover, remaining, index, p.blocks)
                .round(1, ROUNDS_PER_BLOCK)
                .echo(echo)
        }
    }
}
