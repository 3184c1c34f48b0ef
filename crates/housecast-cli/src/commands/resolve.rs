use clap::Args;
use housecast_core::timer::{resolve_phase, Program, ScheduleRecord, TimerSpec};

use super::{print_json, CliResult};

#[derive(Args)]
pub struct ResolveArgs {
    /// Timer mode (fortime, interval, emom, rounds)
    #[arg(long)]
    pub mode: String,
    /// Program parameter as key=value; repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
    /// Seconds since the timer started
    #[arg(long, default_value = "0")]
    pub elapsed: u64,
    /// Evaluate as paused at `elapsed`, an hour later
    #[arg(long)]
    pub paused: bool,
}

const PAUSED_LOOKAHEAD_MS: u64 = 3_600_000;

pub fn run(args: ResolveArgs) -> CliResult {
    let mut spec = TimerSpec::new(args.mode);
    for pair in &args.params {
        spec.insert_pair(pair)?;
    }
    let program = Program::from(spec);
    if program.mode().is_none() {
        tracing::warn!("unrecognized mode, result is idle");
    }

    let elapsed_ms = args.elapsed.saturating_mul(1000);
    let (record, now) = if args.paused {
        let record = ScheduleRecord {
            started_at: Some(0),
            pause_at: Some(elapsed_ms),
            ..Default::default()
        };
        (record, elapsed_ms.saturating_add(PAUSED_LOOKAHEAD_MS))
    } else {
        let record = ScheduleRecord {
            started_at: Some(0),
            ..Default::default()
        };
        (record, elapsed_ms)
    };

    print_json(&resolve_phase(&program, &record, now))
}
