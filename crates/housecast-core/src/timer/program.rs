//! Timer programs.
//!
//! A program is stored and exchanged in its raw shape, a mode tag plus a bag
//! of numeric parameters ([`TimerSpec`]). Inside the crate it is a tagged union
//! ([`Program`]) whose variants carry only their own fields, already coerced
//! and defaulted. Conversion between the two is the only place defaults are
//! applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ValidationError;

/// Fixed EMOM round length in seconds.
pub const EMOM_ROUND_SECS: u64 = 60;

/// Timer mode tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    ForTime,
    Interval,
    Emom,
    Rounds,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::ForTime => "fortime",
            Mode::Interval => "interval",
            Mode::Emom => "emom",
            Mode::Rounds => "rounds",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "fortime" => Some(Mode::ForTime),
            "interval" => Some(Mode::Interval),
            "emom" => Some(Mode::Emom),
            "rounds" => Some(Mode::Rounds),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw program shape: `{ "mode": "...", "params": { ... } }`.
///
/// Parameter values are kept as JSON so that whatever an editor wrote
/// (numbers, numeric strings, nulls) can be coerced on conversion. Known
/// modes are saved back in their typed form, with defaults filled in and
/// unknown keys dropped; only an unrecognized mode keeps its bag verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSpec {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl TimerSpec {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: u64) -> Self {
        self.params.insert(key.to_string(), Value::from(value));
        self
    }

    /// Parse a `key=value` pair (as typed on a command line) into the bag.
    pub fn insert_pair(&mut self, pair: &str) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: "param".into(),
            message,
        };
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| invalid(format!("expected key=value, got '{pair}'")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid(format!("missing key in '{pair}'")));
        }
        let raw = raw.trim();
        let value = match raw.parse::<u64>() {
            Ok(n) => Value::from(n),
            Err(_) => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(format!("'{raw}' is not a number (for {key})")))?,
        };
        self.params.insert(key.to_string(), value);
        Ok(())
    }

    /// Insert `defaults` for every key that is absent or null.
    pub fn fill_missing(&mut self, defaults: &[(&str, u64)]) {
        for (key, value) in defaults {
            let slot = self.params.entry((*key).to_string()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::from(*value);
            }
        }
    }

    /// Read a parameter as whole non-negative seconds (or a count).
    ///
    /// Absent and null fall back to `default`. Anything present but not a
    /// usable non-negative number coerces to 0; fractions are floored.
    fn secs(&self, key: &str, default: u64) -> u64 {
        match self.params.get(key) {
            None | Some(Value::Null) => default,
            Some(Value::Number(n)) => n
                .as_u64()
                .unwrap_or_else(|| n.as_f64().map(coerce_secs).unwrap_or(0)),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    0
                } else {
                    s.parse::<f64>().map(coerce_secs).unwrap_or(0)
                }
            }
            Some(Value::Bool(b)) => u64::from(*b),
            Some(_) => 0,
        }
    }
}

fn coerce_secs(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else {
        // float-to-int `as` saturates at u64::MAX
        value.floor() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForTime {
    /// Work seconds per block.
    pub total: u64,
    pub blocks: u64,
    pub changeover: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub on: u64,
    pub off: u64,
    /// Seconds of work+rest per block; the round count is derived from it.
    pub total: u64,
    pub blocks: u64,
    pub changeover: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emom {
    /// Length of the whole session in seconds.
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rounds {
    /// Seconds per half, at least 1.
    pub half: u64,
    pub break_secs: u64,
    pub blocks: u64,
    pub changeover: u64,
}

/// A fully-defaulted timer program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TimerSpec", into = "TimerSpec")]
pub enum Program {
    ForTime(ForTime),
    Interval(Interval),
    Emom(Emom),
    Rounds(Rounds),
    /// Mode tag this build does not know; kept verbatim and resolved as idle.
    Unrecognized(TimerSpec),
}

impl Program {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Program::ForTime(_) => Some(Mode::ForTime),
            Program::Interval(_) => Some(Mode::Interval),
            Program::Emom(_) => Some(Mode::Emom),
            Program::Rounds(_) => Some(Mode::Rounds),
            Program::Unrecognized(_) => None,
        }
    }

    /// Repetitions honored by the engine; EMOM runs a single session.
    pub fn blocks(&self) -> u64 {
        match self {
            Program::ForTime(p) => p.blocks,
            Program::Interval(p) => p.blocks,
            Program::Rounds(p) => p.blocks,
            Program::Emom(_) | Program::Unrecognized(_) => 1,
        }
    }
}

/// Program given to a house the first time it is referenced.
impl Default for Program {
    fn default() -> Self {
        Program::ForTime(ForTime {
            total: 600,
            blocks: 1,
            changeover: 60,
        })
    }
}

impl From<TimerSpec> for Program {
    fn from(spec: TimerSpec) -> Self {
        let blocks = spec.secs("blocks", 1).max(1);
        match Mode::parse(&spec.mode) {
            Some(Mode::ForTime) => Program::ForTime(ForTime {
                total: spec.secs("total", 0),
                blocks,
                changeover: spec.secs("changeover", 0),
            }),
            Some(Mode::Interval) => Program::Interval(Interval {
                on: spec.secs("on", 60),
                off: spec.secs("off", 60),
                total: spec.secs("total", 600),
                blocks,
                changeover: spec.secs("changeover", 0),
            }),
            Some(Mode::Emom) => Program::Emom(Emom {
                total: spec.secs("total", 600),
            }),
            Some(Mode::Rounds) => Program::Rounds(Rounds {
                half: spec.secs("half", 420).max(1),
                break_secs: spec.secs("break", 60),
                blocks,
                changeover: spec.secs("changeover", 60),
            }),
            None => Program::Unrecognized(spec),
        }
    }
}

impl From<Program> for TimerSpec {
    fn from(program: Program) -> Self {
        match program {
            Program::ForTime(p) => TimerSpec::new(Mode::ForTime.as_str())
                .with_param("total", p.total)
                .with_param("blocks", p.blocks)
                .with_param("changeover", p.changeover),
            Program::Interval(p) => TimerSpec::new(Mode::Interval.as_str())
                .with_param("on", p.on)
                .with_param("off", p.off)
                .with_param("total", p.total)
                .with_param("blocks", p.blocks)
                .with_param("changeover", p.changeover),
            Program::Emom(p) => TimerSpec::new(Mode::Emom.as_str()).with_param("total", p.total),
            Program::Rounds(p) => TimerSpec::new(Mode::Rounds.as_str())
                .with_param("half", p.half)
                .with_param("break", p.break_secs)
                .with_param("blocks", p.blocks)
                .with_param("changeover", p.changeover),
            Program::Unrecognized(spec) => spec,
        }
    }
}
