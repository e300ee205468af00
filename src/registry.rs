// Numeric kind names and the table of simulators compiled into the binary.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::checkpoint::FieldFile;
use crate::error::{ConfigError, SimError};
use crate::number::{FastFixed, Fixed};
use crate::solver::{Dynamic, Shape, Simulation, SolverParams, Static, TickReport};
use crate::state::Grid;

/// Grid size with its own specialization; any other size runs on the dynamic one.
pub const STATIC_ROWS: usize = 36;
pub const STATIC_COLS: usize = 84;

/// Numeric representation selected by name at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NumType {
    Float,
    Double,
    Fixed { bits: u32, frac: u32 },
    FastFixed { bits: u32, frac: u32 },
}

/// Every kind some simulator is built for.
pub const COMPILED: [NumType; 5] = [
    NumType::Float,
    NumType::Double,
    NumType::Fixed { bits: 32, frac: 16 },
    NumType::Fixed { bits: 64, frac: 32 },
    NumType::FastFixed { bits: 32, frac: 16 },
];

impl NumType {
    pub fn is_compiled(self) -> bool {
        COMPILED.contains(&self)
    }
}

/// Parse the `n, k` inside `FIXED(n, k)`.
fn parse_width(args: &str) -> Option<(u32, u32)> {
    let (bits, frac) = args.split_once(',')?;
    let bits: u32 = bits.trim().parse().ok()?;
    let frac: u32 = frac.trim().parse().ok()?;
    (1..=64).contains(&bits).then_some(())?;
    (frac <= bits).then_some((bits, frac))
}

impl FromStr for NumType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix('"').and_then(|n| n.strip_suffix('"')).unwrap_or(name);
        let unknown = || ConfigError::UnknownType(s.to_string());
        match name {
            "FLOAT" => return Ok(NumType::Float),
            "DOUBLE" => return Ok(NumType::Double),
            _ => {}
        }
        let (fast, rest) = match name.strip_prefix("FAST_") {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let args = rest
            .strip_prefix("FIXED(")
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(unknown)?;
        let (bits, frac) = parse_width(args).ok_or_else(unknown)?;
        Ok(if fast { NumType::FastFixed { bits, frac } } else { NumType::Fixed { bits, frac } })
    }
}

impl TryFrom<String> for NumType {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NumType> for String {
    fn from(t: NumType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for NumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumType::Float => write!(f, "FLOAT"),
            NumType::Double => write!(f, "DOUBLE"),
            NumType::Fixed { bits, frac } => write!(f, "FIXED({bits},{frac})"),
            NumType::FastFixed { bits, frac } => write!(f, "FAST_FIXED({bits},{frac})"),
        }
    }
}

/// Kinds for pressure, velocity and flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeSelection {
    pub p: NumType,
    pub v: NumType,
    pub vf: NumType,
}

impl Default for TypeSelection {
    fn default() -> Self {
        let fixed = NumType::Fixed { bits: 32, frac: 16 };
        Self { p: fixed, v: fixed, vf: fixed }
    }
}

/// Type-erased simulator the driver runs.
pub trait Simulator: Send {
    fn tick(&mut self) -> Result<TickReport, SimError>;

    /// Index of the next tick to run.
    fn tick_index(&self) -> u64;

    fn grid(&self) -> &Grid;

    fn to_file(&self) -> FieldFile;

    fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.to_file().save(path)
    }

    fn render_into(&self, out: &mut String) {
        self.grid().render_into(out);
    }
}

impl<P, V, F, S> Simulator for Simulation<P, V, F, S>
where
    P: crate::number::Real,
    V: crate::number::Real,
    F: crate::number::Real,
    S: Shape,
{
    fn tick(&mut self) -> Result<TickReport, SimError> {
        Simulation::tick(self)
    }

    fn tick_index(&self) -> u64 {
        Simulation::tick_index(self)
    }

    fn grid(&self) -> &Grid {
        Simulation::grid(self)
    }

    fn to_file(&self) -> FieldFile {
        Simulation::to_file(self)
    }
}

/// Bind `$t` to the Rust type of a compiled kind and evaluate `$body`,
/// or yield `None` for a kind with no simulator.
macro_rules! with_num_type {
    ($num:expr, $t:ident, $body:expr) => {
        match $num {
            NumType::Float => {
                type $t = f32;
                $body
            }
            NumType::Double => {
                type $t = f64;
                $body
            }
            NumType::Fixed { bits: 32, frac: 16 } => {
                type $t = Fixed<32, 16>;
                $body
            }
            NumType::Fixed { bits: 64, frac: 32 } => {
                type $t = Fixed<64, 32>;
                $body
            }
            NumType::FastFixed { bits: 32, frac: 16 } => {
                type $t = FastFixed<32, 16>;
                $body
            }
            _ => None,
        }
    };
}

type Built = Result<Box<dyn Simulator>, ConfigError>;

fn build<S: Shape>(types: TypeSelection, file: &FieldFile, params: &SolverParams) -> Option<Built> {
    with_num_type!(types.p, P, {
        with_num_type!(types.v, V, {
            with_num_type!(types.vf, F, {
                Some(Simulation::<P, V, F, S>::from_file(file, params).map(|sim| Box::new(sim) as Box<dyn Simulator>))
            })
        })
    })
}

/// Build the simulator for `types`, preferring the fixed-size variant when the field matches it.
pub fn create_simulator(types: TypeSelection, file: &FieldFile, params: &SolverParams) -> Built {
    let unsupported = || ConfigError::UnsupportedTypes {
        p: types.p.to_string(),
        v: types.v.to_string(),
        vf: types.vf.to_string(),
    };
    if ![types.p, types.v, types.vf].into_iter().all(NumType::is_compiled) {
        return Err(unsupported());
    }
    let built = if (file.rows, file.cols) == (STATIC_ROWS, STATIC_COLS) {
        log::debug!("using {}x{} simulator", STATIC_ROWS, STATIC_COLS);
        build::<Static<STATIC_ROWS, STATIC_COLS>>(types, file, params)
    } else {
        None
    };
    match built.or_else(|| build::<Dynamic>(types, file, params)) {
        Some(sim) => sim,
        None => Err(unsupported()),
    }
}
