// Field files: the initial configuration and the checkpoints written on Ctrl+C share one JSON layout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::number::{Real, Repr};
use crate::solver::SolverParams;
use crate::state::{EMPTY, FLUID, Grid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityEntry {
    pub symbol: String,
    pub value: f64,
}

/// Position in the seeded random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub word_pos: u128,
}

/// Raw samples are stored as `i64`, so no more fractional bits than that can be meaningful.
pub const MAX_SAMPLE_FRAC: u32 = 64;

/// Exact per-cell values of one quantity, in whatever kind produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Samples {
    Fixed { frac: u32, raw: Vec<i64> },
    Float(Vec<f64>),
}

impl Samples {
    pub fn capture<T: Real>(values: impl IntoIterator<Item = T>) -> Self {
        let mut iter = values.into_iter().peekable();
        match iter.peek().map(|v| v.to_repr()) {
            Some(Repr::Scaled { frac, .. }) => {
                let raw = iter
                    .map(|v| match v.to_repr() {
                        Repr::Scaled { raw, .. } => raw as i64,
                        Repr::Float(f) => f as i64,
                    })
                    .collect();
                Samples::Fixed { frac, raw }
            }
            _ => Samples::Float(iter.map(Real::to_f64).collect()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::Fixed { raw, .. } => raw.len(),
            Samples::Float(values) => values.len(),
        }
    }

    /// Convert into `T`, checking the number of values.
    pub fn restore<T: Real>(&self, name: &'static str, expected: usize) -> Result<Vec<T>, ConfigError> {
        if self.len() != expected {
            return Err(ConfigError::StateLength { name, expected, actual: self.len() });
        }
        if let Samples::Fixed { frac, .. } = self {
            if *frac > MAX_SAMPLE_FRAC {
                return Err(ConfigError::SampleScale { name, frac: *frac });
            }
        }
        Ok(match self {
            Samples::Fixed { frac, raw } => raw
                .iter()
                .map(|&r| T::from_repr(Repr::Scaled { raw: r as i128, frac: *frac }))
                .collect(),
            Samples::Float(values) => values.iter().map(|&v| T::from_repr(Repr::Float(v))).collect(),
        })
    }
}

/// Pressure and velocity at a tick boundary. Velocity is four values per cell
/// in up, down, left, right order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub pressure: Samples,
    pub velocity: Samples,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFile {
    pub rows: usize,
    pub cols: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<f64>,
    #[serde(default)]
    pub tick: u64,
    #[serde(default)]
    pub densities: Vec<DensityEntry>,
    pub field: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng: Option<RngState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CellState>,
}

impl FieldFile {
    /// Fresh configuration with only the media set.
    pub fn new<S: AsRef<str>>(field: &[S]) -> Self {
        Self {
            rows: field.len(),
            cols: field.first().map_or(0, |row| row.as_ref().chars().count()),
            g: None,
            tick: 0,
            densities: Vec::new(),
            field: field.iter().map(|row| row.as_ref().to_string()).collect(),
            rng: None,
            state: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write through a sibling temp file so an interrupted save never leaves a truncated checkpoint.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, self.to_json()?).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }

    pub fn grid(&self) -> Result<Grid, ConfigError> {
        Grid::from_rows(self.rows, self.cols, &self.field)
    }

    /// Density pairs from the file, with the empty and fluid media falling back to `params`.
    pub fn densities(&self, params: &SolverParams) -> Result<Vec<(u8, f64)>, ConfigError> {
        let mut out = vec![(EMPTY, params.rho_empty), (FLUID, params.rho_fluid)];
        for entry in &self.densities {
            let symbol = match entry.symbol.as_bytes() {
                [b] if b.is_ascii() => *b,
                _ => return Err(ConfigError::BadDensitySymbol(entry.symbol.clone())),
            };
            match out.iter_mut().find(|(s, _)| *s == symbol) {
                Some(slot) => slot.1 = entry.value,
                None => out.push((symbol, entry.value)),
            }
        }
        Ok(out)
    }
}
