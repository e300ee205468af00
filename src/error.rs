use std::path::PathBuf;

/// Problems with field files, checkpoints and run settings. Fatal before the first tick.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("field file JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field has {actual} rows, expected {expected}")]
    RowCount { expected: usize, actual: usize },

    #[error("row {row} has {actual} columns, expected {expected}")]
    RowLength { row: usize, expected: usize, actual: usize },

    #[error("field must have at least one row and one column")]
    EmptyField,

    #[error("cell ({row}, {col}) holds non-ASCII symbol {symbol:?}")]
    NonAsciiSymbol { row: usize, col: usize, symbol: char },

    #[error("medium {symbol:?} at ({row}, {col}) has no registered density")]
    UnknownMedium { symbol: char, row: usize, col: usize },

    #[error("density symbol {0:?} must be a single ASCII character other than '#'")]
    BadDensitySymbol(String),

    #[error("density of {symbol:?} is {value}, must be positive in the pressure type")]
    NonPositiveDensity { symbol: char, value: f64 },

    #[error("saved {name} has {actual} values, expected {expected}")]
    StateLength { name: &'static str, expected: usize, actual: usize },

    #[error("saved {name} uses {frac} fractional bits, at most 64 are supported")]
    SampleScale { name: &'static str, frac: u32 },

    #[error("field is {actual_rows}x{actual_cols} but the simulator was built for {rows}x{cols}")]
    SizeMismatch { rows: usize, cols: usize, actual_rows: usize, actual_cols: usize },

    #[error("unknown numeric type {0:?}")]
    UnknownType(String),

    #[error("simulator with types p={p}, v={v}, vf={vf} is not compiled in")]
    UnsupportedTypes { p: String, v: String, vf: String },

    #[error("invalid value {value:?} for {flag}")]
    BadFlag { flag: &'static str, value: String },
}

/// Contract violations detected while a tick runs. The tick's state is not usable afterwards.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("flow {flow} exceeds velocity {velocity} at ({row}, {col}) heading {dir}")]
    FlowExceedsCapacity {
        row: usize,
        col: usize,
        dir: &'static str,
        flow: f64,
        velocity: f64,
    },

    #[error("cell ({row}, {col}) has no open neighbors to divide pressure between")]
    ZeroOpenness { row: usize, col: usize },

    #[error("no direction could be sampled out of ({row}, {col})")]
    EmptySample { row: usize, col: usize },
}

/// Anything that ends a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
