/// Tolerance below which residual capacity counts as used up, and above which
/// flow may not exceed velocity.
pub const FLOW_EPSILON: f64 = 0.0001;

/// Multiplier on the pressure returned by the fluid medium when velocity is cut back to flow.
pub const FLUID_DAMPING: f64 = 0.8;

/// Largest unit of flow a single sweep tries to push out of a cell.
pub const FLOW_UNIT: i64 = 1;

/// Physical and stream parameters not carried by the field file itself.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Gravity used when the field file does not set one.
    pub g: f64,
    /// Density of the empty medium when the field file does not set one.
    pub rho_empty: f64,
    /// Density of the fluid medium when the field file does not set one.
    pub rho_fluid: f64,
    /// Seed for a fresh random stream. A checkpoint carrying its own stream state wins.
    pub seed: u64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            g: 0.1,
            rho_empty: 0.01,
            rho_fluid: 1000.0,
            seed: 1337,
        }
    }
}

impl SolverParams {
    /// Default physics with a different random stream.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }
}
