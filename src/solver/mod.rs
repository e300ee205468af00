mod flow;
mod forces;
mod params;
mod transport;

pub mod diagnostics;

// Re-export public API
pub use params::{FLOW_EPSILON, FLOW_UNIT, FLUID_DAMPING, SolverParams};

use std::marker::PhantomData;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::checkpoint::{CellState, DensityEntry, FieldFile, RngState, Samples};
use crate::error::{ConfigError, SimError};
use crate::field::VectorField;
use crate::number::Real;
use crate::state::{DensityTable, Grid, WALL};

/// Grid-size specialization a simulator is built for.
pub trait Shape: Send + 'static {
    fn check(rows: usize, cols: usize) -> Result<(), ConfigError>;
}

/// Accepts any size.
pub struct Dynamic;

/// Accepts exactly `R x C`.
pub struct Static<const R: usize, const C: usize>;

impl Shape for Dynamic {
    fn check(_rows: usize, _cols: usize) -> Result<(), ConfigError> {
        Ok(())
    }
}

impl<const R: usize, const C: usize> Shape for Static<R, C> {
    fn check(rows: usize, cols: usize) -> Result<(), ConfigError> {
        if rows == R && cols == C {
            Ok(())
        } else {
            Err(ConfigError::SizeMismatch { rows: R, cols: C, actual_rows: rows, actual_cols: cols })
        }
    }
}

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Any cell content was transported.
    pub moved: bool,
    /// Flow sweeps until no more flow could be pushed.
    pub sweeps: usize,
    /// Net pressure change booked by the force and recalculation phases.
    pub pressure_delta: f64,
}

/// Pressure/velocity/transport simulation over one grid.
///
/// `P`, `V` and `F` are the numeric kinds of pressure, velocity and
/// resolved flow. Cells are visited in row-major order and every random
/// decision draws from the simulator's own stream, so a run is fully
/// determined by the field, the kinds and the seed.
pub struct Simulation<P, V, F, S = Dynamic> {
    grid: Grid,
    density: DensityTable<P>,
    pressure: Vec<P>,
    old_pressure: Vec<P>,
    velocity: VectorField<V>,
    flow: VectorField<F>,
    /// Sweep stamp per cell: `< ut - 1` unvisited, `ut - 1` in progress, `ut` finished.
    last_use: Vec<u64>,
    ut: u64,
    g: V,
    flow_epsilon: F,
    fluid_damping: P,
    rng: ChaCha8Rng,
    seed: u64,
    tick: u64,
    shape: PhantomData<S>,
}

impl<P: Real, V: Real, F: Real, S: Shape> Simulation<P, V, F, S> {
    pub fn from_file(file: &FieldFile, params: &SolverParams) -> Result<Self, ConfigError> {
        S::check(file.rows, file.cols)?;
        let grid = file.grid()?;

        let mut density = DensityTable::new();
        for (symbol, value) in file.densities(params)? {
            let rho = P::from_f64(value);
            if rho <= P::zero() {
                return Err(ConfigError::NonPositiveDensity { symbol: symbol as char, value });
            }
            density.set(symbol, rho)?;
        }
        for cell in 0..grid.len() {
            let medium = grid.medium(cell);
            if medium != WALL && density.get(medium).is_none() {
                let (row, col) = grid.coords(cell);
                return Err(ConfigError::UnknownMedium { symbol: medium as char, row, col });
            }
        }

        let (seed, rng) = match file.rng {
            Some(RngState { seed, word_pos }) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_word_pos(word_pos);
                (seed, rng)
            }
            None => (params.seed, ChaCha8Rng::seed_from_u64(params.seed)),
        };

        let len = grid.len();
        let (pressure, velocity) = match &file.state {
            Some(state) => {
                let pressure = state.pressure.restore("pressure", len)?;
                let velocity = state.velocity.restore::<V>("velocity", len * 4)?;
                (pressure, VectorField::from_flat(&velocity))
            }
            None => (vec![P::zero(); len], VectorField::new(len)),
        };

        log::info!(
            "loaded {}x{} field at tick {} ({} fluid, {} empty cells)",
            grid.rows(),
            grid.cols(),
            file.tick,
            grid.count(crate::state::FLUID),
            grid.count(crate::state::EMPTY),
        );

        Ok(Self {
            density,
            old_pressure: vec![P::zero(); len],
            pressure,
            velocity,
            flow: VectorField::new(len),
            last_use: vec![0; len],
            ut: 0,
            g: V::from_f64(file.g.unwrap_or(params.g)),
            flow_epsilon: F::from_f64(FLOW_EPSILON),
            fluid_damping: P::from_f64(FLUID_DAMPING),
            rng,
            seed,
            tick: file.tick,
            shape: PhantomData,
            grid,
        })
    }

    /// Everything needed to resume from the next tick, including the random stream position.
    pub fn to_file(&self) -> FieldFile {
        FieldFile {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            g: Some(self.g.to_f64()),
            tick: self.tick,
            densities: self
                .density
                .entries()
                .map(|(symbol, rho)| DensityEntry { symbol: (symbol as char).to_string(), value: rho.to_f64() })
                .collect(),
            field: self.grid.lines(),
            rng: Some(RngState { seed: self.seed, word_pos: self.rng.get_word_pos() }),
            state: Some(CellState {
                pressure: Samples::capture(self.pressure.iter().copied()),
                velocity: Samples::capture(self.velocity.flat()),
            }),
        }
    }

    /// Run the five phases once. An error leaves the simulator unusable.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        let mut pressure_delta = P::zero();

        self.apply_external_forces();
        self.apply_pressure_forces(&mut pressure_delta)?;
        let sweeps = self.make_flow();
        self.recalculate_pressure(&mut pressure_delta)?;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "tick {}: flow excess {:e}, total pressure {}",
                self.tick,
                diagnostics::max_flow_excess(&self.velocity, &self.flow),
                diagnostics::total_pressure(&self.pressure),
            );
        }

        let moved = self.apply_moves()?;
        let report = TickReport { tick: self.tick, moved, sweeps, pressure_delta: pressure_delta.to_f64() };
        log::debug!("tick {}: {} flow sweeps, moved={}", self.tick, sweeps, moved);
        self.tick += 1;
        Ok(report)
    }

    /// Index of the next tick to run.
    pub fn tick_index(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pressure(&self, cell: usize) -> P {
        self.pressure[cell]
    }

    /// Density of the medium in `cell`. Every non-wall medium was checked at load.
    fn rho(&self, cell: usize) -> P {
        self.density.get(self.grid.medium(cell)).unwrap_or_else(P::zero)
    }

    /// `force` spread over the open sides of `cell`.
    fn pressure_share(&self, force: P, cell: usize) -> Result<P, SimError> {
        match self.grid.openness(cell) {
            0 => {
                let (row, col) = self.grid.coords(cell);
                Err(SimError::ZeroOpenness { row, col })
            }
            open => Ok(force / P::from_int(open as i64)),
        }
    }

    fn random01<T: Real>(&mut self) -> T {
        T::random01(self.rng.next_u32())
    }

    /// Exchange medium, pressure and velocity of two cells.
    fn swap_cells(&mut self, a: usize, b: usize) {
        self.grid.swap_media(a, b);
        self.pressure.swap(a, b);
        self.velocity.swap_cells(a, b);
    }
}
