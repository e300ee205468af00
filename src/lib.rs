pub mod checkpoint;
pub mod config;
pub mod error;
pub mod field;
pub mod number;
pub mod physics;
pub mod registry;
pub mod solver;
pub mod state;

pub use checkpoint::FieldFile;
pub use error::{ConfigError, RunError, SimError};
pub use registry::{NumType, Simulator, TypeSelection, create_simulator};
pub use solver::{Simulation, SolverParams, TickReport};
