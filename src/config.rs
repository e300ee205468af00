use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::registry::TypeSelection;
use crate::solver::SolverParams;

pub const CONFIG_FILE: &str = "fluxgrid.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub types: TypeSelection,
    pub run: RunConfig,
    pub physics: PhysicsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub in_file: PathBuf,
    pub out_file: PathBuf,
    /// Ticks are numbered from the field file's start tick up to, not including, this one.
    pub max_ticks: u64,
    pub seed: u64,
    /// Stack size of the simulation thread, in MiB.
    pub stack_mb: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub g: f64,
    pub rho_empty: f64,
    pub rho_fluid: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            in_file: PathBuf::from("field.json"),
            out_file: PathBuf::from("checkpoint.json"),
            max_ticks: 1_000_000,
            seed: 1337,
            stack_mb: 256,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let params = SolverParams::default();
        Self {
            g: params.g,
            rho_empty: params.rho_empty,
            rho_fluid: params.rho_fluid,
        }
    }
}

impl Config {
    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            g: self.physics.g,
            rho_empty: self.physics.rho_empty,
            rho_fluid: self.physics.rho_fluid,
            seed: self.run.seed,
        }
    }

    /// Override settings from `--name=value` arguments. Arguments that are not
    /// recognised flags are ignored with a warning.
    pub fn apply_args<I, S>(&mut self, args: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            let arg = arg.as_ref();
            let Some((flag, value)) = arg.split_once('=') else {
                log::warn!("ignoring argument {arg:?}");
                continue;
            };
            match flag {
                "--p-type" => self.types.p = value.parse()?,
                "--v-type" => self.types.v = value.parse()?,
                "--vf-type" => self.types.vf = value.parse()?,
                "--in-file" => self.run.in_file = parse_path("--in-file", value)?,
                "--out-file" => self.run.out_file = parse_path("--out-file", value)?,
                "--ticks" => self.run.max_ticks = parse_number("--ticks", value)?,
                "--seed" => self.run.seed = parse_number("--seed", value)?,
                _ => log::warn!("ignoring unknown flag {flag}"),
            }
        }
        Ok(())
    }
}

fn parse_path(flag: &'static str, value: &str) -> Result<PathBuf, ConfigError> {
    let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
    if value.is_empty() {
        return Err(ConfigError::BadFlag { flag, value: value.to_string() });
    }
    Ok(PathBuf::from(value))
}

fn parse_number(flag: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::BadFlag { flag, value: value.to_string() })
}

pub fn load() -> Config {
    load_from(Path::new(CONFIG_FILE))
}

pub fn load_from(path: &Path) -> Config {
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("failed to parse {}: {e}; using defaults", path.display());
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("failed to read {}: {e}; using defaults", path.display());
                Config::default()
            }
        }
    } else {
        Config::default()
    }
}
