//! Run configuration for a cohort simulation
//!
//! Can be built in code, parsed from CLI flags, or read from a JSON file:
//!
//! ```json
//! { "start_age": 65, "simulations": 250000, "seed": 7 }
//! ```
//!
//! Missing fields take their defaults.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::simulation::{DEFAULT_SEED, DEFAULT_START_AGE};

/// Number of lives simulated when not specified
pub const DEFAULT_SIMULATIONS: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Age at which every simulated life begins
    pub start_age: u32,

    /// Number of independent lives in the cohort
    pub simulations: u64,

    /// Master seed for per-trajectory random streams
    pub seed: u64,

    /// Spread trajectories across rayon workers
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_age: DEFAULT_START_AGE,
            simulations: DEFAULT_SIMULATIONS,
            seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce statistics
    pub fn validate(&self) -> Result<()> {
        if self.simulations == 0 {
            return Err(SimulationError::precondition("simulation count must be positive"));
        }
        Ok(())
    }
}
