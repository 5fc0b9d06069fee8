//! Monte Carlo life simulation: single trajectories and cohort statistics

mod life;
mod cohort;
mod histogram;
mod summary;

pub use life::{LifeTrajectory, LifeState, UniformSource, DEFAULT_START_AGE};
pub use cohort::{CohortSimulation, trajectory_rng, DEFAULT_SEED};
pub use histogram::AgeHistogram;
pub use summary::{SimulationSummary, DEFAULT_OUTPUT_PATH, THRESHOLD_OFFSET};
