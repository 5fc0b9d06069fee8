//! Mortality Simulation - Monte Carlo life-expectancy estimates from annual mortality tables
//!
//! This library provides:
//! - Mortality tables with a certain-death fallback beyond the tabulated ages
//! - Year-by-year simulation of individual lives with injected randomness
//! - Parallel cohort simulation with reproducible per-life random streams
//! - Cohort statistics (mean, standard deviation, median, death probability by age)
//! - CSV/JSON export of the summary record

pub mod assumptions;
pub mod config;
pub mod error;
pub mod simulation;

// Re-export commonly used types
pub use assumptions::{MortalityTable, Gender};
pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use simulation::{AgeHistogram, CohortSimulation, LifeTrajectory, SimulationSummary, UniformSource};
