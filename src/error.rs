//! Error types for table loading and cohort statistics

use thiserror::Error;

/// Errors raised by the simulation library
#[derive(Error, Debug)]
pub enum SimulationError {
    /// A mortality table row could not be turned into an (age, qx) pair
    #[error("Mortality table line {line}: {message}")]
    Data { line: u64, message: String },

    /// A probability of death outside [0, 1] (or not finite)
    #[error("Invalid probability of death {rate} at age {age}")]
    InvalidRate { age: u32, rate: f64 },

    /// Statistics requested before a completed run, with zero simulations,
    /// or a cohort that was already run
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SimulationError {
    pub(crate) fn data(line: u64, message: impl Into<String>) -> Self {
        Self::Data { line, message: message.into() }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
