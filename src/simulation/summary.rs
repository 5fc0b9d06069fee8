//! Summary record produced by a completed cohort simulation
//!
//! The CSV rendition is two rows: field names, then values. Field order and
//! the threshold label are fixed so downstream spreadsheets keep working.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default output file written by the CLI
pub const DEFAULT_OUTPUT_PATH: &str = "MortalitySimulationOutput.csv";

/// Years past the starting age used for the reported death probability
pub const THRESHOLD_OFFSET: u32 = 10;

/// Summary statistics for one cohort run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub initial_age: u32,
    pub simulations: u64,
    pub expected_age: f64,
    /// Age used for `probability_of_death_by_threshold` (initial age + 10)
    pub threshold_age: u32,
    /// Fraction of the cohort dying strictly before `threshold_age`
    pub probability_of_death_by_threshold: f64,
    pub standard_deviation: f64,
    pub median_age: u32,
}

impl SimulationSummary {
    /// Column header for the threshold probability, e.g. "Probability of Dying by Age 40"
    pub fn threshold_label(&self) -> String {
        format!("Probability of Dying by Age {}", self.threshold_age)
    }

    /// Field names in output order
    pub fn headers(&self) -> [String; 6] {
        [
            "Initial Age".to_string(),
            "Number of Simulations".to_string(),
            "Expected Age".to_string(),
            self.threshold_label(),
            "Standard Deviation".to_string(),
            "Median Age".to_string(),
        ]
    }

    /// Field values in output order
    pub fn values(&self) -> [String; 6] {
        [
            self.initial_age.to_string(),
            self.simulations.to_string(),
            self.expected_age.to_string(),
            self.probability_of_death_by_threshold.to_string(),
            self.standard_deviation.to_string(),
            self.median_age.to_string(),
        ]
    }

    /// Write the two-row CSV to any writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers())?;
        csv_writer.write_record(&self.values())?;
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the two-row CSV to `path`, replacing any existing file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }
}
