//! CSV-based mortality table loader
//!
//! The expected layout is a header row followed by `age,qx` records:
//!
//! ```text
//! Age,Qx
//! 30,0.000824
//! 31,0.000834
//! ```
//!
//! Columns beyond the second are ignored. Duplicate ages are allowed and the
//! last row for an age wins.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use super::MortalityTable;
use crate::error::{Result, SimulationError};

/// Default mortality table location, relative to the working directory
pub const DEFAULT_TABLE_PATH: &str = "data/MortalitySimulationInput.csv";

/// Load a mortality table from a CSV file
pub fn load_mortality_table<P: AsRef<Path>>(path: P) -> Result<MortalityTable> {
    let path = path.as_ref();
    debug!("Loading mortality table from {}", path.display());
    let file = File::open(path)?;
    load_mortality_table_from_reader(file)
}

/// Load a mortality table from any reader (e.g., string buffer, request body)
pub fn load_mortality_table_from_reader<R: Read>(reader: R) -> Result<MortalityTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let age_field = record
            .get(0)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SimulationError::data(line, "missing age"))?;
        let qx_field = record
            .get(1)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SimulationError::data(line, "missing probability of death"))?;

        let age: u32 = age_field
            .parse()
            .map_err(|e| SimulationError::data(line, format!("invalid age '{}': {}", age_field, e)))?;
        let qx: f64 = qx_field
            .parse()
            .map_err(|e| SimulationError::data(line, format!("invalid qx '{}': {}", qx_field, e)))?;

        if !qx.is_finite() || !(0.0..=1.0).contains(&qx) {
            return Err(SimulationError::data(
                line,
                format!("probability of death {} for age {} is outside [0, 1]", qx, age),
            ));
        }

        rows.push((age, qx));
    }

    let table = MortalityTable::from_rates(rows)?;
    debug!(
        "Loaded {} mortality rates (ages {:?} to {:?})",
        table.len(),
        table.min_age(),
        table.max_age()
    );

    Ok(table)
}
