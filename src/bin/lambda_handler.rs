//! AWS Lambda handler for running cohort simulations
//!
//! Accepts the run configuration as JSON and returns the summary statistics.
//! The mortality table is either inline CSV text, a path bundled with the
//! function, or the built-in IAM 2012 Basic table.

use std::sync::Arc;
use std::time::Instant;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::info;
use mortality_simulation::{
    assumptions::{load_mortality_table, load_mortality_table_from_reader, DEFAULT_TABLE_PATH},
    simulation::{DEFAULT_SEED, DEFAULT_START_AGE},
    config::DEFAULT_SIMULATIONS,
    CohortSimulation, Gender, MortalityTable, SimulationConfig, SimulationSummary,
};
use serde::{Deserialize, Serialize};

/// Upper bound on lives per invocation to stay within Lambda time limits
const MAX_SIMULATIONS: u64 = 10_000_000;

/// Input configuration for the simulation
#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    /// Starting age of the cohort (default: 30)
    #[serde(default = "default_start_age")]
    pub start_age: u32,

    /// Number of lives to simulate (default: 100,000)
    #[serde(default = "default_simulations")]
    pub simulations: u64,

    /// Master seed (default: 42)
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Mortality table as CSV text (header row, then age,qx)
    ///
    /// At most one of `table_csv`, `table_path` and `iam_2012` may be set;
    /// with none, the bundled default table is loaded.
    #[serde(default)]
    pub table_csv: Option<String>,

    /// Path to a mortality table CSV packaged with the function
    #[serde(default)]
    pub table_path: Option<String>,

    /// Use the IAM 2012 Basic table for "Male" or "Female"
    #[serde(default)]
    pub iam_2012: Option<String>,

    /// Include the age-at-death distribution in the response
    #[serde(default)]
    pub include_distribution: bool,
}

fn default_start_age() -> u32 { DEFAULT_START_AGE }
fn default_simulations() -> u64 { DEFAULT_SIMULATIONS }
fn default_seed() -> u64 { DEFAULT_SEED }

#[derive(Debug, Serialize)]
pub struct DistributionRow {
    age: u32,
    deaths: u64,
}

/// Output from the simulation
#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    summary: SimulationSummary,
    threshold_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<Vec<DistributionRow>>,
    execution_time_ms: u64,
}

fn resolve_table(request: &SimulationRequest) -> Result<MortalityTable, Error> {
    let sources = [
        request.table_csv.is_some(),
        request.table_path.is_some(),
        request.iam_2012.is_some(),
    ];
    if sources.iter().filter(|&&set| set).count() > 1 {
        return Err("Specify only one of table_csv, table_path or iam_2012".into());
    }

    if let Some(csv_text) = &request.table_csv {
        return Ok(load_mortality_table_from_reader(csv_text.as_bytes())?);
    }

    if let Some(gender) = &request.iam_2012 {
        let gender = match gender.as_str() {
            "Male" | "male" => Gender::Male,
            "Female" | "female" => Gender::Female,
            other => return Err(format!("Unknown gender: {}", other).into()),
        };
        return Ok(MortalityTable::iam_2012_basic(gender));
    }

    let path = request.table_path.as_deref().unwrap_or(DEFAULT_TABLE_PATH);
    Ok(load_mortality_table(path)?)
}

async fn handler(event: LambdaEvent<SimulationRequest>) -> Result<SimulationResponse, Error> {
    let start = Instant::now();
    let request = event.payload;

    if request.simulations > MAX_SIMULATIONS {
        return Err(format!(
            "simulations ({}) exceeds the per-request limit of {}",
            request.simulations, MAX_SIMULATIONS
        )
        .into());
    }

    let config = SimulationConfig {
        start_age: request.start_age,
        simulations: request.simulations,
        seed: request.seed,
        parallel: true,
    };
    config.validate()?;

    let table = resolve_table(&request)?;
    info!(
        "Running {} simulations from age {} against {} tabulated ages",
        config.simulations,
        config.start_age,
        table.len()
    );

    let mut simulation = CohortSimulation::from_config(&config, Arc::new(table));
    simulation.run()?;
    let summary = simulation.export_summary()?;

    let distribution = request.include_distribution.then(|| {
        simulation
            .histogram()
            .iter()
            .map(|(age, deaths)| DistributionRow { age, deaths })
            .collect()
    });

    Ok(SimulationResponse {
        threshold_label: summary.threshold_label(),
        summary,
        distribution,
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> SimulationRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_conflicting_table_sources_rejected() {
        let cases = [
            r#"{ "table_csv": "Age,Qx\n30,0.5\n", "iam_2012": "Male" }"#,
            r#"{ "table_csv": "Age,Qx\n30,0.5\n", "table_path": "table.csv" }"#,
            r#"{ "table_path": "table.csv", "iam_2012": "Female" }"#,
        ];

        for json in cases {
            let result = resolve_table(&request(json));
            assert!(result.is_err(), "expected conflict error for {}", json);
        }
    }

    #[test]
    fn test_single_table_source() {
        let inline = resolve_table(&request(r#"{ "table_csv": "Age,Qx\n30,0.5\n" }"#)).unwrap();
        assert_eq!(inline.probability_of_death(30), 0.5);

        let iam = resolve_table(&request(r#"{ "iam_2012": "Male" }"#)).unwrap();
        assert_eq!(iam.max_age(), Some(120));
    }

    #[test]
    fn test_request_defaults() {
        let request = request("{}");

        assert_eq!(request.start_age, DEFAULT_START_AGE);
        assert_eq!(request.simulations, DEFAULT_SIMULATIONS);
        assert_eq!(request.seed, DEFAULT_SEED);
        assert!(!request.include_distribution);
    }
}
