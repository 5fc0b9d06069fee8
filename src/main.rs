//! Mortality Simulation CLI
//!
//! Runs a cohort simulation against a mortality table and writes the summary CSV

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mortality_simulation::{
    assumptions::{load_mortality_table, DEFAULT_TABLE_PATH},
    simulation::DEFAULT_OUTPUT_PATH,
    CohortSimulation, Gender, MortalityTable, SimulationConfig,
};

#[derive(Debug, Parser)]
#[command(name = "mortality-sim", version, about = "Monte Carlo life-expectancy simulation")]
struct Args {
    /// Mortality table CSV (header row, then age,qx records)
    #[arg(short, long, default_value = DEFAULT_TABLE_PATH)]
    table: PathBuf,

    /// Use the built-in IAM 2012 Basic table instead of a CSV file
    #[arg(long, value_parser = parse_gender, conflicts_with = "table")]
    iam_2012: Option<Gender>,

    /// JSON run configuration; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Age at which every simulated life begins
    #[arg(short, long)]
    start_age: Option<u32>,

    /// Number of lives to simulate
    #[arg(short = 'n', long)]
    simulations: Option<u64>,

    /// Master seed for per-life random streams
    #[arg(long)]
    seed: Option<u64>,

    /// Run on a single thread
    #[arg(long)]
    sequential: bool,

    /// Summary CSV output path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Also write the age-at-death distribution to this CSV
    #[arg(long)]
    distribution: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    match value.to_ascii_lowercase().as_str() {
        "male" | "m" => Ok(Gender::Male),
        "female" | "f" => Ok(Gender::Female),
        other => Err(format!("unknown gender '{}' (expected male or female)", other)),
    }
}

fn build_config(args: &Args) -> anyhow::Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    if let Some(start_age) = args.start_age {
        config.start_age = start_age;
    }
    if let Some(simulations) = args.simulations {
        config.simulations = simulations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.sequential {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let table = match args.iam_2012 {
        Some(gender) => MortalityTable::iam_2012_basic(gender),
        None => load_mortality_table(&args.table)
            .with_context(|| format!("Failed to load mortality table {}", args.table.display()))?,
    };

    let mut simulation = CohortSimulation::from_config(&config, Arc::new(table));
    simulation.run()?;

    let summary = simulation.export_summary()?;
    summary
        .write_csv(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(path) = &args.distribution {
        simulation
            .histogram()
            .write_csv(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Mortality Simulation");
        println!("====================\n");
        println!("  Initial Age:           {}", summary.initial_age);
        println!("  Simulations:           {}", summary.simulations);
        println!("  Expected Age:          {:.4}", summary.expected_age);
        println!("  {}: {:.6}", summary.threshold_label(), summary.probability_of_death_by_threshold);
        println!("  Standard Deviation:    {:.4}", summary.standard_deviation);
        println!("  Median Age:            {}", summary.median_age);
        println!("\nSummary written to: {}", args.output.display());
    }

    Ok(())
}
