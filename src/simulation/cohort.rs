//! Cohort simulation: many independent lives from a common starting age
//!
//! Each trajectory draws from its own ChaCha8 stream, selected by the
//! trajectory index under a shared master seed. The resulting histogram is
//! therefore the same whether the cohort runs on one thread or many.
//!
//! All statistics are computed from the completed histogram and the
//! simulation count. Requesting them before `run()` finishes, or for a cohort
//! of zero lives, is an error.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::histogram::AgeHistogram;
use super::life::{LifeTrajectory, UniformSource};
use super::summary::{SimulationSummary, THRESHOLD_OFFSET};
use crate::assumptions::MortalityTable;
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};

/// Default master seed for trajectory streams
pub const DEFAULT_SEED: u64 = 42;

/// Monte Carlo simulation of a cohort sharing one starting age
#[derive(Debug, Clone)]
pub struct CohortSimulation {
    start_age: u32,
    simulations: u64,
    table: Arc<MortalityTable>,
    seed: u64,
    parallel: bool,
    histogram: AgeHistogram,
    completed: bool,
}

impl CohortSimulation {
    pub fn new(start_age: u32, simulations: u64, table: Arc<MortalityTable>) -> Self {
        Self {
            start_age,
            simulations,
            table,
            seed: DEFAULT_SEED,
            parallel: true,
            histogram: AgeHistogram::new(),
            completed: false,
        }
    }

    /// Build a cohort from a run configuration
    pub fn from_config(config: &SimulationConfig, table: Arc<MortalityTable>) -> Self {
        Self::new(config.start_age, config.simulations, table)
            .with_seed(config.seed)
            .with_parallel(config.parallel)
    }

    /// Set the master seed for trajectory streams
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run trajectories across rayon workers (default) or sequentially
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn start_age(&self) -> u32 {
        self.start_age
    }

    pub fn simulations(&self) -> u64 {
        self.simulations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn table(&self) -> &MortalityTable {
        &self.table
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Ages at death recorded so far
    pub fn histogram(&self) -> &AgeHistogram {
        &self.histogram
    }

    /// Simulate every life using seeded ChaCha8 streams
    ///
    /// A cohort can only be run once; a second call would double count and
    /// fails instead.
    pub fn run(&mut self) -> Result<()> {
        let seed = self.seed;
        self.run_with(move |index| trajectory_rng(seed, index))
    }

    /// Simulate every life, drawing trajectory `i` from `make_source(i)`
    ///
    /// Sources must be independent of one another; the histogram is merged
    /// from per-worker partials so no state is shared between trajectories.
    pub fn run_with<S, F>(&mut self, make_source: F) -> Result<()>
    where
        S: UniformSource,
        F: Fn(u64) -> S + Sync,
    {
        if self.completed {
            return Err(SimulationError::precondition(
                "cohort has already been run; create a new simulation to run again",
            ));
        }

        info!(
            "Simulating {} lives from age {} (seed {}, parallel: {})",
            self.simulations, self.start_age, self.seed, self.parallel
        );
        let start = Instant::now();

        let start_age = self.start_age;
        let table: &MortalityTable = &self.table;
        let simulate = |mut partial: AgeHistogram, index: u64| {
            let mut source = make_source(index);
            let age = LifeTrajectory::new(start_age).run_to_completion(table, &mut source);
            partial.record(age);
            partial
        };

        let histogram = if self.parallel {
            (0..self.simulations)
                .into_par_iter()
                .fold(AgeHistogram::new, simulate)
                .reduce(AgeHistogram::new, AgeHistogram::merged)
        } else {
            (0..self.simulations).fold(AgeHistogram::new(), simulate)
        };

        debug_assert_eq!(histogram.total(), self.simulations);
        debug!(
            "Ages at death span {:?} to {:?} across {} buckets",
            histogram.min_age(),
            histogram.max_age(),
            histogram.len()
        );

        self.histogram = histogram;
        self.completed = true;

        info!("Simulation complete in {:?}", start.elapsed());
        Ok(())
    }

    /// Mean age at death
    pub fn expected_age(&self) -> Result<f64> {
        let n = self.ready()?;
        let age_sum: f64 = self
            .histogram
            .iter()
            .map(|(age, count)| age as f64 * count as f64)
            .sum();
        Ok(age_sum / n)
    }

    /// Fraction of the cohort dying strictly before `threshold`
    ///
    /// A death at exactly `threshold` does not count.
    pub fn probability_death_before_age(&self, threshold: u32) -> Result<f64> {
        let n = self.ready()?;
        let deaths: u64 = self
            .histogram
            .iter()
            .take_while(|&(age, _)| age < threshold)
            .map(|(_, count)| count)
            .sum();
        Ok(deaths as f64 / n)
    }

    /// Population standard deviation of age at death (divides by N)
    pub fn standard_deviation(&self) -> Result<f64> {
        let n = self.ready()?;
        let mean = self.expected_age()?;
        let variance: f64 = self
            .histogram
            .iter()
            .map(|(age, count)| count as f64 * (age as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        Ok(variance.sqrt())
    }

    /// Smallest age whose cumulative death count reaches floor(N / 2)
    pub fn median(&self) -> Result<u32> {
        self.ready()?;
        let target = self.simulations / 2;

        let mut cumulative = 0;
        for (age, count) in self.histogram.iter() {
            cumulative += count;
            if cumulative >= target {
                return Ok(age);
            }
        }

        // The histogram sums to N once complete, so this only fires if that
        // invariant is broken
        debug_assert!(false, "histogram total {} below N {}", cumulative, self.simulations);
        Err(SimulationError::precondition(format!(
            "histogram holds {} deaths, fewer than half of {} simulations",
            cumulative, self.simulations
        )))
    }

    /// Summary record for export, using a threshold of start age + 10
    pub fn export_summary(&self) -> Result<SimulationSummary> {
        let threshold_age = self.start_age.saturating_add(THRESHOLD_OFFSET);

        Ok(SimulationSummary {
            initial_age: self.start_age,
            simulations: self.simulations,
            expected_age: self.expected_age()?,
            threshold_age,
            probability_of_death_by_threshold: self.probability_death_before_age(threshold_age)?,
            standard_deviation: self.standard_deviation()?,
            median_age: self.median()?,
        })
    }

    /// Check the run has completed with at least one life; returns N as f64
    fn ready(&self) -> Result<f64> {
        if !self.completed {
            return Err(SimulationError::precondition(
                "statistics requested before the simulation was run",
            ));
        }
        if self.simulations == 0 {
            return Err(SimulationError::precondition(
                "statistics are undefined for a cohort of zero simulations",
            ));
        }
        Ok(self.simulations as f64)
    }
}

/// Independent ChaCha8 stream for trajectory `index` under `seed`
pub fn trajectory_rng(seed: u64, index: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::life::tests::ScriptedDraws;
    use approx::assert_relative_eq;

    fn two_year_table() -> Arc<MortalityTable> {
        Arc::new(MortalityTable::from_rates(vec![(30, 0.5), (31, 1.0)]).unwrap())
    }

    /// Trajectory `i` first draws `first[i]`, then always dies
    fn scripted(first: Vec<f64>) -> impl Fn(u64) -> ScriptedDraws + Sync {
        move |index| ScriptedDraws::new(vec![first[index as usize]], 0.0)
    }

    #[test]
    fn test_end_to_end_scripted_cohort() {
        let mut sim = CohortSimulation::new(30, 4, two_year_table());
        sim.run_with(scripted(vec![0.6, 0.4, 0.9, 0.3])).unwrap();

        let histogram = sim.histogram();
        assert_eq!(histogram.count(30), 2);
        assert_eq!(histogram.count(31), 2);
        assert_eq!(histogram.total(), 4);

        assert_relative_eq!(sim.expected_age().unwrap(), 30.5);
        assert_eq!(sim.median().unwrap(), 30);
        assert_relative_eq!(sim.standard_deviation().unwrap(), 0.5);
        assert_relative_eq!(sim.probability_death_before_age(31).unwrap(), 0.5);
        assert_relative_eq!(sim.probability_death_before_age(40).unwrap(), 1.0);
    }

    #[test]
    fn test_sequential_scripted_cohort_matches() {
        let mut sim = CohortSimulation::new(30, 4, two_year_table()).with_parallel(false);
        sim.run_with(scripted(vec![0.6, 0.4, 0.9, 0.3])).unwrap();

        assert_eq!(sim.histogram().count(30), 2);
        assert_eq!(sim.histogram().count(31), 2);
    }

    #[test]
    fn test_export_summary() {
        let mut sim = CohortSimulation::new(30, 4, two_year_table());
        sim.run_with(scripted(vec![0.6, 0.4, 0.9, 0.3])).unwrap();

        let summary = sim.export_summary().unwrap();
        assert_eq!(summary.initial_age, 30);
        assert_eq!(summary.simulations, 4);
        assert_eq!(summary.threshold_age, 40);
        assert_eq!(summary.threshold_label(), "Probability of Dying by Age 40");
        assert_relative_eq!(summary.expected_age, 30.5);
        assert_relative_eq!(summary.probability_of_death_by_threshold, 1.0);
        assert_relative_eq!(summary.standard_deviation, 0.5);
        assert_eq!(summary.median_age, 30);
    }

    #[test]
    fn test_histogram_invariants_with_real_table() {
        let table = Arc::new(MortalityTable::iam_2012_basic(crate::assumptions::Gender::Male));
        let mut sim = CohortSimulation::new(65, 5_000, table).with_seed(11);
        sim.run().unwrap();

        let histogram = sim.histogram();
        assert_eq!(histogram.total(), 5_000);
        assert!(histogram.min_age().unwrap() >= 65);
        // First untabulated age is 121
        assert!(histogram.max_age().unwrap() <= 121);

        assert_eq!(sim.probability_death_before_age(65).unwrap(), 0.0);
        assert_eq!(sim.probability_death_before_age(0).unwrap(), 0.0);
        assert_eq!(sim.probability_death_before_age(122).unwrap(), 1.0);

        let expected = sim.expected_age().unwrap();
        assert!(expected > 75.0 && expected < 100.0, "expected age {}", expected);
    }

    #[test]
    fn test_before_and_at_or_after_sum_to_one() {
        let table = Arc::new(MortalityTable::iam_2012_basic(crate::assumptions::Gender::Female));
        let mut sim = CohortSimulation::new(30, 2_000, table).with_seed(3);
        sim.run().unwrap();

        let n = sim.simulations() as f64;
        for threshold in [0, 30, 50, 80, 85, 100, 121, 200] {
            let at_or_after: u64 = sim
                .histogram()
                .iter()
                .filter(|&(age, _)| age >= threshold)
                .map(|(_, count)| count)
                .sum();
            let before = sim.probability_death_before_age(threshold).unwrap();
            assert_relative_eq!(before + at_or_after as f64 / n, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_same_seed_same_histogram_regardless_of_parallelism() {
        let table = Arc::new(MortalityTable::iam_2012_basic(crate::assumptions::Gender::Male));

        let mut parallel = CohortSimulation::new(40, 3_000, table.clone()).with_seed(99);
        let mut sequential = CohortSimulation::new(40, 3_000, table.clone())
            .with_seed(99)
            .with_parallel(false);
        let mut other_seed = CohortSimulation::new(40, 3_000, table).with_seed(100);

        parallel.run().unwrap();
        sequential.run().unwrap();
        other_seed.run().unwrap();

        assert_eq!(parallel.histogram(), sequential.histogram());
        assert_ne!(parallel.histogram(), other_seed.histogram());
    }

    #[test]
    fn test_certain_death_cohort() {
        let table = Arc::new(MortalityTable::default());
        let mut sim = CohortSimulation::new(55, 100, table);
        sim.run().unwrap();

        assert_eq!(sim.histogram().count(55), 100);
        assert_relative_eq!(sim.expected_age().unwrap(), 55.0);
        assert_relative_eq!(sim.standard_deviation().unwrap(), 0.0);
        assert_eq!(sim.median().unwrap(), 55);
    }

    #[test]
    fn test_median_uses_floor_of_half() {
        // Cumulative: 30 -> 1, 31 -> 2, 32 -> 5; floor(5/2) = 2 reached at 31
        let table = Arc::new(MortalityTable::from_rates(vec![(30, 0.5), (31, 0.5), (32, 1.0)]).unwrap());
        let mut sim = CohortSimulation::new(30, 5, table);
        sim.run_with(|index| {
            let draws = match index {
                0 => vec![0.1],
                1 => vec![0.9, 0.1],
                _ => vec![0.9, 0.9],
            };
            ScriptedDraws::new(draws, 0.0)
        })
        .unwrap();

        assert_eq!(sim.histogram().count(30), 1);
        assert_eq!(sim.histogram().count(31), 1);
        assert_eq!(sim.histogram().count(32), 3);
        assert_eq!(sim.median().unwrap(), 31);
    }

    #[test]
    fn test_single_life_median() {
        let mut sim = CohortSimulation::new(30, 1, two_year_table());
        sim.run_with(scripted(vec![0.9])).unwrap();

        // floor(1/2) = 0 is reached by the first bucket
        assert_eq!(sim.median().unwrap(), 31);
        assert_relative_eq!(sim.standard_deviation().unwrap(), 0.0);
    }

    #[test]
    fn test_statistics_before_run_fail() {
        let sim = CohortSimulation::new(30, 10, two_year_table());

        assert!(matches!(sim.expected_age(), Err(SimulationError::Precondition(_))));
        assert!(matches!(sim.probability_death_before_age(40), Err(SimulationError::Precondition(_))));
        assert!(matches!(sim.standard_deviation(), Err(SimulationError::Precondition(_))));
        assert!(matches!(sim.median(), Err(SimulationError::Precondition(_))));
        assert!(matches!(sim.export_summary(), Err(SimulationError::Precondition(_))));
    }

    #[test]
    fn test_zero_simulations_fail() {
        let mut sim = CohortSimulation::new(30, 0, two_year_table());
        sim.run().unwrap();

        assert!(sim.is_complete());
        assert!(sim.histogram().is_empty());
        assert!(matches!(sim.expected_age(), Err(SimulationError::Precondition(_))));
        assert!(matches!(sim.median(), Err(SimulationError::Precondition(_))));
    }

    #[test]
    fn test_second_run_is_rejected() {
        let mut sim = CohortSimulation::new(30, 10, two_year_table());
        sim.run().unwrap();

        let result = sim.run();
        assert!(matches!(result, Err(SimulationError::Precondition(_))));
        assert_eq!(sim.histogram().total(), 10);
    }

    #[test]
    fn test_trajectory_streams_differ() {
        use rand::Rng;

        let a: u64 = trajectory_rng(1, 0).gen();
        let b: u64 = trajectory_rng(1, 1).gen();
        let c: u64 = trajectory_rng(1, 0).gen();

        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
