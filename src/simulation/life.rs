//! Single-life trajectory simulated one year of age at a time

use rand::Rng;

use crate::assumptions::MortalityTable;

/// Starting age used when none is supplied
pub const DEFAULT_START_AGE: u32 = 30;

/// Source of independent uniform draws in [0, 1)
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Lifecycle of a simulated individual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    /// Alive at the start of the year beginning at this age
    Alive(u32),
    /// Died during the year that began at this age
    Dead(u32),
}

/// One simulated individual
#[derive(Debug, Clone)]
pub struct LifeTrajectory {
    state: LifeState,
}

impl LifeTrajectory {
    pub fn new(start_age: u32) -> Self {
        Self {
            state: LifeState::Alive(start_age),
        }
    }

    pub fn state(&self) -> LifeState {
        self.state
    }

    /// Current age while alive, final age once dead
    pub fn age(&self) -> u32 {
        match self.state {
            LifeState::Alive(age) | LifeState::Dead(age) => age,
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.state, LifeState::Dead(_))
    }

    /// Simulate one year
    ///
    /// Consumes exactly one draw while alive. Death is recorded at the age the
    /// year began, so a life that dies here keeps its current age. A dead life
    /// is left untouched and consumes nothing.
    pub fn step<S>(&mut self, table: &MortalityTable, source: &mut S) -> LifeState
    where
        S: UniformSource + ?Sized,
    {
        if let LifeState::Alive(age) = self.state {
            let qx = table.probability_of_death(age);
            let draw = source.next_uniform();

            self.state = if draw <= qx {
                LifeState::Dead(age)
            } else {
                // u32::MAX is the last representable age, so a life can
                // survive no further than that
                match age.checked_add(1) {
                    Some(next) => LifeState::Alive(next),
                    None => LifeState::Dead(age),
                }
            };
        }

        self.state
    }

    /// Step until death and return the age at death
    ///
    /// Terminates at or before the first untabulated age, where qx = 1.0.
    pub fn run_to_completion<S>(&mut self, table: &MortalityTable, source: &mut S) -> u32
    where
        S: UniformSource + ?Sized,
    {
        loop {
            if let LifeState::Dead(age) = self.step(table, source) {
                return age;
            }
        }
    }
}

impl Default for LifeTrajectory {
    fn default() -> Self {
        Self::new(DEFAULT_START_AGE)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::VecDeque;

    /// Replays a fixed list of draws, then a constant
    pub(crate) struct ScriptedDraws {
        draws: VecDeque<f64>,
        after: f64,
        pub consumed: usize,
    }

    impl ScriptedDraws {
        pub(crate) fn new(draws: Vec<f64>, after: f64) -> Self {
            Self {
                draws: draws.into(),
                after,
                consumed: 0,
            }
        }
    }

    impl UniformSource for ScriptedDraws {
        fn next_uniform(&mut self) -> f64 {
            self.consumed += 1;
            self.draws.pop_front().unwrap_or(self.after)
        }
    }

    fn flat_table(ages: std::ops::RangeInclusive<u32>, qx: f64) -> MortalityTable {
        MortalityTable::from_rates(ages.map(|age| (age, qx))).unwrap()
    }

    #[test]
    fn test_certain_death_ends_at_start_age() {
        let table = flat_table(0..=120, 1.0);

        for start_age in [0, 30, 65, 120, 500] {
            let mut life = LifeTrajectory::new(start_age);
            let mut draws = ScriptedDraws::new(vec![], 0.999_999);

            assert_eq!(life.run_to_completion(&table, &mut draws), start_age);
            assert_eq!(draws.consumed, 1);
            assert_eq!(life.state(), LifeState::Dead(start_age));
        }
    }

    #[test]
    fn test_zero_mortality_dies_at_first_untabulated_age() {
        let table = flat_table(0..=100, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for start_age in [0, 30, 100] {
            let mut life = LifeTrajectory::new(start_age);
            assert_eq!(life.run_to_completion(&table, &mut rng), 101);
        }
    }

    #[test]
    fn test_death_is_recorded_before_increment() {
        let table = MortalityTable::from_rates(vec![(30, 0.5), (31, 0.5), (32, 0.5)]).unwrap();

        // Survive 30 and 31, die during the year starting at 32
        let mut draws = ScriptedDraws::new(vec![0.9, 0.7, 0.2], 0.0);
        let mut life = LifeTrajectory::new(30);

        assert_eq!(life.step(&table, &mut draws), LifeState::Alive(31));
        assert_eq!(life.step(&table, &mut draws), LifeState::Alive(32));
        assert_eq!(life.step(&table, &mut draws), LifeState::Dead(32));
        assert_eq!(life.age(), 32);
    }

    #[test]
    fn test_survival_at_last_representable_age_ends_there() {
        let table = crate::assumptions::load_mortality_table_from_reader(
            "Age,Qx\n4294967295,0.5\n".as_bytes(),
        )
        .unwrap();
        let mut draws = ScriptedDraws::new(vec![0.9], 0.0);
        let mut life = LifeTrajectory::new(u32::MAX);

        assert_eq!(life.run_to_completion(&table, &mut draws), u32::MAX);
        assert_eq!(life.state(), LifeState::Dead(u32::MAX));
        assert_eq!(draws.consumed, 1);
    }

    #[test]
    fn test_draw_equal_to_qx_is_death() {
        let table = MortalityTable::from_rates(vec![(40, 0.25)]).unwrap();
        let mut draws = ScriptedDraws::new(vec![0.25], 0.0);
        let mut life = LifeTrajectory::new(40);

        assert_eq!(life.run_to_completion(&table, &mut draws), 40);
    }

    #[test]
    fn test_dead_life_consumes_no_draws() {
        let table = MortalityTable::default();
        let mut draws = ScriptedDraws::new(vec![], 0.5);
        let mut life = LifeTrajectory::new(45);

        life.run_to_completion(&table, &mut draws);
        assert!(life.is_dead());
        assert_eq!(draws.consumed, 1);

        assert_eq!(life.step(&table, &mut draws), LifeState::Dead(45));
        assert_eq!(draws.consumed, 1);
    }

    #[test]
    fn test_default_start_age() {
        let life = LifeTrajectory::default();
        assert_eq!(life.state(), LifeState::Alive(DEFAULT_START_AGE));
        assert!(!life.is_dead());
    }

    #[test]
    fn test_rng_draws_are_in_unit_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..10_000 {
            let u = rng.next_uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
