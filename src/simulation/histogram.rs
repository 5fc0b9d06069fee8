//! Frequency distribution of ages at death

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Count of simulated deaths by age, ordered by age
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeHistogram {
    counts: BTreeMap<u32, u64>,
    total: u64,
}

impl AgeHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one death at `age`
    pub fn record(&mut self, age: u32) {
        self.record_many(age, 1);
    }

    /// Record `count` deaths at `age`
    pub fn record_many(&mut self, age: u32, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(age).or_insert(0) += count;
        self.total += count;
    }

    /// Add every bucket of `other` into this histogram
    pub fn merge(&mut self, other: &AgeHistogram) {
        for (age, count) in other.iter() {
            self.record_many(age, count);
        }
    }

    /// Combine two partial histograms (used as a parallel reduce step)
    pub fn merged(mut self, other: AgeHistogram) -> Self {
        if self.counts.len() < other.counts.len() {
            let mut other = other;
            other.merge(&self);
            return other;
        }
        self.merge(&other);
        self
    }

    /// Deaths recorded at `age`
    pub fn count(&self, age: u32) -> u64 {
        self.counts.get(&age).copied().unwrap_or(0)
    }

    /// Sum of all bucket counts
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct ages at death
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn min_age(&self) -> Option<u32> {
        self.counts.keys().next().copied()
    }

    pub fn max_age(&self) -> Option<u32> {
        self.counts.keys().next_back().copied()
    }

    /// Iterate (age, count) in ascending age order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.counts.iter().map(|(&age, &count)| (age, count))
    }

    /// Write the distribution as `Age,Deaths,Fraction` rows
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["Age", "Deaths", "Fraction"])?;

        let total = self.total.max(1) as f64;
        for (age, count) in self.iter() {
            csv_writer.write_record(&[
                age.to_string(),
                count.to_string(),
                (count as f64 / total).to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the distribution to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }
}

impl FromIterator<u32> for AgeHistogram {
    fn from_iter<I: IntoIterator<Item = u32>>(ages: I) -> Self {
        let mut histogram = Self::new();
        for age in ages {
            histogram.record(age);
        }
        histogram
    }
}
