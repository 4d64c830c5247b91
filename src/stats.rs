//! Running estimates of the coin distribution.
//!
//! Each sample takes the current per-value histogram of the population and adds it
//! to a cumulative total. Dividing that total by the collision counter gives the
//! running estimate for each coin value, which settles towards the equilibrium
//! distribution as the run goes on. A ring buffer of the most recent histograms
//! gives a short-term view alongside it.

use serde::{Deserialize, Serialize};

use crate::population::Population;

/// Normalisation applied to the cumulative counts.
///
/// The two conventions differ by a factor of the population size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMode {
    /// `cumulative[k] / (N * C)`: probability that a given disk holds `k` coins.
    #[default]
    FractionOfDisks,
    /// `cumulative[k] / C`: expected number of disks holding `k` coins.
    AverageCount,
}

impl EstimateMode {
    pub fn label(self) -> &'static str {
        match self {
            EstimateMode::FractionOfDisks => "Fraction of disks",
            EstimateMode::AverageCount => "Average disk count",
        }
    }
}

/// Cumulative coin-value statistics for one run.
#[derive(Debug, Clone)]
pub struct Statistics {
    mode: EstimateMode,
    num_disks: usize,
    collisions: u64,
    cumulative: Vec<u64>,
    /// One `[collisions, estimate]` series per coin value.
    series: Vec<Vec<[f64; 2]>>,

    hist_ring: Vec<Vec<u64>>,
    hist_index: usize,
    stored_samples: usize,
    rolling: Vec<f64>,
}

impl Statistics {
    pub fn new(
        max_coins: u32,
        num_disks: usize,
        mode: EstimateMode,
        rolling_samples: usize,
    ) -> Self {
        let bins = max_coins as usize + 1;
        let rolling_samples = rolling_samples.max(1);
        Self {
            mode,
            num_disks,
            collisions: 0,
            cumulative: vec![0; bins],
            series: vec![Vec::new(); bins],
            hist_ring: vec![vec![0; bins]; rolling_samples],
            hist_index: 0,
            stored_samples: 0,
            rolling: vec![0.0; bins],
        }
    }

    /// Add a tick's collisions to the global counter.
    pub fn record_collisions(&mut self, count: u64) {
        self.collisions = self.collisions.saturating_add(count);
    }

    /// Fold the population's current histogram into the running totals and append
    /// one point per coin value to the time series.
    pub fn sample(&mut self, population: &Population) {
        let counts = population.histogram();
        for (total, &c) in self.cumulative.iter_mut().zip(&counts) {
            *total += c;
        }

        let x = self.collisions as f64;
        for k in 0..self.cumulative.len() {
            let y = self.estimate(k);
            self.series[k].push([x, y]);
        }

        self.push_and_smooth(counts);

        log::debug!(
            "sample {} at {} collisions: {:?}",
            self.sample_count(),
            self.collisions,
            self.current_distribution_estimate()
        );
    }

    /// Store `counts` in the ring buffer and recompute the average over it.
    fn push_and_smooth(&mut self, counts: Vec<u64>) {
        let slots = self.hist_ring.len();
        self.hist_ring[self.hist_index] = counts;
        self.hist_index = (self.hist_index + 1) % slots;
        if self.stored_samples < slots {
            self.stored_samples += 1;
        }

        self.rolling.fill(0.0);
        for frame in &self.hist_ring[..self.stored_samples] {
            for (acc, &c) in self.rolling.iter_mut().zip(frame) {
                *acc += c as f64;
            }
        }
        let denom = self.stored_samples as f64;
        for acc in &mut self.rolling {
            *acc /= denom;
        }
    }

    /// Running estimate for coin value `k`; zero while no collision has happened
    /// or when `k` is out of range.
    pub fn estimate(&self, k: usize) -> f64 {
        let Some(&total) = self.cumulative.get(k) else {
            return 0.0;
        };
        if self.collisions == 0 {
            return 0.0;
        }
        let denom = match self.mode {
            EstimateMode::FractionOfDisks => self.num_disks as f64 * self.collisions as f64,
            EstimateMode::AverageCount => self.collisions as f64,
        };
        total as f64 / denom
    }

    /// Running estimate for every coin value, indexed by `k`.
    pub fn current_distribution_estimate(&self) -> Vec<f64> {
        (0..self.cumulative.len()).map(|k| self.estimate(k)).collect()
    }

    pub fn total_collisions(&self) -> u64 {
        self.collisions
    }

    pub fn mode(&self) -> EstimateMode {
        self.mode
    }

    pub fn cumulative_counts(&self) -> &[u64] {
        &self.cumulative
    }

    /// Plot points `[collisions, estimate]` recorded for coin value `k`.
    pub fn series(&self, k: usize) -> &[[f64; 2]] {
        self.series.get(k).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sample_count(&self) -> usize {
        self.series.first().map_or(0, Vec::len)
    }

    /// Mean histogram over the most recent samples (disks per coin value).
    pub fn rolling_histogram(&self) -> &[f64] {
        &self.rolling
    }
}

/// Elapsed-time accumulator that throttles sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleClock {
    since_last: f32,
}

impl SampleClock {
    pub fn since_last(&self) -> f32 {
        self.since_last
    }
}

/// Sample `population` into `stats` once `interval` has elapsed since the last sample.
///
/// Nothing is recorded until at least one collision has happened; the clock keeps
/// running meanwhile, so the first sample lands on the first call after that.
/// Returns whether a sample was taken.
pub fn maybe_sample(
    clock: &mut SampleClock,
    elapsed: f32,
    interval: f32,
    population: &Population,
    stats: &mut Statistics,
) -> bool {
    clock.since_last += elapsed.max(0.0);
    if clock.since_last < interval || stats.total_collisions() == 0 {
        return false;
    }
    clock.since_last = 0.0;
    stats.sample(population);
    true
}
