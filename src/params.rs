//! Run configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! num_disks = 20
//! radius = 15.0
//! max_coins = 12
//! initial_coins = [12, 12, 12]
//! policy = "uniform_redistribution"
//! estimate = "average_count"
//! seed = 42
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::body::Arena;
use crate::error::{Result, SimError};
use crate::exchange::ExchangePolicy;
use crate::stats::EstimateMode;

// ===================================================================================
// Default Constants
// ===================================================================================

pub const DEFAULT_NUM_DISKS: usize = 6;
pub const DEFAULT_RADIUS: f32 = 40.0;
pub const DEFAULT_ARENA_WIDTH: f32 = 800.0;
pub const DEFAULT_ARENA_HEIGHT: f32 = 600.0;
pub const DEFAULT_MAX_COINS: u32 = 8;
pub const DEFAULT_MAX_INITIAL_SPEED: f32 = 200.0;
pub const DEFAULT_SAMPLE_INTERVAL: f32 = 0.1;
pub const DEFAULT_ROLLING_SAMPLES: usize = 50;
pub const DEFAULT_MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Largest accepted coin cap. Statistics keep one bin per coin value.
pub const MAX_COINS_LIMIT: u32 = 1024;
/// Largest accepted rolling window, in samples.
pub const MAX_ROLLING_SAMPLES: usize = 10_000;

/// Parameters fixed for the lifetime of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub num_disks: usize,
    pub radius: f32,
    pub arena_width: f32,
    pub arena_height: f32,
    /// Upper bound on the coins a single disk may hold.
    pub max_coins: u32,
    /// Starting coins per disk, by index. Disks past the end start with none.
    pub initial_coins: Vec<u32>,
    /// Each initial velocity component is drawn uniformly from `[-s, s]`.
    pub max_initial_speed: f32,
    pub policy: ExchangePolicy,
    pub estimate: EstimateMode,
    /// Elapsed time between statistics samples, in seconds.
    pub sample_interval: f32,
    /// Number of recent histograms averaged by the rolling view.
    pub rolling_samples: usize,
    /// Seed for the run's random source. `None` draws a fresh one.
    pub seed: Option<u64>,
    /// Rejection-sampling budget per disk during placement.
    pub max_placement_attempts: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            num_disks: DEFAULT_NUM_DISKS,
            radius: DEFAULT_RADIUS,
            arena_width: DEFAULT_ARENA_WIDTH,
            arena_height: DEFAULT_ARENA_HEIGHT,
            max_coins: DEFAULT_MAX_COINS,
            initial_coins: vec![DEFAULT_MAX_COINS],
            max_initial_speed: DEFAULT_MAX_INITIAL_SPEED,
            policy: ExchangePolicy::default(),
            estimate: EstimateMode::default(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            rolling_samples: DEFAULT_ROLLING_SAMPLES,
            seed: None,
            max_placement_attempts: DEFAULT_MAX_PLACEMENT_ATTEMPTS,
        }
    }
}

impl SimulationParams {
    /// Load parameters from a TOML file and validate them.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let params: SimulationParams = toml::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn arena(&self) -> Arena {
        Arena::new(self.arena_width, self.arena_height)
    }

    /// Coins held by disk `index` at start.
    pub fn initial_coins_for(&self, index: usize) -> u32 {
        self.initial_coins.get(index).copied().unwrap_or(0)
    }

    /// Reject parameter sets the simulation cannot start from.
    ///
    /// Nothing is clamped: a bad value is always an error.
    pub fn validate(&self) -> Result<()> {
        if self.num_disks == 0 {
            return Err(SimError::invalid("num_disks must be > 0"));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SimError::invalid("radius must be finite and > 0"));
        }
        if !self.arena_width.is_finite() || !self.arena_height.is_finite() {
            return Err(SimError::invalid("arena size must be finite"));
        }
        let diameter = 2.0 * self.radius;
        if self.arena_width < diameter || self.arena_height < diameter {
            return Err(SimError::invalid(format!(
                "arena {}x{} cannot hold a disk of radius {}",
                self.arena_width, self.arena_height, self.radius
            )));
        }
        if !self.max_initial_speed.is_finite() || self.max_initial_speed < 0.0 {
            return Err(SimError::invalid("max_initial_speed must be finite, >= 0"));
        }
        if !self.sample_interval.is_finite() || self.sample_interval <= 0.0 {
            return Err(SimError::invalid("sample_interval must be finite and > 0"));
        }
        if self.max_coins > MAX_COINS_LIMIT {
            return Err(SimError::invalid(format!(
                "max_coins {} exceeds the limit of {MAX_COINS_LIMIT}",
                self.max_coins
            )));
        }
        if self.rolling_samples == 0 || self.rolling_samples > MAX_ROLLING_SAMPLES {
            return Err(SimError::invalid(format!(
                "rolling_samples must be in 1..={MAX_ROLLING_SAMPLES}"
            )));
        }
        if self.max_placement_attempts == 0 {
            return Err(SimError::invalid("max_placement_attempts must be > 0"));
        }
        if self.initial_coins.len() > self.num_disks {
            return Err(SimError::invalid(format!(
                "{} initial coin entries for {} disks",
                self.initial_coins.len(),
                self.num_disks
            )));
        }
        if let Some((i, q)) = self
            .initial_coins
            .iter()
            .enumerate()
            .find(|&(_, &q)| q > self.max_coins)
        {
            return Err(SimError::invalid(format!(
                "disk {i} starts with {q} coins, above max_coins {}",
                self.max_coins
            )));
        }
        // with at most num_disks entries each within max_coins, the total
        // can never exceed num_disks * max_coins
        Ok(())
    }
}
