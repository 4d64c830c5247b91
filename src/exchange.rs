//! Coin exchange rules applied when two disks collide.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How two colliding disks redistribute their coins.
///
/// The two rules have different conservation properties:
/// - `IndependentTrial` flips a fair coin for every coin each disk holds and moves
///   the winners across, then clamps both disks to the cap. Coins pushed over the
///   cap are lost, so the population total can shrink.
/// - `UniformRedistribution` pools the pair's coins and picks one admissible split
///   uniformly at random. The pair total is always preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangePolicy {
    #[default]
    IndependentTrial,
    UniformRedistribution,
}

impl ExchangePolicy {
    pub fn label(self) -> &'static str {
        match self {
            ExchangePolicy::IndependentTrial => "Independent trial",
            ExchangePolicy::UniformRedistribution => "Uniform redistribution",
        }
    }

    /// New coin counts for a colliding pair holding `a` and `b` coins.
    pub fn exchange<R: Rng>(self, a: u32, b: u32, max_coins: u32, rng: &mut R) -> (u32, u32) {
        match self {
            ExchangePolicy::IndependentTrial => independent_trial(a, b, max_coins, rng),
            ExchangePolicy::UniformRedistribution => uniform_redistribution(a, b, max_coins, rng),
        }
    }
}

fn fair_flips<R: Rng>(trials: u32, rng: &mut R) -> u32 {
    (0..trials).filter(|_| rng.random_bool(0.5)).count() as u32
}

fn independent_trial<R: Rng>(a: u32, b: u32, max_coins: u32, rng: &mut R) -> (u32, u32) {
    let a_to_b = fair_flips(a, rng);
    let b_to_a = fair_flips(b, rng);

    let new_a = a - a_to_b + b_to_a;
    let new_b = b - b_to_a + a_to_b;

    (new_a.min(max_coins), new_b.min(max_coins))
}

fn uniform_redistribution<R: Rng>(a: u32, b: u32, max_coins: u32, rng: &mut R) -> (u32, u32) {
    let total = u64::from(a) + u64::from(b);
    let cap = u64::from(max_coins);

    // Splits (s, total - s) with both sides inside [0, cap].
    let lo = total.saturating_sub(cap);
    let hi = total.min(cap);
    if lo > hi {
        return (a, b);
    }

    let share = rng.random_range(lo..=hi);
    (share as u32, (total - share) as u32)
}
