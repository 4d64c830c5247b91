//! The simulation context: population, statistics and random source for one run.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::collision::{self, TickResult};
use crate::error::Result;
use crate::params::SimulationParams;
use crate::population::Population;
use crate::stats::{self, SampleClock, Statistics};

/// Owns everything a run mutates. Stepping and sampling happen through `&mut self`,
/// so readers only ever see state at a tick boundary.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimulationParams,
    seed: u64,
    rng: StdRng,
    population: Population,
    stats: Statistics,
    clock: SampleClock,
}

impl Simulation {
    /// Validate `params`, seed the random source and place the disks.
    pub fn new(params: SimulationParams) -> Result<Self> {
        params.validate()?;
        let seed = params.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let population = Population::initialize(&params, &mut rng)?;
        log::info!(
            "simulation seeded with {seed}, policy {:?}, estimate {:?}",
            params.policy,
            params.estimate
        );
        Ok(Self::assemble(params, seed, rng, population))
    }

    /// Run on a caller-built population instead of a random layout.
    ///
    /// The population's coin cap and size take precedence over `params.max_coins`
    /// and `params.num_disks`.
    pub fn with_population(params: SimulationParams, population: Population) -> Self {
        let seed = params.seed.unwrap_or_else(rand::random);
        let rng = StdRng::seed_from_u64(seed);
        Self::assemble(params, seed, rng, population)
    }

    fn assemble(
        params: SimulationParams,
        seed: u64,
        rng: StdRng,
        population: Population,
    ) -> Self {
        let stats = Statistics::new(
            population.max_coins(),
            population.len(),
            params.estimate,
            params.rolling_samples,
        );
        Self {
            params,
            seed,
            rng,
            population,
            stats,
            clock: SampleClock::default(),
        }
    }

    /// Advance one tick: move every disk by `dt` (scaled by `speed`), then resolve
    /// every overlapping pair in ascending index order.
    pub fn step(&mut self, dt: f32, speed: f32) -> TickResult {
        let dt = dt.max(0.0);
        let arena = *self.population.arena();

        self.population
            .bodies_mut()
            .par_iter_mut()
            .for_each(|b| b.advance(dt, speed, &arena));

        let max_coins = self.population.max_coins();
        let result = collision::resolve_all(
            self.population.bodies_mut(),
            self.params.policy,
            max_coins,
            &mut self.rng,
        );
        self.stats.record_collisions(result.collisions);
        result
    }

    /// Feed `elapsed` into the sampling clock and sample if the interval is reached.
    pub fn maybe_sample(&mut self, elapsed: f32) -> bool {
        stats::maybe_sample(
            &mut self.clock,
            elapsed,
            self.params.sample_interval,
            &self.population,
            &mut self.stats,
        )
    }

    /// `step` followed by `maybe_sample` with the same `dt`.
    pub fn advance(&mut self, dt: f32, speed: f32) -> TickResult {
        let result = self.step(dt, speed);
        self.maybe_sample(dt);
        result
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Arena, Body};
    use crate::exchange::ExchangePolicy;

    #[test]
    fn seeded_runs_are_reproducible() -> Result<()> {
        let params = SimulationParams {
            seed: Some(1234),
            ..Default::default()
        };
        let mut a = Simulation::new(params.clone())?;
        let mut b = Simulation::new(params)?;
        for _ in 0..500 {
            assert_eq!(a.advance(1.0 / 60.0, 1.0), b.advance(1.0 / 60.0, 1.0));
        }
        assert_eq!(a.population(), b.population());
        assert_eq!(a.stats().total_collisions(), b.stats().total_collisions());
        Ok(())
    }

    #[test]
    fn step_accumulates_collisions() -> Result<()> {
        let bodies = vec![
            Body::new(100.0, 100.0, 0.0, 0.0, 10.0, 4),
            Body::new(110.0, 100.0, 0.0, 0.0, 10.0, 4),
        ];
        let pop = Population::from_bodies(bodies, Arena::new(400.0, 400.0), 8)?;
        let params = SimulationParams {
            seed: Some(5),
            policy: ExchangePolicy::UniformRedistribution,
            ..Default::default()
        };
        let mut sim = Simulation::with_population(params, pop);
        assert_eq!(sim.step(0.0, 1.0).collisions, 1);
        assert_eq!(sim.step(0.0, 1.0).collisions, 0);
        assert_eq!(sim.stats().total_collisions(), 1);
        assert_eq!(sim.seed(), 5);
        Ok(())
    }
}
