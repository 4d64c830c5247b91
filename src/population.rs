//! The fixed set of disks a simulation runs on, and its initial layout.

use rand::Rng;

use crate::body::{Arena, Body};
use crate::error::{Result, SimError};
use crate::params::{MAX_COINS_LIMIT, SimulationParams};

/// An ordered, fixed-size set of disks sharing one arena and one coin cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    bodies: Vec<Body>,
    arena: Arena,
    max_coins: u32,
}

impl Population {
    /// Scatter `params.num_disks` disks over the arena without overlap.
    ///
    /// Each disk gets up to `params.max_placement_attempts` random positions; if none
    /// of them clears every disk already placed, placement fails as a whole.
    /// Velocity components are uniform in `[-max_initial_speed, max_initial_speed]`.
    pub fn initialize<R: Rng>(params: &SimulationParams, rng: &mut R) -> Result<Self> {
        params.validate()?;

        let r = params.radius;
        let arena = params.arena();
        let speed = params.max_initial_speed;
        let mut bodies: Vec<Body> = Vec::with_capacity(params.num_disks);

        for i in 0..params.num_disks {
            let spot = (0..params.max_placement_attempts).find_map(|_| {
                let x = rng.random_range(r..=(arena.width - r));
                let y = rng.random_range(r..=(arena.height - r));
                let clear = bodies
                    .iter()
                    .all(|b| (b.x - x).hypot(b.y - y) >= b.radius + r);
                clear.then_some((x, y))
            });

            let Some((x, y)) = spot else {
                let err = SimError::PlacementFailure {
                    placed: i,
                    requested: params.num_disks,
                    attempts: params.max_placement_attempts,
                };
                log::warn!("{err}");
                return Err(err);
            };

            let vx = rng.random_range(-speed..=speed);
            let vy = rng.random_range(-speed..=speed);
            bodies.push(Body::new(x, y, vx, vy, r, params.initial_coins_for(i)));
        }

        log::info!(
            "placed {} disks (radius {}) in a {}x{} arena, {} coins total",
            bodies.len(),
            r,
            arena.width,
            arena.height,
            bodies.iter().map(|b| u64::from(b.coins)).sum::<u64>()
        );

        Ok(Self {
            bodies,
            arena,
            max_coins: params.max_coins,
        })
    }

    /// Build a population from explicit disks, e.g. a hand-made scenario.
    ///
    /// Overlap is allowed here; the first step resolves it.
    pub fn from_bodies(bodies: Vec<Body>, arena: Arena, max_coins: u32) -> Result<Self> {
        if bodies.is_empty() {
            return Err(SimError::invalid("population must hold at least one disk"));
        }
        if max_coins > MAX_COINS_LIMIT {
            return Err(SimError::invalid(format!(
                "max_coins {max_coins} exceeds the limit of {MAX_COINS_LIMIT}"
            )));
        }
        for (i, b) in bodies.iter().enumerate() {
            if ![b.x, b.y, b.vx, b.vy].iter().all(|c| c.is_finite()) {
                return Err(SimError::invalid(format!(
                    "disk {i} has a non-finite position or velocity"
                )));
            }
            if !b.radius.is_finite() || b.radius <= 0.0 {
                return Err(SimError::invalid(format!(
                    "disk {i} has radius {}",
                    b.radius
                )));
            }
            if b.coins > max_coins {
                return Err(SimError::invalid(format!(
                    "disk {i} holds {} coins, above max_coins {max_coins}",
                    b.coins
                )));
            }
        }
        Ok(Self {
            bodies,
            arena,
            max_coins,
        })
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn max_coins(&self) -> u32 {
        self.max_coins
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_coins(&self) -> u64 {
        self.bodies.iter().map(|b| u64::from(b.coins)).sum()
    }

    /// Number of disks currently holding exactly `k` coins, for `k` in `0..=max_coins`.
    pub fn histogram(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.max_coins as usize + 1];
        for b in &self.bodies {
            counts[b.coins as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_layout_has_no_overlap() -> Result<()> {
        let params = SimulationParams::default();
        let pop = Population::initialize(&params, &mut StdRng::seed_from_u64(9))?;
        assert_eq!(pop.len(), params.num_disks);
        assert_eq!(pop.total_coins(), 8);

        let bodies = pop.bodies();
        for i in 0..bodies.len() {
            let b = &bodies[i];
            assert!(b.x >= b.radius && b.x <= params.arena_width - b.radius);
            assert!(b.y >= b.radius && b.y <= params.arena_height - b.radius);
            assert!(b.vx.abs() <= params.max_initial_speed);
            for other in &bodies[i + 1..] {
                assert!(b.distance_to(other) >= b.radius + other.radius);
            }
        }
        Ok(())
    }

    #[test]
    fn crowded_arena_reports_placement_failure() {
        let params = SimulationParams {
            num_disks: 50,
            radius: 40.0,
            arena_width: 200.0,
            arena_height: 200.0,
            max_placement_attempts: 100,
            ..Default::default()
        };
        let err = Population::initialize(&params, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(
            err,
            SimError::PlacementFailure { requested: 50, attempts: 100, .. }
        ));
    }

    #[test]
    fn invalid_params_rejected_before_placement() {
        let params = SimulationParams {
            num_disks: 0,
            ..Default::default()
        };
        assert!(matches!(
            Population::initialize(&params, &mut StdRng::seed_from_u64(1)),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn histogram_covers_every_value() -> Result<()> {
        let pop = Population::from_bodies(
            vec![
                Body::new(10.0, 10.0, 0.0, 0.0, 1.0, 0),
                Body::new(20.0, 10.0, 0.0, 0.0, 1.0, 3),
                Body::new(30.0, 10.0, 0.0, 0.0, 1.0, 3),
            ],
            Arena::new(100.0, 100.0),
            4,
        )?;
        assert_eq!(pop.histogram(), vec![1, 0, 0, 2, 0]);
        assert_eq!(pop.total_coins(), 6);
        Ok(())
    }

    #[test]
    fn from_bodies_rejects_non_finite_state() {
        let arena = Arena::new(300.0, 300.0);
        let bad = [
            Body::new(f32::NAN, 50.0, 0.0, 0.0, 10.0, 8),
            Body::new(50.0, f32::INFINITY, 0.0, 0.0, 10.0, 8),
            Body::new(50.0, 50.0, f32::NAN, 0.0, 10.0, 8),
            Body::new(50.0, 50.0, 0.0, f32::NEG_INFINITY, 10.0, 8),
        ];
        for body in bad {
            let far = Body::new(250.0, 250.0, 0.0, 0.0, 10.0, 0);
            let res = Population::from_bodies(vec![body, far], arena, 8);
            assert!(matches!(res, Err(SimError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn from_bodies_rejects_oversized_cap() {
        let res = Population::from_bodies(
            vec![Body::new(10.0, 10.0, 0.0, 0.0, 1.0, 0)],
            Arena::new(100.0, 100.0),
            u32::MAX,
        );
        assert!(matches!(res, Err(SimError::InvalidConfiguration(_))));
    }

    #[test]
    fn from_bodies_rejects_coins_above_cap() {
        let res = Population::from_bodies(
            vec![Body::new(10.0, 10.0, 0.0, 0.0, 1.0, 9)],
            Arena::new(100.0, 100.0),
            8,
        );
        assert!(res.is_err());
    }
}
