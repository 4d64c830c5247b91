//! Pairwise overlap detection and elastic response.

use rand::Rng;

use crate::body::Body;
use crate::error::SimError;
use crate::exchange::ExchangePolicy;

/// Result of testing one pair of disks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// Centres are at least `r_a + r_b` apart, or their distance is not finite.
    Separate,
    /// Overlap resolved: velocities, coins and positions updated.
    Resolved,
    /// Coincident centres. Nothing was changed for this pair.
    Degenerate,
}

/// Collision tallies for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickResult {
    pub collisions: u64,
    pub degenerate: u64,
}

/// Test one pair and, if the disks overlap, resolve the collision in place.
///
/// Resolution swaps the velocity components along the line of centres (equal
/// masses), lets `policy` redistribute the coins, and pushes both disks apart
/// by half the overlap each so they end up exactly touching.
pub fn resolve_pair<R: Rng>(
    a: &mut Body,
    b: &mut Body,
    policy: ExchangePolicy,
    max_coins: u32,
    rng: &mut R,
) -> CollisionOutcome {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let contact = a.radius + b.radius;
    let dist2 = dx * dx + dy * dy;
    // written so a NaN distance also counts as separate
    if !(dist2 < contact * contact) {
        return CollisionOutcome::Separate;
    }

    let dist = dist2.sqrt();
    if dist == 0.0 {
        return CollisionOutcome::Degenerate;
    }

    let nx = dx / dist;
    let ny = dy / dist;

    let v1n = a.vx * nx + a.vy * ny;
    let v2n = b.vx * nx + b.vy * ny;

    // swap normal components
    a.vx += (v2n - v1n) * nx;
    a.vy += (v2n - v1n) * ny;
    b.vx += (v1n - v2n) * nx;
    b.vy += (v1n - v2n) * ny;

    let (coins_a, coins_b) = policy.exchange(a.coins, b.coins, max_coins, rng);
    a.coins = coins_a;
    b.coins = coins_b;

    // push them apart
    let half_overlap = 0.5 * (contact - dist);
    a.x -= nx * half_overlap;
    a.y -= ny * half_overlap;
    b.x += nx * half_overlap;
    b.y += ny * half_overlap;

    CollisionOutcome::Resolved
}

/// Run every unordered pair `(i, j)`, `i < j`, through [`resolve_pair`] once.
///
/// Pairs are visited in ascending order and resolved one after another, so a disk
/// hit by several others in the same tick sees the state left by earlier pairs.
pub fn resolve_all<R: Rng>(
    bodies: &mut [Body],
    policy: ExchangePolicy,
    max_coins: u32,
    rng: &mut R,
) -> TickResult {
    let mut result = TickResult::default();
    let n = bodies.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let (head, tail) = bodies.split_at_mut(j);
            match resolve_pair(&mut head[i], &mut tail[0], policy, max_coins, rng) {
                CollisionOutcome::Separate => {}
                CollisionOutcome::Resolved => result.collisions += 1,
                CollisionOutcome::Degenerate => {
                    log::debug!("skipping pair: {}", SimError::DegenerateCollision { i, j });
                    result.degenerate += 1;
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const INDEPENDENT: ExchangePolicy = ExchangePolicy::IndependentTrial;
    const UNIFORM: ExchangePolicy = ExchangePolicy::UniformRedistribution;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn collide(a: &mut Body, b: &mut Body, policy: ExchangePolicy) -> CollisionOutcome {
        resolve_pair(a, b, policy, 8, &mut rng())
    }

    #[test]
    fn tangent_disks_do_not_collide() {
        let mut a = Body::new(0.0, 0.0, 1.0, 0.0, 5.0, 4);
        let mut b = Body::new(10.0, 0.0, -1.0, 0.0, 5.0, 4);
        assert_eq!(
            collide(&mut a, &mut b, INDEPENDENT),
            CollisionOutcome::Separate
        );
        assert_eq!((a.vx, b.vx), (1.0, -1.0));
    }

    #[test]
    fn non_finite_position_is_never_a_collision() {
        for bad in [f32::NAN, f32::INFINITY] {
            let mut a = Body::new(bad, 50.0, 1.0, 0.0, 5.0, 8);
            let mut b = Body::new(250.0, 250.0, -1.0, 0.0, 5.0, 0);
            assert_eq!(collide(&mut a, &mut b, UNIFORM), CollisionOutcome::Separate);
            assert_eq!((b.x, b.y, b.vx, b.vy), (250.0, 250.0, -1.0, 0.0));
            assert_eq!((a.coins, b.coins), (8, 0));
        }
    }

    #[test]
    fn head_on_swaps_normal_velocity() {
        let mut a = Body::new(0.0, 0.0, 3.0, 2.0, 5.0, 0);
        let mut b = Body::new(8.0, 0.0, -1.0, -4.0, 5.0, 0);
        assert_eq!(
            collide(&mut a, &mut b, INDEPENDENT),
            CollisionOutcome::Resolved
        );
        // normal is +x: x components swap, y components untouched
        assert!((a.vx - -1.0).abs() < 1e-6);
        assert!((b.vx - 3.0).abs() < 1e-6);
        assert!((a.vy - 2.0).abs() < 1e-6);
        assert!((b.vy - -4.0).abs() < 1e-6);
    }

    #[test]
    fn oblique_collision_conserves_momentum_and_energy() {
        let mut a = Body::new(0.0, 0.0, 5.0, 1.0, 5.0, 0);
        let mut b = Body::new(6.0, 6.0, -2.0, -3.0, 5.0, 0);
        let p0 = (a.vx + b.vx, a.vy + b.vy);
        let e0 = a.vx * a.vx + a.vy * a.vy + b.vx * b.vx + b.vy * b.vy;
        collide(&mut a, &mut b, INDEPENDENT);
        let p1 = (a.vx + b.vx, a.vy + b.vy);
        let e1 = a.vx * a.vx + a.vy * a.vy + b.vx * b.vx + b.vy * b.vy;
        assert!((p0.0 - p1.0).abs() < 1e-4 && (p0.1 - p1.1).abs() < 1e-4);
        assert!((e0 - e1).abs() < 1e-3);
    }

    #[test]
    fn overlap_is_removed_symmetrically() {
        let mut a = Body::new(100.0, 100.0, 0.0, 0.0, 10.0, 0);
        let mut b = Body::new(112.0, 100.0, 0.0, 0.0, 10.0, 0);
        collide(&mut a, &mut b, UNIFORM);
        assert!((a.distance_to(&b) - 20.0).abs() < 1e-4);
        assert!((a.x - 96.0).abs() < 1e-4);
        assert!((b.x - 116.0).abs() < 1e-4);
    }

    #[test]
    fn coincident_centres_are_skipped() {
        let mut a = Body::new(50.0, 50.0, 1.0, 0.0, 5.0, 8);
        let mut b = Body::new(50.0, 50.0, -1.0, 0.0, 5.0, 0);
        assert_eq!(
            collide(&mut a, &mut b, UNIFORM),
            CollisionOutcome::Degenerate
        );
        assert_eq!((a.coins, b.coins), (8, 0));
        assert_eq!((a.vx, b.vx), (1.0, -1.0));
    }

    #[test]
    fn resolve_all_counts_each_overlapping_pair_once() {
        let mut bodies = vec![
            Body::new(0.0, 0.0, 0.0, 0.0, 5.0, 2),
            Body::new(8.0, 0.0, 0.0, 0.0, 5.0, 2),
            Body::new(100.0, 0.0, 0.0, 0.0, 5.0, 2),
            Body::new(100.0, 0.0, 0.0, 0.0, 5.0, 2),
        ];
        let result = resolve_all(&mut bodies, UNIFORM, 8, &mut rng());
        assert_eq!(result.collisions, 1);
        assert_eq!(result.degenerate, 1);
        assert_eq!(bodies.iter().map(|b| b.coins).sum::<u32>(), 8);
    }

    #[test]
    fn later_pairs_see_earlier_updates() {
        // 0 overlaps 1, and 1 overlaps 2 only after being pushed by pair (0, 1).
        let mut bodies = vec![
            Body::new(0.0, 0.0, 0.0, 0.0, 5.0, 0),
            Body::new(6.0, 0.0, 0.0, 0.0, 5.0, 0),
            Body::new(17.5, 0.0, 0.0, 0.0, 5.0, 0),
        ];
        let result = resolve_all(&mut bodies, INDEPENDENT, 8, &mut rng());
        assert_eq!(result.collisions, 2);
        assert!((bodies[1].distance_to(&bodies[2]) - 10.0).abs() < 1e-4);
    }
}
