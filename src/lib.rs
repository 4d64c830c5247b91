//! Disks bouncing in a box and trading coins whenever they collide.
//!
//! Each collision swaps the disks' normal velocities and redistributes their coins
//! at random. Over many collisions the share of disks holding `k` coins approaches
//! a Boltzmann-like distribution, which [`Statistics`] tracks as a running estimate.
//!
//! ```no_run
//! use coin_sim::{Simulation, SimulationParams};
//!
//! let mut sim = Simulation::new(SimulationParams::default())?;
//! for _ in 0..10_000 {
//!     sim.advance(1.0 / 60.0, 1.0);
//! }
//! println!("{:?}", sim.stats().current_distribution_estimate());
//! # Ok::<(), coin_sim::SimError>(())
//! ```

pub mod body;
pub mod collision;
pub mod error;
pub mod exchange;
pub mod params;
pub mod population;
pub mod simulation;
pub mod stats;

pub use body::{Arena, Body, MIN_SPEED_MULTIPLIER};
pub use collision::{CollisionOutcome, TickResult};
pub use error::{Result, SimError};
pub use exchange::ExchangePolicy;
pub use params::SimulationParams;
pub use population::Population;
pub use simulation::Simulation;
pub use stats::{EstimateMode, SampleClock, Statistics};
