//! Movement input for the headless client
//!
//! There is no keyboard here: a random walk stands in for the player. The
//! heading drifts a little every frame and occasionally jumps to a new
//! direction, which produces the kind of wandering traffic a real player
//! would.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::Duration;

/// Default walking speed in pixels per second
pub const DEFAULT_SPEED: f32 = 120.0;

/// Chance per second of picking a completely new heading
const TURN_RATE: f32 = 0.5;

/// Largest heading drift per second, in radians
const MAX_DRIFT: f32 = 1.5;

/// Produces movement deltas for the local player
pub struct InputManager {
    rng: StdRng,
    heading: f32,
    speed: f32,
}

impl InputManager {
    pub fn new(speed: f32) -> Self {
        Self::with_rng(StdRng::from_entropy(), speed)
    }

    /// Deterministic walk, for reproducible runs
    pub fn seeded(seed: u64, speed: f32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), speed)
    }

    fn with_rng(mut rng: StdRng, speed: f32) -> Self {
        let heading = rng.gen_range(0.0..TAU);
        Self {
            rng,
            heading,
            speed: speed.max(0.0),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Advances the walk by `dt` and returns the `(dx, dy)` to apply
    pub fn update(&mut self, dt: Duration) -> (f32, f32) {
        let dt = dt.as_secs_f32();
        if dt <= 0.0 {
            return (0.0, 0.0);
        }

        if self.rng.gen_bool((TURN_RATE * dt).min(1.0) as f64) {
            self.heading = self.rng.gen_range(0.0..TAU);
        } else {
            let drift = MAX_DRIFT * dt;
            self.heading = (self.heading + self.rng.gen_range(-drift..=drift)).rem_euclid(TAU);
            // rem_euclid can round up to TAU itself for tiny negative inputs
            if self.heading >= TAU {
                self.heading = 0.0;
            }
        }

        let distance = self.speed * dt;
        (self.heading.cos() * distance, self.heading.sin() * distance)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}
