//! Emitter configuration, timer state and particle creation

use glam::{Vec3, Vec4};
use kiln_core::Transform;

use crate::particle::{Particle, TIME_EPSILON};
use crate::rand::RandomSource;

/// Half-extent of the random offset from the emitter origin, per axis
pub const POSITION_JITTER: f32 = 1.0;
/// Half-extent of the random initial velocity, per axis
pub const VELOCITY_RANGE: f32 = 1.0;
pub const LIFETIME_MIN: f32 = 1.0;
pub const LIFETIME_MAX: f32 = 3.0;

/// Spawns particles around `origin` every `interval` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub origin: Transform,
    /// Particles per emission
    pub count: u32,
    /// Seconds between timed emissions
    pub interval: f32,
    pub time_since_last: f32,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(3, 0.5)
    }
}

impl Emitter {
    pub fn new(count: u32, interval: f32) -> Self {
        Self {
            origin: Transform::IDENTITY,
            count,
            interval,
            time_since_last: 0.0,
        }
    }

    /// Advance the timer and return how many emissions are due.
    ///
    /// Each emission consumes one `interval` from the accumulator, so the
    /// remainder carries into the next frame. A non-positive interval never
    /// fires.
    ///
    /// An interval counts as reached once the accumulator is within
    /// [`TIME_EPSILON`] of it, so an emission can fire up to 0.1 ms early.
    /// Fixed-step deltas do not sum exactly in f32; without the tolerance an
    /// emission could slip a whole frame. An early fire leaves a slightly
    /// negative remainder, which the next interval absorbs.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.time_since_last += dt;
        if self.interval.is_nan() || self.interval <= 0.0 {
            return 0;
        }
        let mut due = 0;
        while self.time_since_last + TIME_EPSILON >= self.interval {
            self.time_since_last -= self.interval;
            due += 1;
        }
        due
    }
}

/// Create one particle around `origin`.
///
/// Draw order from `rng`: jitter xyz, velocity xyz, color rgb, lifetime.
pub fn make_particle(origin: Vec3, rng: &mut impl RandomSource) -> Particle {
    let jitter = Vec3::new(
        rng.range(-POSITION_JITTER, POSITION_JITTER),
        rng.range(-POSITION_JITTER, POSITION_JITTER),
        rng.range(-POSITION_JITTER, POSITION_JITTER),
    );
    let velocity = Vec3::new(
        rng.range(-VELOCITY_RANGE, VELOCITY_RANGE),
        rng.range(-VELOCITY_RANGE, VELOCITY_RANGE),
        rng.range(-VELOCITY_RANGE, VELOCITY_RANGE),
    );
    let color = Vec4::new(
        rng.range(0.0, 1.0),
        rng.range(0.0, 1.0),
        rng.range(0.0, 1.0),
        1.0,
    );
    let lifetime = rng.range(LIFETIME_MIN, LIFETIME_MAX);

    Particle {
        transform: Transform::from_translation(origin + jitter),
        velocity,
        color,
        lifetime,
        elapsed: 0.0,
    }
}

/// Produce `count` fresh particles anchored at the emitter origin.
/// The emitter itself is left untouched.
pub fn emit(emitter: &Emitter, count: u32, rng: &mut impl RandomSource) -> Vec<Particle> {
    let origin = emitter.origin.translate;
    (0..count).map(|_| make_particle(origin, rng)).collect()
}
