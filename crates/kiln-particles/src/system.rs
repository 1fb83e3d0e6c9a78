//! Live particle set: tick, timed emission and manual spawns

use crate::emitter::{emit, Emitter};
use crate::particle::Particle;
use crate::rand::{ParticleRng, RandomSource};

/// Owns the emitter, the live particles and the random source feeding emission.
pub struct ParticleSystem<R: RandomSource = ParticleRng> {
    pub emitter: Emitter,
    particles: Vec<Particle>,
    rng: R,
    growth_warning: usize,
    warned: bool,
}

impl ParticleSystem<ParticleRng> {
    pub fn with_seed(emitter: Emitter, seed: u32) -> Self {
        Self::new(emitter, ParticleRng::new(seed))
    }
}

impl<R: RandomSource> ParticleSystem<R> {
    pub fn new(emitter: Emitter, rng: R) -> Self {
        Self {
            emitter,
            particles: Vec::new(),
            rng,
            growth_warning: usize::MAX,
            warned: false,
        }
    }

    /// Log a warning once the live count first exceeds `threshold`.
    /// The live set itself is never capped.
    pub fn set_growth_warning(&mut self, threshold: usize) {
        self.growth_warning = threshold;
        self.warned = false;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn alive(&self) -> usize {
        self.particles.len()
    }

    /// Integrate every live particle and drop the expired ones.
    ///
    /// Deltas that are zero, negative or NaN do not advance anything.
    pub fn tick(&mut self, dt: f32) {
        if dt > 0.0 {
            for p in &mut self.particles {
                p.advance(dt);
            }
        }

        let mut i = 0;
        while i < self.particles.len() {
            if self.particles[i].is_expired() {
                self.particles.swap_remove(i);
                // Don't increment i: the swapped-in particle needs checking
            } else {
                i += 1;
            }
        }
    }

    /// Advance the emitter timer and emit for every elapsed interval.
    /// Returns the number of emission events.
    pub fn emitter_tick(&mut self, dt: f32) -> u32 {
        if dt.is_nan() || dt <= 0.0 {
            return 0;
        }
        let events = self.emitter.accumulate(dt);
        for _ in 0..events {
            self.spawn(self.emitter.count);
        }
        events
    }

    /// Simulation step for one frame: tick, then emitter tick.
    pub fn step(&mut self, dt: f32) -> u32 {
        self.tick(dt);
        self.emitter_tick(dt)
    }

    /// Emit one batch right away, outside the timer.
    pub fn manual_spawn(&mut self) -> usize {
        self.spawn(self.emitter.count)
    }

    /// Append `count` particles at the emitter origin. Returns the number added.
    pub fn spawn(&mut self, count: u32) -> usize {
        let batch = emit(&self.emitter, count, &mut self.rng);
        let added = batch.len();
        self.particles.extend(batch);

        if !self.warned && self.particles.len() > self.growth_warning {
            self.warned = true;
            log::warn!(
                "live particle count {} passed {}; the simulation keeps growing",
                self.particles.len(),
                self.growth_warning
            );
        }
        added
    }

    /// Destroy every live particle and restart the emitter timer.
    pub fn reset(&mut self) {
        self.particles.clear();
        self.emitter.time_since_last = 0.0;
        self.warned = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always returns the same value.
    struct Constant(f32);

    impl RandomSource for Constant {
        fn next_f32(&mut self) -> f32 {
            self.0
        }
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn lifetime_invariant_holds_every_tick() {
        let mut system = ParticleSystem::with_seed(Emitter::default(), 99);
        system.spawn(40);
        for _ in 0..400 {
            system.step(DT);
            for p in system.particles() {
                assert!(p.elapsed >= 0.0);
                assert!(p.elapsed <= p.lifetime);
                assert!(!p.is_expired());
            }
        }
    }

    #[test]
    fn expired_particles_are_removed() {
        let mut system = ParticleSystem::new(Emitter::default(), Constant(0.0));
        // Constant(0.0) gives lifetime 1.0
        system.spawn(5);
        for _ in 0..59 {
            system.tick(DT);
        }
        assert_eq!(system.alive(), 5);
        system.tick(DT);
        assert_eq!(system.alive(), 0);
    }

    #[test]
    fn emitter_tick_emits_count_per_event() {
        let mut system = ParticleSystem::new(Emitter::new(4, 0.5), Constant(0.5));
        let mut events = 0;
        for _ in 0..12 {
            events += system.emitter_tick(0.1);
        }
        assert_eq!(events, 2);
        assert_eq!(system.alive(), 8);
        assert!((system.emitter.time_since_last - 0.2).abs() < 1e-5);
    }

    #[test]
    fn manual_spawn_bypasses_timer() {
        let mut system = ParticleSystem::new(Emitter::new(3, 0.5), Constant(0.5));
        assert_eq!(system.manual_spawn(), 3);
        assert_eq!(system.alive(), 3);
        assert_eq!(system.emitter.time_since_last, 0.0);
    }

    #[test]
    fn non_positive_delta_is_a_no_op() {
        let mut system = ParticleSystem::new(Emitter::default(), Constant(0.5));
        system.spawn(2);
        let before = system.particles().to_vec();
        system.step(0.0);
        system.step(-1.0);
        system.step(f32::NAN);
        assert_eq!(system.particles(), before.as_slice());
        assert_eq!(system.emitter.time_since_last, 0.0);
    }

    #[test]
    fn growth_is_not_capped() {
        let mut system = ParticleSystem::new(Emitter::new(50, 0.5), Constant(0.99));
        system.set_growth_warning(10);
        for _ in 0..5 {
            system.manual_spawn();
        }
        assert_eq!(system.alive(), 250);
    }

    #[test]
    fn reset_clears_everything() {
        let mut system = ParticleSystem::with_seed(Emitter::default(), 3);
        system.spawn(10);
        system.emitter_tick(0.3);
        system.reset();
        assert_eq!(system.alive(), 0);
        assert_eq!(system.emitter.time_since_last, 0.0);
    }
}
