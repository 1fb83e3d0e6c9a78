//! Particle state

use glam::{Vec3, Vec4};
use kiln_core::Transform;

/// Tolerance for time comparisons at lifetime and emission boundaries.
///
/// Fixed-step deltas such as 1/60 do not sum exactly in f32; 120 steps land
/// at 1.9999988 rather than 2.0. Boundaries closer than this count as reached.
pub const TIME_EPSILON: f32 = 1.0e-4;

/// CPU-side particle state
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub transform: Transform,
    pub velocity: Vec3,
    pub color: Vec4,
    pub lifetime: f32,
    pub elapsed: f32,
}

impl Particle {
    /// Advance position and age by `dt` seconds. Age never passes the lifetime.
    pub fn advance(&mut self, dt: f32) {
        self.transform.translate += self.velocity * dt;
        self.elapsed = (self.elapsed + dt).min(self.lifetime);
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed + TIME_EPSILON >= self.lifetime
    }

    /// Opacity over lifetime: 1 when born, 0 at expiry
    pub fn fade(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - self.elapsed / self.lifetime).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(lifetime: f32) -> Particle {
        Particle {
            transform: Transform::IDENTITY,
            velocity: Vec3::new(1.0, -2.0, 0.5),
            color: Vec4::ONE,
            lifetime,
            elapsed: 0.0,
        }
    }

    #[test]
    fn advance_moves_along_velocity() {
        let mut p = particle(3.0);
        p.advance(0.5);
        assert_eq!(p.transform.translate, Vec3::new(0.5, -1.0, 0.25));
        assert_eq!(p.elapsed, 0.5);
    }

    #[test]
    fn elapsed_is_clamped_to_lifetime() {
        let mut p = particle(1.0);
        p.advance(0.75);
        p.advance(0.75);
        assert_eq!(p.elapsed, 1.0);
        assert!(p.is_expired());
    }

    #[test]
    fn fade_endpoints() {
        let mut p = particle(2.0);
        assert_eq!(p.fade(), 1.0);
        p.elapsed = 2.0;
        assert_eq!(p.fade(), 0.0);
    }

    #[test]
    fn fade_strictly_decreases() {
        let mut p = particle(2.0);
        let mut last = p.fade();
        for step in 1..=200 {
            p.elapsed = step as f32 * 0.01;
            let alpha = p.fade();
            assert!(alpha < last, "fade did not decrease at elapsed {}", p.elapsed);
            last = alpha;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn accumulated_sixtieths_reach_lifetime() {
        let mut p = particle(2.0);
        for _ in 0..119 {
            p.advance(1.0 / 60.0);
        }
        assert!(!p.is_expired());
        p.advance(1.0 / 60.0);
        assert!(p.is_expired());
    }
}
