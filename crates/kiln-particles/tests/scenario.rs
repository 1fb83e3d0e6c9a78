//! Whole-system runs of the particle simulation at the sandbox's fixed step.

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use kiln_particles::{project, Emitter, ParticleForGpu, ParticleSystem, RandomSource};

const DT: f32 = 1.0 / 60.0;

/// Every draw returns 0.5, the midpoint of each emission range.
/// Lifetime becomes exactly 2.0 and velocity zero.
struct Midpoint;

impl RandomSource for Midpoint {
    fn next_f32(&mut self) -> f32 {
        0.5
    }
}

#[test]
fn initial_burst_is_gone_after_two_seconds() {
    let mut system = ParticleSystem::new(Emitter::new(3, 0.5), Midpoint);
    system.spawn(3);
    assert!(system.particles().iter().all(|p| p.lifetime == 2.0));

    for tick in 1..=120 {
        system.tick(DT);
        if tick < 120 {
            assert_eq!(system.alive(), 3, "removed early at tick {tick}");
        }
    }
    assert_eq!(system.alive(), 0);
}

#[test]
fn burst_is_retired_while_emitter_keeps_running() {
    let mut system = ParticleSystem::new(Emitter::new(3, 0.5), Midpoint);
    system.spawn(3);

    for _ in 0..120 {
        system.step(DT);
    }
    // Only particles from timed emissions (every 30 ticks) remain, all younger than 2s.
    assert!(system.alive() > 0);
    assert!(system.particles().iter().all(|p| p.elapsed < 2.0 - 1e-3));
    assert_eq!(system.alive() % 3, 0);
}

#[test]
fn simulation_is_not_limited_by_instance_capacity() {
    let mut system = ParticleSystem::with_seed(Emitter::new(60, 0.5), 11);
    system.manual_spawn();
    system.manual_spawn();
    system.step(DT);
    assert_eq!(system.alive(), 120);

    let mut slots = vec![ParticleForGpu::zeroed(); 100];
    let view = Mat4::look_at_lh(Vec3::new(0.0, 4.0, -10.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_lh(0.45, 1280.0 / 720.0, 0.1, 100.0);
    let drawn = project(system.particles(), view, projection, None, &mut slots);

    assert_eq!(drawn, 100);
    assert_eq!(system.alive(), 120);
}
