//! Kiln Particles - CPU-simulated particles feeding an instanced draw
//!
//! Provides:
//! - Emission with randomized jitter, velocity, color and lifetime
//! - Per-tick integration with expiry and fade
//! - Timer-driven emitter that keeps its phase under variable frame time
//! - Projection of the live set into a fixed-capacity GPU instance array

pub mod emitter;
pub mod instancing;
pub mod particle;
pub mod rand;
pub mod system;

pub use emitter::{emit, Emitter};
pub use instancing::{billboard_matrix, project, ParticleForGpu};
pub use particle::{Particle, TIME_EPSILON};
pub use rand::{ParticleRng, RandomSource};
pub use system::ParticleSystem;
