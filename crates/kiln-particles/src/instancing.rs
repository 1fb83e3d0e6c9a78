//! Projection of the live set into the GPU instance array

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::particle::Particle;

/// Per-instance record, matching WGSL `ParticleForGpu`.
/// 144 bytes: two column-major mat4 and a vec4.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleForGpu {
    pub wvp: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Rotation that turns a quad toward the camera.
///
/// The quad is flipped half a turn about Y and then given the camera's
/// orientation. Translation is stripped so the particle keeps its own.
pub fn billboard_matrix(camera_world: Mat4) -> Mat4 {
    let mut billboard = camera_world * Mat4::from_rotation_y(std::f32::consts::PI);
    billboard.w_axis = Vec4::W;
    billboard
}

/// World matrix of one particle, optionally billboarded.
pub fn particle_world(particle: &Particle, billboard: Option<&Mat4>) -> Mat4 {
    let t = &particle.transform;
    match billboard {
        Some(b) => {
            Mat4::from_translation(t.translate)
                * *b
                * t.rotation_matrix()
                * Mat4::from_scale(t.scale)
        }
        None => t.to_matrix(),
    }
}

/// Write one record per live particle into `slots`, stopping at its length.
///
/// Returns the number of records written, which is the instance count for
/// the draw. Slots past that count keep whatever the previous frame left
/// there. Particles that did not fit are still alive, just not drawn.
pub fn project(
    particles: &[Particle],
    view: Mat4,
    projection: Mat4,
    billboard: Option<Mat4>,
    slots: &mut [ParticleForGpu],
) -> usize {
    let view_projection = projection * view;
    let mut written = 0;
    for (particle, slot) in particles.iter().zip(slots.iter_mut()) {
        let world = particle_world(particle, billboard.as_ref());
        let mut color = particle.color;
        color.w = particle.fade();
        *slot = ParticleForGpu {
            wvp: (view_projection * world).to_cols_array_2d(),
            world: world.to_cols_array_2d(),
            color: color.to_array(),
        };
        written += 1;
    }
    written
}
