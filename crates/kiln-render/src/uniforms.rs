//! Uniform buffer layouts shared with the WGSL shaders

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-object transforms (group 0, binding 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TransformationMatrix {
    pub wvp: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

impl TransformationMatrix {
    pub fn new(world: Mat4, view_projection: Mat4) -> Self {
        Self {
            wvp: (view_projection * world).to_cols_array_2d(),
            world: world.to_cols_array_2d(),
        }
    }
}

impl Default for TransformationMatrix {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Surface parameters (group 0, binding 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub color: [f32; 4],
    pub enable_lighting: i32,
    pub _pad0: [f32; 3],
    pub uv_transform: [[f32; 4]; 4],
    pub shininess: f32,
    pub _pad1: [f32; 3],
}

impl MaterialUniforms {
    pub fn new(color: Vec4, enable_lighting: bool, uv_transform: Mat4, shininess: f32) -> Self {
        Self {
            color: color.to_array(),
            enable_lighting: enable_lighting as i32,
            _pad0: [0.0; 3],
            uv_transform: uv_transform.to_cols_array_2d(),
            shininess,
            _pad1: [0.0; 3],
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::new(Vec4::ONE, false, Mat4::IDENTITY, 10.0)
    }
}

/// Single directional light (group 0, binding 2)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightUniforms {
    pub color: [f32; 4],
    pub direction: [f32; 3],
    pub intensity: f32,
}

impl DirectionalLightUniforms {
    pub fn new(color: Vec4, direction: Vec3, intensity: f32) -> Self {
        Self {
            color: color.to_array(),
            direction: direction.normalize_or_zero().to_array(),
            intensity,
        }
    }
}

impl Default for DirectionalLightUniforms {
    fn default() -> Self {
        Self::new(Vec4::ONE, Vec3::NEG_Y, 1.0)
    }
}

/// Eye position for specular (group 0, binding 3)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub world_position: [f32; 3],
    pub _pad: f32,
}

impl CameraUniforms {
    pub fn new(world_position: Vec3) -> Self {
        Self {
            world_position: world_position.to_array(),
            _pad: 0.0,
        }
    }
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
