//! Mesh primitives (sphere, sprite quad, particle quad)

use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

/// A vertex with homogeneous position, UV, and normal
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Float32x2,
        2 => Float32x3,
    ];

    pub fn new(position: [f32; 3], texcoord: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position: [position[0], position[1], position[2], 1.0],
            texcoord,
            normal,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A mesh with vertices and optional indices
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }
}

pub const SPHERE_SUBDIVISION: u32 = 16;

/// Latitude/longitude unit sphere.
///
/// `(n + 1)²` vertices and `n · n · 6` indices. Triangles wind clockwise
/// seen from outside.
pub fn create_sphere_mesh(subdivision: u32) -> Mesh {
    let n = subdivision.max(3);
    let lon_every = 2.0 * PI / n as f32;
    let lat_every = PI / n as f32;

    let mut vertices = Vec::with_capacity(((n + 1) * (n + 1)) as usize);
    for lat_index in 0..=n {
        let lat = -PI / 2.0 + lat_every * lat_index as f32;
        for lon_index in 0..=n {
            let lon = lon_every * lon_index as f32;
            let p = [lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin()];
            vertices.push(Vertex::new(
                p,
                [
                    lon_index as f32 / n as f32,
                    1.0 - lat_index as f32 / n as f32,
                ],
                p,
            ));
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    let row = n + 1;
    for lat in 0..n {
        for lon in 0..n {
            let lt = lon + lat * row;
            let rt = (lon + 1) + lat * row;
            let lb = lon + (lat + 1) * row;
            let rb = (lon + 1) + (lat + 1) * row;
            indices.extend_from_slice(&[lb, lt, rb, lt, rt, rb]);
        }
    }

    Mesh { vertices, indices }
}

/// Screen-space quad from the origin to `(width, height)` in pixels, y down.
pub fn create_sprite_mesh(width: f32, height: f32) -> Mesh {
    let normal = [0.0, 0.0, -1.0];
    Mesh {
        vertices: vec![
            Vertex::new([0.0, height, 0.0], [0.0, 1.0], normal),
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0], normal),
            Vertex::new([width, height, 0.0], [1.0, 1.0], normal),
            Vertex::new([width, 0.0, 0.0], [1.0, 0.0], normal),
        ],
        indices: vec![0, 1, 2, 1, 3, 2],
    }
}

/// Two-unit square in the XY plane, non-indexed. Used for each particle
/// instance and as the stand-in when the model file is missing.
pub fn create_quad_mesh() -> Mesh {
    let normal = [0.0, 0.0, 1.0];
    let lt = Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0], normal);
    let rt = Vertex::new([1.0, 1.0, 0.0], [1.0, 0.0], normal);
    let lb = Vertex::new([-1.0, -1.0, 0.0], [0.0, 1.0], normal);
    let rb = Vertex::new([1.0, -1.0, 0.0], [1.0, 1.0], normal);
    Mesh {
        vertices: vec![lt, rt, lb, lb, rt, rb],
        indices: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        assert_eq!(Vertex::desc().array_stride, 36);
    }

    #[test]
    fn sphere_counts() {
        let sphere = create_sphere_mesh(SPHERE_SUBDIVISION);
        assert_eq!(sphere.vertex_count(), 17 * 17);
        assert_eq!(sphere.index_count(), 16 * 16 * 6);
        let max = *sphere.indices.iter().max().unwrap();
        assert!((max as usize) < sphere.vertex_count());
    }

    #[test]
    fn sphere_normals_are_unit_positions() {
        let sphere = create_sphere_mesh(8);
        for v in &sphere.vertices {
            let n = glam::Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert_eq!(v.position[3], 1.0);
            assert_eq!([v.position[0], v.position[1], v.position[2]], v.normal);
        }
    }

    #[test]
    fn sphere_poles_and_uvs() {
        let sphere = create_sphere_mesh(4);
        // first row is the south pole, uv v = 1
        assert!((sphere.vertices[0].position[1] + 1.0).abs() < 1e-6);
        assert_eq!(sphere.vertices[0].texcoord, [0.0, 1.0]);
        let last = sphere.vertices.last().unwrap();
        assert!((last.position[1] - 1.0).abs() < 1e-6);
        assert_eq!(last.texcoord, [1.0, 0.0]);
    }

    #[test]
    fn sprite_quad() {
        let sprite = create_sprite_mesh(640.0, 360.0);
        assert_eq!(sprite.vertex_count(), 4);
        assert_eq!(sprite.indices, vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(sprite.vertices[3].position, [640.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn quad_is_non_indexed() {
        let quad = create_quad_mesh();
        assert_eq!(quad.vertex_count(), 6);
        assert!(!quad.is_indexed());
    }
}
