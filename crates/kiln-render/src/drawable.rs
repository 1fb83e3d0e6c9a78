//! Drawables: everything a draw call needs, behind one interface
//!
//! The frame recorder walks a list of `&dyn Drawable` and issues the same
//! bind-and-draw sequence for each, whatever the category.

use kiln_particles::ParticleForGpu;
use std::ops::Range;

use crate::pipeline::{BindLayouts, PipelineKey, PipelineRegistry};
use crate::primitives::Mesh;
use crate::texture::GpuTexture;
use crate::uniforms::{CameraUniforms, DirectionalLightUniforms, MaterialUniforms, TransformationMatrix};
use crate::upload::{create_buffer_init, TypedBuffer};

/// Vertex buffer plus optional index buffer
pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
}

impl GpuGeometry {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertex_buffer = create_buffer_init(
            device,
            &format!("{label} Vertex Buffer"),
            wgpu::BufferUsages::VERTEX,
            &mesh.vertices,
        );
        let index_buffer = mesh.is_indexed().then(|| {
            create_buffer_init(
                device,
                &format!("{label} Index Buffer"),
                wgpu::BufferUsages::INDEX,
                &mesh.indices,
            )
        });
        Self {
            vertex_buffer,
            vertex_count: mesh.vertex_count() as u32,
            index_buffer,
            index_count: mesh.index_count() as u32,
        }
    }

    pub fn draw_range(&self, instance_count: u32) -> Option<DrawRange> {
        DrawRange::plan(
            self.vertex_count,
            self.index_buffer.as_ref().map(|_| self.index_count),
            instance_count,
        )
    }
}

/// Arguments of one draw call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawRange {
    Indexed { indices: Range<u32>, instances: Range<u32> },
    Vertices { vertices: Range<u32>, instances: Range<u32> },
}

impl DrawRange {
    /// `None` when the draw would produce nothing: no instances, no
    /// vertices, or an index buffer with no indices.
    pub fn plan(vertex_count: u32, index_count: Option<u32>, instance_count: u32) -> Option<Self> {
        if instance_count == 0 || vertex_count == 0 {
            return None;
        }
        let instances = 0..instance_count;
        match index_count {
            Some(0) => None,
            Some(count) => Some(Self::Indexed {
                indices: 0..count,
                instances,
            }),
            None => Some(Self::Vertices {
                vertices: 0..vertex_count,
                instances,
            }),
        }
    }
}

/// Instances to draw for `count` live records, never more than the
/// instance buffer holds
pub fn clamp_instance_count(count: usize, capacity: usize) -> u32 {
    count.min(capacity).min(u32::MAX as usize) as u32
}

pub trait Drawable {
    fn pipeline_key(&self) -> PipelineKey;
    fn geometry(&self) -> &GpuGeometry;
    /// Group 0 (per-draw constants) and group 1 (texture)
    fn bind_groups(&self) -> [&wgpu::BindGroup; 2];
    fn instance_count(&self) -> u32 {
        1
    }
}

/// Bind and draw one drawable. Nothing is issued for zero instances.
pub fn record_draw(pass: &mut wgpu::RenderPass<'_>, registry: &PipelineRegistry, drawable: &dyn Drawable) {
    let geometry = drawable.geometry();
    let Some(range) = geometry.draw_range(drawable.instance_count()) else {
        return;
    };

    pass.set_pipeline(registry.pipeline(drawable.pipeline_key()));
    for (index, group) in drawable.bind_groups().into_iter().enumerate() {
        pass.set_bind_group(index as u32, group, &[]);
    }
    pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
    match (range, &geometry.index_buffer) {
        (DrawRange::Indexed { indices, instances }, Some(buffer)) => {
            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(indices, 0, instances);
        }
        (DrawRange::Vertices { vertices, instances }, _) => pass.draw(vertices, instances),
        (DrawRange::Indexed { .. }, None) => {}
    }
}

pub fn create_texture_bind_group(
    device: &wgpu::Device,
    layouts: &BindLayouts,
    texture: &GpuTexture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &layouts.texture,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
        label: Some(label),
    })
}

/// Per-object constant buffers, updated every frame
pub struct ObjectConstants {
    pub transform: TypedBuffer<TransformationMatrix>,
    pub material: TypedBuffer<MaterialUniforms>,
    pub light: TypedBuffer<DirectionalLightUniforms>,
    pub camera: TypedBuffer<CameraUniforms>,
}

impl ObjectConstants {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        Self {
            transform: TypedBuffer::uniform(device, &format!("{label} Transform"), TransformationMatrix::default()),
            material: TypedBuffer::uniform(device, &format!("{label} Material"), MaterialUniforms::default()),
            light: TypedBuffer::uniform(device, &format!("{label} Light"), DirectionalLightUniforms::default()),
            camera: TypedBuffer::uniform(device, &format!("{label} Camera"), CameraUniforms::default()),
        }
    }

    pub fn write(
        &mut self,
        queue: &wgpu::Queue,
        transform: TransformationMatrix,
        material: MaterialUniforms,
        light: DirectionalLightUniforms,
        camera: CameraUniforms,
    ) {
        self.transform.write(queue, transform);
        self.material.write(queue, material);
        self.light.write(queue, light);
        self.camera.write(queue, camera);
    }
}

/// Sphere, model or sprite: one mesh, one set of constants, selectable texture
pub struct ObjectDrawable {
    key: PipelineKey,
    geometry: GpuGeometry,
    pub constants: ObjectConstants,
    constant_group: wgpu::BindGroup,
    textures: Vec<wgpu::BindGroup>,
    active_texture: usize,
}

impl ObjectDrawable {
    /// `textures` must hold at least one bind group; index 0 starts active.
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindLayouts,
        key: PipelineKey,
        label: &str,
        geometry: GpuGeometry,
        textures: Vec<wgpu::BindGroup>,
    ) -> Self {
        let constants = ObjectConstants::new(device, label);
        let constant_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.object,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: constants.transform.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: constants.material.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: constants.light.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: constants.camera.buffer().as_entire_binding(),
                },
            ],
            label: Some(&format!("{label} Constants Bind Group")),
        });
        Self {
            key,
            geometry,
            constants,
            constant_group,
            textures,
            active_texture: 0,
        }
    }

    /// Switch texture; out-of-range indices are ignored
    pub fn select_texture(&mut self, index: usize) {
        if index < self.textures.len() {
            self.active_texture = index;
        }
    }
}

impl Drawable for ObjectDrawable {
    fn pipeline_key(&self) -> PipelineKey {
        self.key
    }

    fn geometry(&self) -> &GpuGeometry {
        &self.geometry
    }

    fn bind_groups(&self) -> [&wgpu::BindGroup; 2] {
        [&self.constant_group, &self.textures[self.active_texture]]
    }
}

/// Instanced particle quads fed from the instance array
pub struct ParticleDrawable {
    geometry: GpuGeometry,
    pub instances: TypedBuffer<ParticleForGpu>,
    pub material: TypedBuffer<MaterialUniforms>,
    constant_group: wgpu::BindGroup,
    texture: wgpu::BindGroup,
    instance_count: u32,
}

impl ParticleDrawable {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindLayouts,
        geometry: GpuGeometry,
        texture: wgpu::BindGroup,
        capacity: usize,
    ) -> Self {
        let instances = TypedBuffer::new(device, "Particle Instances", wgpu::BufferUsages::STORAGE, capacity);
        let material = TypedBuffer::uniform(device, "Particle Material", MaterialUniforms::default());
        let constant_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.instanced,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: instances.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: material.buffer().as_entire_binding(),
                },
            ],
            label: Some("Particle Constants Bind Group"),
        });
        Self {
            geometry,
            instances,
            material,
            constant_group,
            texture,
            instance_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.instances.capacity()
    }

    /// Number of instances drawn; clamped to the buffer's capacity
    pub fn set_instance_count(&mut self, count: usize) {
        self.instance_count = clamp_instance_count(count, self.capacity());
    }
}

impl Drawable for ParticleDrawable {
    fn pipeline_key(&self) -> PipelineKey {
        PipelineKey::ParticleQuad
    }

    fn geometry(&self) -> &GpuGeometry {
        &self.geometry
    }

    fn bind_groups(&self) -> [&wgpu::BindGroup; 2] {
        [&self.constant_group, &self.texture]
    }

    fn instance_count(&self) -> u32 {
        self.instance_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_count_never_exceeds_capacity() {
        assert_eq!(clamp_instance_count(203, 100), 100);
        assert_eq!(clamp_instance_count(100, 100), 100);
        assert_eq!(clamp_instance_count(42, 100), 42);
        assert_eq!(clamp_instance_count(0, 100), 0);
        assert_eq!(clamp_instance_count(7, 0), 0);
    }

    #[test]
    fn zero_instances_draw_nothing() {
        assert_eq!(DrawRange::plan(6, None, 0), None);
        assert_eq!(DrawRange::plan(289, Some(1536), 0), None);
    }

    #[test]
    fn empty_geometry_draws_nothing() {
        assert_eq!(DrawRange::plan(0, None, 1), None);
        assert_eq!(DrawRange::plan(4, Some(0), 1), None);
    }

    #[test]
    fn indexed_mesh_draws_every_index() {
        assert_eq!(
            DrawRange::plan(289, Some(1536), 1),
            Some(DrawRange::Indexed {
                indices: 0..1536,
                instances: 0..1,
            })
        );
    }

    #[test]
    fn instanced_quad_draws_clamped_count() {
        let instances = clamp_instance_count(150, 100);
        assert_eq!(
            DrawRange::plan(6, None, instances),
            Some(DrawRange::Vertices {
                vertices: 0..6,
                instances: 0..100,
            })
        );
    }
}
