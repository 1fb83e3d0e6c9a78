//! Pipeline configuration registry
//!
//! Each drawable category has a fixed description (shader, vertex layout,
//! raster, depth, bind layout). The only mutable input is the selected
//! blend mode, which feeds the categories whose blend is selectable.
//! Blend changes are recorded as pending and only rebuilt once the frame
//! fence reports no GPU work in flight.

use crate::blend::BlendMode;
use crate::context::{RenderError, DEPTH_FORMAT};
use crate::fence::FrameFence;
use crate::primitives::Vertex;
use crate::shader::{ShaderId, ShaderLibrary, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Drawable categories, each with its own pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKey {
    Opaque,
    ParticleQuad,
    Sprite,
}

impl PipelineKey {
    pub const ALL: [PipelineKey; 3] = [Self::Opaque, Self::ParticleQuad, Self::Sprite];

    fn index(self) -> usize {
        match self {
            Self::Opaque => 0,
            Self::ParticleQuad => 1,
            Self::Sprite => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Opaque => "Opaque Pipeline",
            Self::ParticleQuad => "Particle Pipeline",
            Self::Sprite => "Sprite Pipeline",
        }
    }
}

/// Which bind group 0 layout a category uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindLayoutKind {
    /// transform, material, light, camera uniforms
    Object,
    /// instance storage buffer, material uniform
    Instanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendPolicy {
    /// Follows the registry's selected blend mode
    Selectable,
    Fixed(BlendMode),
}

/// Everything needed to build one pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub key: PipelineKey,
    pub shader: ShaderId,
    pub bind_layout: BindLayoutKind,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub blend_policy: BlendPolicy,
    pub blend: Option<wgpu::BlendState>,
}

impl PipelineConfig {
    /// Description of `key` under the selected blend `mode`
    pub fn for_key(key: PipelineKey, mode: BlendMode) -> Self {
        let (shader, bind_layout, cull_mode, depth_compare, depth_write, blend_policy) = match key {
            PipelineKey::Opaque => (
                ShaderId::Object3d,
                BindLayoutKind::Object,
                Some(wgpu::Face::Back),
                wgpu::CompareFunction::LessEqual,
                true,
                BlendPolicy::Selectable,
            ),
            PipelineKey::ParticleQuad => (
                ShaderId::Particle,
                BindLayoutKind::Instanced,
                None,
                wgpu::CompareFunction::LessEqual,
                false,
                BlendPolicy::Fixed(BlendMode::Add),
            ),
            PipelineKey::Sprite => (
                ShaderId::Object3d,
                BindLayoutKind::Object,
                None,
                wgpu::CompareFunction::Always,
                false,
                BlendPolicy::Selectable,
            ),
        };
        let effective = match blend_policy {
            BlendPolicy::Selectable => mode,
            BlendPolicy::Fixed(fixed) => fixed,
        };
        Self {
            key,
            shader,
            bind_layout,
            cull_mode,
            front_face: wgpu::FrontFace::Cw,
            depth_compare,
            depth_write,
            blend_policy,
            blend: effective.blend_state(),
        }
    }
}

/// Blend state as shown in the debug UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStatus {
    pub active: BlendMode,
    pub pending: Option<BlendMode>,
    /// Rebuilds applied since startup
    pub rebuilds: u32,
}

/// Deferred blend-mode change: requested from the UI, applied between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendSwap {
    current: BlendMode,
    pending: Option<BlendMode>,
    applied: u32,
}

impl BlendSwap {
    pub fn new(current: BlendMode) -> Self {
        Self {
            current,
            pending: None,
            applied: 0,
        }
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            active: self.current,
            pending: self.pending,
            rebuilds: self.applied,
        }
    }

    pub fn current(&self) -> BlendMode {
        self.current
    }

    pub fn pending(&self) -> Option<BlendMode> {
        self.pending
    }

    /// Record a change. Asking for the active mode cancels any pending change.
    pub fn request(&mut self, mode: BlendMode) {
        self.pending = (mode != self.current).then_some(mode);
    }

    /// The mode to rebuild with, if a change is pending and the GPU is idle.
    pub fn take_ready(&mut self, gpu_idle: bool) -> Option<BlendMode> {
        if !gpu_idle {
            return None;
        }
        let mode = self.pending.take()?;
        self.current = mode;
        self.applied += 1;
        Some(mode)
    }
}

/// Bind group layouts shared by pipelines and drawables
pub struct BindLayouts {
    pub object: wgpu::BindGroupLayout,
    pub instanced: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl BindLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        // Group 0 for meshes and the sprite
        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(3, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("Object Bind Group Layout"),
        });

        // Group 0 for particles: instance storage buffer (read-only) + material
        let instanced = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("Instanced Bind Group Layout"),
        });

        // Group 1: Texture + sampler
        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("Texture Bind Group Layout"),
        });

        Self {
            object,
            instanced,
            texture,
        }
    }
}

/// Owns one pipeline per category and rebuilds them on blend changes
pub struct PipelineRegistry {
    format: wgpu::TextureFormat,
    shaders: ShaderLibrary,
    layouts: BindLayouts,
    object_layout: wgpu::PipelineLayout,
    instanced_layout: wgpu::PipelineLayout,
    pipelines: Vec<wgpu::RenderPipeline>,
    swap: BlendSwap,
}

impl PipelineRegistry {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        shaders: ShaderLibrary,
        blend_mode: BlendMode,
    ) -> Result<Self, RenderError> {
        let layouts = BindLayouts::new(device);
        let object_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Object Pipeline Layout"),
            bind_group_layouts: &[&layouts.object, &layouts.texture],
            push_constant_ranges: &[],
        });
        let instanced_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Instanced Pipeline Layout"),
            bind_group_layouts: &[&layouts.instanced, &layouts.texture],
            push_constant_ranges: &[],
        });

        let mut registry = Self {
            format,
            shaders,
            layouts,
            object_layout,
            instanced_layout,
            pipelines: Vec::new(),
            swap: BlendSwap::new(blend_mode),
        };
        registry.pipelines = registry.build_all(device, blend_mode)?;
        Ok(registry)
    }

    pub fn layouts(&self) -> &BindLayouts {
        &self.layouts
    }

    pub fn status(&self) -> PipelineStatus {
        self.swap.status()
    }

    pub fn pipeline(&self, key: PipelineKey) -> &wgpu::RenderPipeline {
        &self.pipelines[key.index()]
    }

    /// Queue a blend change; nothing is rebuilt until [`Self::apply_pending`].
    pub fn request_blend_mode(&mut self, mode: BlendMode) {
        self.swap.request(mode);
    }

    /// Rebuild with the pending blend mode if the fence shows no work in flight.
    /// Returns whether a rebuild happened.
    pub fn apply_pending(&mut self, device: &wgpu::Device, fence: &FrameFence) -> Result<bool, RenderError> {
        if self.swap.pending().is_some() && !fence.is_idle() {
            log::debug!("blend change deferred: GPU still busy");
        }
        let Some(mode) = self.swap.take_ready(fence.is_idle()) else {
            return Ok(false);
        };
        self.pipelines = self.build_all(device, mode)?;
        log::info!("pipelines rebuilt with blend mode {mode}");
        Ok(true)
    }

    fn build_all(&self, device: &wgpu::Device, mode: BlendMode) -> Result<Vec<wgpu::RenderPipeline>, RenderError> {
        PipelineKey::ALL
            .iter()
            .map(|&key| self.build(device, &PipelineConfig::for_key(key, mode)))
            .collect()
    }

    fn build(&self, device: &wgpu::Device, config: &PipelineConfig) -> Result<wgpu::RenderPipeline, RenderError> {
        let module = self.shaders.module(config.shader);
        let layout = match config.bind_layout {
            BindLayoutKind::Object => &self.object_layout,
            BindLayoutKind::Instanced => &self.instanced_layout,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(config.key.label()),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: config.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: config.front_face,
                cull_mode: config.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: config.depth_write,
                depth_compare: config.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::PipelineCreation {
                name: config.key.label().to_string(),
                message: error.to_string(),
            });
        }
        Ok(pipeline)
    }
}
