//! wgpu frame backend
//!
//! Owns the device, the pipeline registry and one drawable per scene
//! object. Uploads the scene's uniforms, records the four draws in fixed
//! order, appends the UI pass and presents.

use anyhow::{Context, Result};
use kiln_core::SandboxConfig;
use kiln_render::{
    create_quad_mesh, create_sphere_mesh, create_sprite_mesh, create_texture_bind_group, load_obj, record_draw,
    BlendMode, CompletionSource, Drawable, FrameFence, GpuGeometry, GpuTexture, Mesh, ObjectDrawable, ParticleDrawable,
    PipelineKey, PipelineRegistry, PipelineStatus, QueueCompletion, RenderContext, RenderError, ShaderLibrary, TextureData,
    SPHERE_SUBDIVISION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use winit::window::Window;

use crate::orchestrator::{FrameBackend, FrameError};
use crate::overlay::{Overlay, PreparedUi};
use crate::scene::{DrawSlot, Scene, DRAW_ORDER};

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.25,
    b: 0.5,
    a: 1.0,
};

/// Sprite rectangle in pixels
const SPRITE_SIZE: (f32, f32) = (640.0, 360.0);

/// Texture index on the sphere drawable
const UV_CHECKER: usize = 0;
const MONSTER_BALL: usize = 1;

pub struct SandboxRenderer {
    context: RenderContext,
    registry: PipelineRegistry,
    sphere: ObjectDrawable,
    model: ObjectDrawable,
    sprite: ObjectDrawable,
    particles: ParticleDrawable,
    overlay: Overlay,
    ui: Option<PreparedUi>,
    recorded: Option<(wgpu::SurfaceTexture, wgpu::CommandBuffer)>,
}

impl SandboxRenderer {
    pub fn new(
        window: Arc<Window>,
        config: &SandboxConfig,
        blend: BlendMode,
        shader_dir: Option<&Path>,
    ) -> Result<Self> {
        let context = pollster::block_on(RenderContext::new(window.clone(), config.window.vsync))
            .context("Failed to create render context")?;
        let device = &context.device;
        let queue = &context.queue;

        let shaders = ShaderLibrary::compile_all(device, shader_dir)?;
        let registry = PipelineRegistry::new(device, context.format(), shaders, blend)?;
        let layouts = registry.layouts();

        let assets = &config.assets;
        let texture = |label: &str, data: &TextureData| -> wgpu::BindGroup {
            let gpu = GpuTexture::upload(device, queue, label, data);
            create_texture_bind_group(device, layouts, &gpu, &format!("{label} Bind Group"))
        };

        let uv_checker = TextureData::load_or_white(&assets.resolve(&assets.sphere_texture))?;
        let monster_ball = TextureData::load_or_white(&assets.resolve(&assets.sphere_alt_texture))?;
        let sphere = ObjectDrawable::new(
            device,
            layouts,
            PipelineKey::Opaque,
            "Sphere",
            GpuGeometry::upload(device, "Sphere", &create_sphere_mesh(SPHERE_SUBDIVISION)),
            vec![
                texture("Sphere Texture", &uv_checker),
                texture("Sphere Alt Texture", &monster_ball),
            ],
        );

        let (model_mesh, model_texture) = load_model(&assets.resources_dir, &assets.model_file)?;
        let model_texture = match model_texture {
            Some(path) => TextureData::load_or_white(&path)?,
            None => TextureData::solid([255, 255, 255, 255]),
        };
        let model = ObjectDrawable::new(
            device,
            layouts,
            PipelineKey::Opaque,
            "Model",
            GpuGeometry::upload(device, "Model", &model_mesh),
            vec![texture("Model Texture", &model_texture)],
        );

        let sprite = ObjectDrawable::new(
            device,
            layouts,
            PipelineKey::Sprite,
            "Sprite",
            GpuGeometry::upload(device, "Sprite", &create_sprite_mesh(SPRITE_SIZE.0, SPRITE_SIZE.1)),
            vec![texture("Sprite Texture", &uv_checker)],
        );

        let particle_texture = TextureData::load_or_white(&assets.resolve(&assets.particle_texture))?;
        let particles = ParticleDrawable::new(
            device,
            layouts,
            GpuGeometry::upload(device, "Particle Quad", &create_quad_mesh()),
            texture("Particle Texture", &particle_texture),
            config.particles.max_instances,
        );

        let overlay = Overlay::new(&window, device, context.format());

        Ok(Self {
            context,
            registry,
            sphere,
            model,
            sprite,
            particles,
            overlay,
            ui: None,
            recorded: None,
        })
    }

    pub fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.context.resize(size);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.context.config.width, self.context.config.height)
    }

    pub fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    pub fn pipeline_status(&self) -> PipelineStatus {
        self.registry.status()
    }

    /// UI to paint over the next recorded frame
    pub fn set_ui(&mut self, ui: PreparedUi) {
        self.ui = Some(ui);
    }

    fn drawable(&self, slot: DrawSlot) -> &dyn Drawable {
        match slot {
            DrawSlot::Sphere => &self.sphere,
            DrawSlot::Model => &self.model,
            DrawSlot::Sprite => &self.sprite,
            DrawSlot::Particles => &self.particles,
        }
    }

    fn completion(&self) -> QueueCompletion<'_> {
        QueueCompletion {
            device: &self.context.device,
            queue: &self.context.queue,
        }
    }
}

/// Load the model, or a unit quad when the file does not exist.
/// Returns the mesh and the material's diffuse texture path.
fn load_model(directory: &Path, file: &str) -> Result<(Mesh, Option<PathBuf>)> {
    if !directory.join(file).exists() {
        log::warn!("model {} not found, using a plane", directory.join(file).display());
        return Ok((create_quad_mesh(), None));
    }
    let data = load_obj(directory, file).with_context(|| format!("Failed to load model {file}"))?;
    let mesh = Mesh {
        vertices: data.vertices,
        indices: Vec::new(),
    };
    Ok((mesh, data.texture_path))
}

impl CompletionSource for SandboxRenderer {
    fn enqueue_signal(&self, value: u64, completed: Arc<AtomicU64>) {
        self.completion().enqueue_signal(value, completed);
    }

    fn block(&self) {
        self.completion().block();
    }
}

impl FrameBackend for SandboxRenderer {
    fn apply_pipeline_changes(&mut self, blend: BlendMode, fence: &FrameFence) -> Result<bool, FrameError> {
        self.registry.request_blend_mode(blend);
        Ok(self.registry.apply_pending(&self.context.device, fence)?)
    }

    fn upload(&mut self, scene: &Scene) -> usize {
        let queue = &self.context.queue;
        for (slot, drawable) in [
            (DrawSlot::Sphere, &mut self.sphere),
            (DrawSlot::Model, &mut self.model),
            (DrawSlot::Sprite, &mut self.sprite),
        ] {
            if let Some(frame) = scene.object_frame(slot) {
                drawable
                    .constants
                    .write(queue, frame.transform, frame.material, frame.light, frame.camera);
            }
        }
        self.sphere
            .select_texture(if scene.use_monster_ball { MONSTER_BALL } else { UV_CHECKER });

        let count = {
            let mut slots = self.particles.instances.map_write(queue);
            scene.project_particles(&mut slots)
        };
        self.particles
            .material
            .write(queue, scene.particle_material.to_uniforms());
        self.particles.set_instance_count(count);
        count
    }

    fn record(&mut self, _scene: &Scene) -> Result<bool, FrameError> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.context.reconfigure();
                return Ok(false);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring the back buffer, skipping frame");
                return Ok(false);
            }
            Err(e) => return Err(RenderError::SurfaceError(e.to_string()).into()),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.context.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for slot in DRAW_ORDER {
                record_draw(&mut pass, &self.registry, self.drawable(slot));
            }
        }

        if let Some(ui) = self.ui.take() {
            self.overlay.paint(
                &self.context.device,
                &self.context.queue,
                &mut encoder,
                &view,
                &ui,
            );
        }

        self.recorded = Some((frame, encoder.finish()));
        Ok(true)
    }

    fn submit(&mut self) -> Result<(), FrameError> {
        let Some((frame, commands)) = self.recorded.take() else {
            return Err(RenderError::SurfaceError("submit without a recorded frame".to_string()).into());
        };
        self.context.queue.submit(std::iter::once(commands));
        frame.present();
        Ok(())
    }
}
