//! Kiln Render - wgpu plumbing for the sandbox
//!
//! Device and surface setup, typed GPU buffers, the frame fence, the
//! pipeline registry with its blend table, and the drawables the frame
//! recorder walks.

mod blend;
mod context;
pub mod drawable;
pub mod fence;
pub mod model_loader;
pub mod pipeline;
mod primitives;
pub mod shader;
pub mod texture;
mod uniforms;
pub mod upload;

pub use blend::BlendMode;
pub use context::{RenderContext, RenderError, DEPTH_FORMAT};
pub use drawable::{
    clamp_instance_count, create_texture_bind_group, record_draw, DrawRange, Drawable, GpuGeometry, ObjectConstants,
    ObjectDrawable, ParticleDrawable,
};
pub use fence::{CompletionSource, FenceWait, FrameFence, QueueCompletion};
pub use model_loader::{load_obj, ModelData, ModelError};
pub use pipeline::{BindLayouts, BlendSwap, PipelineConfig, PipelineKey, PipelineRegistry, PipelineStatus};
pub use primitives::{
    create_quad_mesh, create_sphere_mesh, create_sprite_mesh, Mesh, Vertex, SPHERE_SUBDIVISION,
};
pub use shader::{ShaderId, ShaderLibrary};
pub use texture::{GpuTexture, TextureData};
pub use uniforms::{CameraUniforms, DirectionalLightUniforms, MaterialUniforms, TransformationMatrix};
pub use upload::{MappedView, TypedBuffer, UploadSink};
