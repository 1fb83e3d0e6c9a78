//! Kiln Sandbox: interactive rendering sandbox library
//!
//! The scene container, the frame orchestrator and the debug UI, plus the
//! winit application that ties them to a wgpu renderer.

mod app;
pub mod orchestrator;
mod overlay;
mod renderer;
pub mod scene;
pub mod ui;

pub use app::SandboxApp;
pub use orchestrator::{FrameBackend, FrameError, FrameOrchestrator, FrameOutcome, FramePhase, FrameStats, FIXED_DT};
pub use scene::{DirectionalLight, DrawSlot, Material, Scene, SceneObject, DRAW_ORDER};
