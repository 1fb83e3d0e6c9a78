//! Sandbox application implementing winit ApplicationHandler
//!
//! Pumps window events, runs the debug UI and drives one orchestrated
//! frame per redraw.

use kiln_audio::AudioEngine;
use kiln_core::SandboxConfig;
use std::path::PathBuf;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::orchestrator::FrameOrchestrator;
use crate::renderer::SandboxRenderer;
use crate::scene::Scene;
use crate::ui;

pub struct SandboxApp {
    config: SandboxConfig,
    shader_dir: Option<PathBuf>,
    scene: Scene,
    orchestrator: FrameOrchestrator,
    audio: AudioEngine,

    window: Option<Arc<Window>>,
    renderer: Option<SandboxRenderer>,

    /// First fatal error; the event loop exits once it is set
    error: Option<anyhow::Error>,
}

impl SandboxApp {
    pub fn new(config: SandboxConfig, scene: Scene, shader_dir: Option<PathBuf>) -> Self {
        Self {
            config,
            shader_dir,
            scene,
            orchestrator: FrameOrchestrator::new(),
            audio: AudioEngine::silent(),
            window: None,
            renderer: None,
            error: None,
        }
    }

    /// The error that stopped the loop, if any
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let renderer = SandboxRenderer::new(
            window.clone(),
            &self.config,
            self.scene.blend_mode,
            self.shader_dir.as_deref(),
        )?;
        let (width, height) = renderer.surface_size();
        self.scene.set_viewport(width, height);

        self.window = Some(window);
        self.renderer = Some(renderer);

        self.audio = AudioEngine::new();
        self.audio.set_volume(self.config.audio.volume);
        if let Some(sound) = &self.config.assets.startup_sound {
            let path = self.config.assets.resolve(sound);
            match self.audio.play_once(&path) {
                Ok(()) if self.audio.is_available() => log::info!("playing {}", path.display()),
                Ok(()) => log::info!("no audio output, {} decoded but not played", path.display()),
                Err(e) => log::warn!("{e}"),
            }
        }
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer) else {
            return;
        };

        let (width, height) = renderer.surface_size();
        let stats = *self.orchestrator.stats();
        let pipelines = renderer.pipeline_status();
        let scene = &mut self.scene;
        let mut actions = Vec::new();
        let prepared = renderer
            .overlay_mut()
            .run(window, [width, height], |ctx| {
                actions = ui::draw(ctx, scene, &stats, &pipelines);
            });
        renderer.set_ui(prepared);
        ui::apply_actions(&mut self.scene, &actions);

        if let Err(e) = self.orchestrator.run_frame(&mut self.scene, renderer) {
            self.fail(event_loop, e.into());
        }
    }
}

impl ApplicationHandler for SandboxApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer) {
            if renderer.overlay_mut().on_window_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size);
                    self.scene.set_viewport(new_size.width, new_size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
