//! Kiln Sandbox - real-time rendering playground
//!
//! Usage:
//!   kiln-sandbox [--config <file.toml>] [--resources <dir>] [--seed <n>]
//!                [--blend <mode>] [--billboard] [--shaders <dir>]

use anyhow::{Context, Result};
use clap::Parser;
use kiln_core::crash::install_crash_hook;
use kiln_core::logging::{init_logging, LoggingConfig};
use kiln_core::SandboxConfig;
use kiln_render::BlendMode;
use kiln_sandbox::{SandboxApp, Scene};
use std::path::PathBuf;
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Parser)]
#[command(name = "kiln-sandbox")]
#[command(about = "Kiln rendering sandbox - sphere, model, sprite and instanced particles")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding textures, models and sounds
    #[arg(long)]
    resources: Option<PathBuf>,

    /// Seed for particle randomness
    #[arg(long)]
    seed: Option<u32>,

    /// Initial blend mode (none, normal, add, subtract, multiply, screen)
    #[arg(long)]
    blend: Option<BlendMode>,

    /// Start with particle billboarding on
    #[arg(long)]
    billboard: bool,

    /// Load WGSL sources from this directory instead of the built-in ones
    #[arg(long)]
    shaders: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SandboxConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SandboxConfig::default(),
    };
    if let Some(resources) = args.resources {
        config.assets.resources_dir = resources;
    }
    if args.seed.is_some() {
        config.particles.seed = args.seed;
    }

    init_logging(LoggingConfig::from(&config.logging));
    install_crash_hook(config.crash.dump_dir.clone());

    let mut scene = Scene::from_config(&config);
    if let Some(blend) = args.blend {
        scene.blend_mode = blend;
    }
    scene.use_billboard = args.billboard;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SandboxApp::new(config, scene, args.shaders);
    event_loop.run_app(&mut app)?;

    if let Some(error) = app.take_error() {
        return Err(error);
    }
    log::info!("shutting down");
    Ok(())
}
