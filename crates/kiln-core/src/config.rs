//! Sandbox configuration
//!
//! Settings come from an optional TOML file; every key has a default so an
//! empty file (or no file at all) yields a runnable sandbox. The binary
//! applies its command-line overrides on top of the loaded value.

use crate::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Window and presentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Kiln".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Asset file names, resolved against `resources_dir`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub resources_dir: PathBuf,
    pub sphere_texture: String,
    pub sphere_alt_texture: String,
    pub particle_texture: String,
    pub model_file: String,
    pub startup_sound: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("resources"),
            sphere_texture: "uvChecker.png".to_string(),
            sphere_alt_texture: "monsterBall.png".to_string(),
            particle_texture: "circle.png".to_string(),
            model_file: "plane.obj".to_string(),
            startup_sound: Some("fanfare.wav".to_string()),
        }
    }
}

impl AssetConfig {
    pub fn resolve(&self, file: &str) -> PathBuf {
        self.resources_dir.join(file)
    }
}

/// Particle simulation and instancing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Slots in the instancing buffer; particles past this are simulated but not drawn.
    pub max_instances: usize,
    pub emit_count: u32,
    /// Seconds between timed emissions.
    pub emit_interval: f32,
    pub initial_burst: u32,
    pub seed: Option<u32>,
    /// Live count above which a warning is logged. The simulation is never capped.
    pub growth_warning: usize,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_instances: 100,
            emit_count: 3,
            emit_interval: 0.5,
            initial_burst: 3,
            seed: None,
            growth_warning: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    /// Linear amplitude for the startup sound, 0.0..=2.0
    pub volume: f64,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// `env_logger` filter string; `RUST_LOG` wins when this is unset.
    pub filter: Option<String>,
    pub directory: PathBuf,
    pub color: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: None,
            directory: PathBuf::from("logs"),
            color: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashConfig {
    pub dump_dir: PathBuf,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::from("Dumps"),
        }
    }
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub particles: ParticleConfig,
    pub audio: AudioSection,
    pub logging: LogSection,
    pub crash: CrashConfig,
}

impl SandboxConfig {
    /// Load and validate a config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SandboxConfig = toml::from_str(&content).map_err(|e| {
            KilnError::TomlParseError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SandboxConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(KilnError::config("window", "width and height must be non-zero"));
        }
        if self.particles.max_instances == 0 {
            return Err(KilnError::config("particles.max_instances", "must be at least 1"));
        }
        if self.particles.emit_interval.is_nan() || self.particles.emit_interval <= 0.0 {
            return Err(KilnError::config("particles.emit_interval", "must be positive"));
        }
        if !(0.0..=2.0).contains(&self.audio.volume) {
            return Err(KilnError::config("audio.volume", "must be within 0.0..=2.0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SandboxConfig::from_toml_str("").unwrap();
        assert_eq!(config, SandboxConfig::default());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.particles.max_instances, 100);
        assert_eq!(config.particles.emit_count, 3);
        assert_eq!(config.particles.emit_interval, 0.5);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = SandboxConfig::from_toml_str(
            r#"
            [particles]
            emit_interval = 0.25
            seed = 7

            [assets]
            resources_dir = "data"
            "#,
        )
        .unwrap();
        assert_eq!(config.particles.emit_interval, 0.25);
        assert_eq!(config.particles.seed, Some(7));
        assert_eq!(config.particles.emit_count, 3);
        assert_eq!(config.assets.resolve("circle.png"), PathBuf::from("data/circle.png"));
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn rejects_zero_interval() {
        let err = SandboxConfig::from_toml_str("[particles]\nemit_interval = 0.0\n").unwrap_err();
        assert!(matches!(err, KilnError::Config { .. }));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = SandboxConfig::from_toml_str("[particles]\nmax_instances = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_instances"));
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let err = SandboxConfig::from_toml_str("[audio]\nvolume = 3.5\n").unwrap_err();
        assert!(err.to_string().contains("audio.volume"));
        assert!(SandboxConfig::from_toml_str("[audio]\nvolume = nan\n").is_err());
        let quiet = SandboxConfig::from_toml_str("[audio]\nvolume = 0.25\n").unwrap();
        assert_eq!(quiet.audio.volume, 0.25);
    }

    #[test]
    fn rejects_bad_toml() {
        let err = SandboxConfig::from_toml_str("[window\nwidth = 3").unwrap_err();
        assert!(matches!(err, KilnError::TomlParseError(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = SandboxConfig::default();
        config.particles.seed = Some(99);
        let text = config.to_toml_string().unwrap();
        assert_eq!(SandboxConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let config = SandboxConfig::from_toml_str(include_str!("../../../kiln.toml")).unwrap();
        assert_eq!(config, SandboxConfig::default());
    }
}
