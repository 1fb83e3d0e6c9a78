//! Kiln Audio - one-shot sound playback
//!
//! Wraps Kira's AudioManager. When no output device exists the engine runs
//! silent and every play call becomes a no-op.

use kiln_core::{KilnError, Result};
use kira::sound::static_sound::StaticSoundData;
use kira::{AudioManager, AudioManagerSettings, DefaultBackend};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct AudioEngine {
    manager: Option<AudioManager<DefaultBackend>>,
    sound_cache: HashMap<PathBuf, StaticSoundData>,
    volume: f64,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    pub fn new() -> Self {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| log::warn!("Audio: no device available ({e}), running silent"))
            .ok();
        Self {
            manager,
            sound_cache: HashMap::new(),
            volume: 1.0,
        }
    }

    /// An engine that never opens a device
    pub fn silent() -> Self {
        Self {
            manager: None,
            sound_cache: HashMap::new(),
            volume: 1.0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.manager.is_some()
    }

    /// Linear amplitude, clamped to 0.0..=2.0
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 2.0);
    }

    /// Decode a file into the cache. Decoding happens even when running
    /// silent so a bad asset is reported either way.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        if self.sound_cache.contains_key(path) {
            return Ok(());
        }
        let data = StaticSoundData::from_file(path)
            .map_err(|e| KilnError::AudioError(format!("Failed to load '{}': {}", path.display(), e)))?;
        log::debug!("Loaded sound {}", path.display());
        self.sound_cache.insert(path.to_path_buf(), data);
        Ok(())
    }

    /// Load if needed, then start playback and return immediately.
    /// The sound keeps playing for as long as the engine lives.
    pub fn play_once(&mut self, path: &Path) -> Result<()> {
        self.load(path)?;
        let Some(manager) = &mut self.manager else {
            return Ok(());
        };
        let data = match self.sound_cache.get(path) {
            Some(data) => data.clone(),
            None => return Err(KilnError::AudioError(format!("Sound not cached: {}", path.display()))),
        };
        manager
            .play(data.volume(amplitude_to_db(self.volume)))
            .map_err(|e| KilnError::AudioError(format!("Failed to play '{}': {}", path.display(), e)))?;
        Ok(())
    }
}

/// Convert linear amplitude (0.0–2.0) to decibels
fn amplitude_to_db(amplitude: f64) -> kira::Decibels {
    if amplitude <= 0.0 {
        kira::Decibels(-60.0)
    } else {
        kira::Decibels((20.0 * (amplitude as f32).log10()).max(-60.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_amplitude_is_zero_db() {
        assert!(amplitude_to_db(1.0).0.abs() < 1e-6);
    }

    #[test]
    fn silence_floors_at_minus_sixty() {
        assert_eq!(amplitude_to_db(0.0).0, -60.0);
        assert_eq!(amplitude_to_db(-1.0).0, -60.0);
        assert_eq!(amplitude_to_db(1e-9).0, -60.0);
    }

    #[test]
    fn doubling_is_about_six_db() {
        assert!((amplitude_to_db(2.0).0 - 6.0206).abs() < 1e-3);
    }

    #[test]
    fn silent_engine_reports_unavailable() {
        let engine = AudioEngine::silent();
        assert!(!engine.is_available());
    }

    #[test]
    fn volume_is_clamped() {
        let mut engine = AudioEngine::silent();
        engine.set_volume(5.0);
        assert_eq!(engine.volume, 2.0);
        engine.set_volume(-1.0);
        assert_eq!(engine.volume, 0.0);
    }

    #[test]
    fn missing_file_is_an_audio_error() {
        let mut engine = AudioEngine::silent();
        let path = Path::new("definitely/not/here/fanfare.wav");
        let err = engine.play_once(path).unwrap_err();
        assert!(matches!(err, KilnError::AudioError(_)));
        assert!(!engine.sound_cache.contains_key(path));
    }
}
