//! WGSL shader sources and compilation
//!
//! Every shader exposes `vs_main` and `fs_main`. Sources are embedded in the
//! binary; a directory can be given to load edited copies instead.

use std::borrow::Cow;
use std::path::Path;

use crate::context::RenderError;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    Object3d,
    Particle,
}

impl ShaderId {
    pub const ALL: [ShaderId; 2] = [Self::Object3d, Self::Particle];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Object3d => "object3d.wgsl",
            Self::Particle => "particle.wgsl",
        }
    }

    pub fn embedded_source(self) -> &'static str {
        match self {
            Self::Object3d => include_str!("shaders/object3d.wgsl"),
            Self::Particle => include_str!("shaders/particle.wgsl"),
        }
    }

    /// Source text: `override_dir/<file>` when that file exists, else the embedded copy.
    pub fn source(self, override_dir: Option<&Path>) -> Result<Cow<'static, str>, RenderError> {
        if let Some(dir) = override_dir {
            let path = dir.join(self.file_name());
            if path.exists() {
                log::info!("shader {} from {}", self.file_name(), path.display());
                return Ok(Cow::Owned(std::fs::read_to_string(&path)?));
            }
        }
        Ok(Cow::Borrowed(self.embedded_source()))
    }
}

/// Compiled shader modules for every pipeline
pub struct ShaderLibrary {
    object3d: wgpu::ShaderModule,
    particle: wgpu::ShaderModule,
}

impl ShaderLibrary {
    pub fn compile_all(device: &wgpu::Device, override_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Self {
            object3d: compile(device, ShaderId::Object3d, override_dir)?,
            particle: compile(device, ShaderId::Particle, override_dir)?,
        })
    }

    pub fn module(&self, id: ShaderId) -> &wgpu::ShaderModule {
        match id {
            ShaderId::Object3d => &self.object3d,
            ShaderId::Particle => &self.particle,
        }
    }
}

/// Compile one shader. Validation failures come back as an error instead of
/// reaching the device's uncaptured-error handler.
pub fn compile(
    device: &wgpu::Device,
    id: ShaderId,
    override_dir: Option<&Path>,
) -> Result<wgpu::ShaderModule, RenderError> {
    let name = id.file_name();
    log::info!("compiling shader {name} (entries {VERTEX_ENTRY}, {FRAGMENT_ENTRY})");
    let source = id.source(override_dir)?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source),
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        log::error!("shader {name} failed to compile:\n{error}");
        return Err(RenderError::ShaderCompile {
            name: name.to_string(),
            message: error.to_string(),
        });
    }

    log::info!("compiled shader {name}");
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sources_are_used_without_override() {
        for id in ShaderId::ALL {
            let source = id.source(None).unwrap();
            assert!(matches!(source, Cow::Borrowed(_)));
            assert!(source.contains(VERTEX_ENTRY));
            assert!(source.contains(FRAGMENT_ENTRY));
        }
    }

    #[test]
    fn override_directory_wins_when_file_exists() {
        let dir = std::env::temp_dir().join(format!("kiln-shader-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("particle.wgsl"), "// edited").unwrap();

        let particle = ShaderId::Particle.source(Some(&dir)).unwrap();
        assert_eq!(particle, "// edited");
        // object3d.wgsl is absent from the directory
        let object = ShaderId::Object3d.source(Some(&dir)).unwrap();
        assert!(matches!(object, Cow::Borrowed(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
