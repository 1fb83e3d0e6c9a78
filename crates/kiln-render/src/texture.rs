//! Texture loading with full mip chains, and GPU upload

use std::path::Path;
use wgpu::util::DeviceExt;

use crate::context::RenderError;

/// Decoded RGBA8 pixels for every mip level, largest first
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub mips: Vec<Vec<u8>>,
}

/// Number of levels in a full chain down to 1x1
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

impl TextureData {
    /// Build the mip chain for an already decoded image
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let levels = mip_level_count(width, height);
        let mut mips = Vec::with_capacity(levels as usize);
        let mut current = image;
        for _ in 1..levels {
            let (w, h) = current.dimensions();
            let next = image::imageops::resize(
                &current,
                (w / 2).max(1),
                (h / 2).max(1),
                image::imageops::FilterType::Triangle,
            );
            mips.push(current.into_raw());
            current = next;
        }
        mips.push(current.into_raw());
        Self { width, height, mips }
    }

    /// Single-texel texture of one color
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            mips: vec![color.to_vec()],
        }
    }

    /// Decode an image file and generate its mips
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let image = image::open(path).map_err(|e| RenderError::TextureLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let data = Self::from_rgba(image.to_rgba8());
        log::info!(
            "loaded texture {} ({}x{}, {} mips)",
            path.display(),
            data.width,
            data.height,
            data.mip_count()
        );
        Ok(data)
    }

    /// Load `path`, or a white texel when the file does not exist.
    /// A file that exists but cannot be decoded is still an error.
    pub fn load_or_white(path: &Path) -> Result<Self, RenderError> {
        if !path.exists() {
            log::warn!("texture {} not found, using white", path.display());
            return Ok(Self::solid([255, 255, 255, 255]));
        }
        Self::load(path)
    }

    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }
}

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    /// Upload every mip level in one call
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &TextureData,
    ) -> Self {
        let contents: Vec<u8> = data.mips.concat();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: data.mip_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &contents,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(8, 4), 4);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(300, 7), 9);
    }

    #[test]
    fn chain_halves_down_to_one_texel() {
        let image = image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]));
        let data = TextureData::from_rgba(image);
        assert_eq!(data.mip_count(), 4);
        let expected = [8 * 4, 4 * 2, 2, 1];
        for (level, texels) in data.mips.iter().zip(expected) {
            assert_eq!(level.len(), texels * 4);
        }
        // a flat color stays flat at every level
        assert_eq!(&data.mips[3][..], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_falls_back_to_white() {
        let data = TextureData::load_or_white(Path::new("/nonexistent-kiln/tex.png")).unwrap();
        assert_eq!(data, TextureData::solid([255, 255, 255, 255]));
    }

    #[test]
    fn undecodable_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("kiln-bad-{}.png", std::process::id()));
        std::fs::write(&path, b"not a png").unwrap();
        let err = TextureData::load_or_white(&path).unwrap_err();
        assert!(matches!(err, RenderError::TextureLoad { .. }));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn decodes_png_from_disk() {
        let path = std::env::temp_dir().join(format!("kiln-ok-{}.png", std::process::id()));
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        let data = TextureData::load(&path).unwrap();
        assert_eq!((data.width, data.height), (4, 4));
        assert_eq!(data.mip_count(), 3);
        std::fs::remove_file(&path).unwrap();
    }
}
