use bevy::image::Image;
use bevy::render::render_resource::TextureFormat;
use glam::Vec2;
use parrot::Perlin;
use thiserror::Error;

use crate::types::PerlinSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeightmapError {
    #[error("heightmap is {width}x{height} but {len} values were supplied")]
    Dimensions { width: u32, height: u32, len: usize },
    #[error("unsupported heightmap texture format {0}")]
    UnsupportedFormat(String),
    #[error("heightmap image has no CPU-side pixel data")]
    MissingData,
}

/// Single-channel height field with values in `[0, 1]`.
///
/// Row 0 is the bottom of the source image, so `v = 0` samples the bottom edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Heightmap {
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Result<Self, HeightmapError> {
        if width == 0 || height == 0 || values.len() != (width as usize) * (height as usize) {
            return Err(HeightmapError::Dimensions {
                width,
                height,
                len: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn flat() -> Self {
        Self {
            width: 1,
            height: 1,
            values: vec![0.0],
        }
    }

    /// Reads the red channel of top-down RGBA8 rows.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, HeightmapError> {
        Self::from_texels(width, height, bytes, TexelLayout::new(4, Channel::U8))
    }

    /// Converts a decoded image, reading the first channel of each texel.
    ///
    /// Covers the formats bevy's image loader produces for 8- and 16-bit greyscale and
    /// colour files, plus 32-bit float maps.
    pub fn from_image(image: &Image) -> Result<Self, HeightmapError> {
        let format = image.texture_descriptor.format;
        let layout = TexelLayout::for_format(format)
            .ok_or_else(|| HeightmapError::UnsupportedFormat(format!("{format:?}")))?;
        let bytes = image.data.as_deref().ok_or(HeightmapError::MissingData)?;
        Self::from_texels(image.width(), image.height(), bytes, layout)
    }

    fn from_texels(
        width: u32,
        height: u32,
        bytes: &[u8],
        layout: TexelLayout,
    ) -> Result<Self, HeightmapError> {
        let w = width as usize;
        let h = height as usize;
        let row_bytes = w * layout.stride;
        if width == 0 || height == 0 || bytes.len() != row_bytes * h {
            return Err(HeightmapError::Dimensions {
                width,
                height,
                len: bytes.len() / layout.stride,
            });
        }

        let mut values = Vec::with_capacity(w * h);
        for row in (0..h).rev() {
            let start = row * row_bytes;
            values.extend(
                bytes[start..start + row_bytes]
                    .chunks_exact(layout.stride)
                    .map(|texel| layout.channel.read(texel)),
            );
        }

        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn perlin(settings: &PerlinSettings) -> Self {
        let perlin = Perlin::new(settings.seed);
        let size = settings.resolution.max(1);
        let side = size as usize;

        let mut values = Vec::with_capacity(side * side);
        for y in 0..size {
            for x in 0..size {
                let n = fractal_noise(&perlin, settings, x as f64, y as f64);
                values.push(((n * 0.5 + 0.5) as f32).clamp(0.0, 1.0));
            }
        }

        Self {
            width: size,
            height: size,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        self.values[y * self.width as usize + x]
    }

    /// Bilinear lookup with texel centres at `(i + 0.5) / size` and clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> f32 {
        let fx = (uv.x * self.width as f32 - 0.5).clamp(0.0, (self.width - 1) as f32);
        let fy = (uv.y * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let h00 = self.get(x0, y0);
        let h10 = self.get(x0 + 1, y0);
        let h01 = self.get(x0, y0 + 1);
        let h11 = self.get(x0 + 1, y0 + 1);

        let bottom = h00 + (h10 - h00) * tx;
        let top = h01 + (h11 - h01) * tx;
        bottom + (top - bottom) * ty
    }
}

#[derive(Clone, Copy, Debug)]
enum Channel {
    U8,
    U16,
    F32,
}

impl Channel {
    /// First channel of a little-endian texel, normalized to `[0, 1]`.
    fn read(self, texel: &[u8]) -> f32 {
        match self {
            Channel::U8 => texel[0] as f32 / 255.0,
            Channel::U16 => u16::from_le_bytes([texel[0], texel[1]]) as f32 / 65535.0,
            Channel::F32 => {
                let v = f32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
                if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct TexelLayout {
    stride: usize,
    channel: Channel,
}

impl TexelLayout {
    fn new(stride: usize, channel: Channel) -> Self {
        Self { stride, channel }
    }

    fn for_format(format: TextureFormat) -> Option<Self> {
        let layout = match format {
            TextureFormat::R8Unorm => Self::new(1, Channel::U8),
            TextureFormat::Rg8Unorm => Self::new(2, Channel::U8),
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => Self::new(4, Channel::U8),
            TextureFormat::R16Uint | TextureFormat::R16Unorm => Self::new(2, Channel::U16),
            TextureFormat::Rg16Uint | TextureFormat::Rg16Unorm => Self::new(4, Channel::U16),
            TextureFormat::Rgba16Uint | TextureFormat::Rgba16Unorm => Self::new(8, Channel::U16),
            TextureFormat::R32Float => Self::new(4, Channel::F32),
            TextureFormat::Rgba32Float => Self::new(16, Channel::F32),
            _ => return None,
        };
        Some(layout)
    }
}

fn fractal_noise(perlin: &Perlin, settings: &PerlinSettings, x: f64, y: f64) -> f64 {
    let mut amplitude = 1.0f64;
    let mut frequency = settings.base_frequency;
    let mut sum = 0.0f64;
    let mut norm = 0.0f64;

    for _ in 0..settings.octaves {
        sum += perlin.noise2d(x * frequency, y * frequency) * amplitude;
        norm += amplitude;
        amplitude *= settings.persistence;
        frequency *= 2.0;
    }

    if norm > 0.0 { sum / norm } else { 0.0 }
}
