use std::sync::OnceLock;

use bytemuck::Pod;
use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Closed set of pixel layouts a [`Texture`] can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// Single 8-bit linear channel.
    R8,
    /// Four 8-bit linear channels.
    Rgba8,
    /// Four 8-bit channels, color channels sRGB encoded, alpha linear.
    Srgb8A8,
    /// One 32-bit float per pixel, used by depth attachments and shadow maps.
    DepthFloat,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgba8 | TextureFormat::Srgb8A8 | TextureFormat::DepthFloat => 4,
        }
    }

    pub fn is_depth(self) -> bool {
        self == TextureFormat::DepthFloat
    }
}

/// Comparison applied by depth testing and shadow-map lookups.
///
/// `passes(value, reference)` reads as "value <op> reference".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    Never,
    #[default]
    Less,
    LessEqual,
    Equal,
    Greater,
    GreaterEqual,
    Always,
}

impl CompareFunction {
    pub fn passes(self, value: f32, reference: f32) -> bool {
        match self {
            CompareFunction::Never => false,
            CompareFunction::Less => value < reference,
            CompareFunction::LessEqual => value <= reference,
            CompareFunction::Equal => value == reference,
            CompareFunction::Greater => value > reference,
            CompareFunction::GreaterEqual => value >= reference,
            CompareFunction::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Texels {
    Unorm8(Vec<u8>),
    Depth(Vec<f32>),
}

/// Typed 2D pixel store.
///
/// Row 0 is the bottom of the image so that texture coordinate `v = 0`
/// addresses the first row. Storage is released when the texture is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    format: TextureFormat,
    width: u32,
    height: u32,
    texels: Texels,
}

impl Texture {
    /// Allocates a zero-initialized texture.
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let allocation_error = RenderError::Allocation {
            format,
            width,
            height,
        };
        let pixel_count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| allocation_error.clone())?;
        let texels = match format {
            TextureFormat::DepthFloat => {
                Texels::Depth(allocate(pixel_count, 0.0).ok_or(allocation_error)?)
            }
            _ => {
                let len = pixel_count
                    .checked_mul(format.bytes_per_pixel())
                    .ok_or_else(|| allocation_error.clone())?;
                Texels::Unorm8(allocate(len, 0).ok_or(allocation_error)?)
            }
        };
        Ok(Self {
            format,
            width,
            height,
            texels,
        })
    }

    /// Allocates a texture and initializes it from a flat pixel array.
    pub fn with_pixels<T: Pod>(
        format: TextureFormat,
        width: u32,
        height: u32,
        pixels: &[T],
    ) -> Result<Self, RenderError> {
        let mut texture = Self::new(format, width, height)?;
        texture.set_pixels(pixels)?;
        Ok(texture)
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size in bytes of the backing store.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Replaces every pixel with the raw contents of `pixels`.
    ///
    /// Depth textures take native-endian `f32` values; the byte length must
    /// match [`Texture::byte_len`].
    pub fn set_pixels<T: Pod>(&mut self, pixels: &[T]) -> Result<(), RenderError> {
        let bytes: &[u8] = bytemuck::cast_slice(pixels);
        let expected = self.byte_len();
        if bytes.len() != expected {
            return Err(RenderError::PixelBufferSize {
                expected,
                actual: bytes.len(),
            });
        }
        match &mut self.texels {
            Texels::Unorm8(data) => data.copy_from_slice(bytes),
            Texels::Depth(data) => {
                for (value, chunk) in data.iter_mut().zip(bytes.chunks_exact(4)) {
                    *value = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
            }
        }
        Ok(())
    }

    /// Raw view of the backing store.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.texels {
            Texels::Unorm8(data) => data,
            Texels::Depth(data) => bytemuck::cast_slice(data),
        }
    }

    /// Reads a pixel and decodes it to linear RGBA.
    ///
    /// Single-channel formats report their value in `x` with `w = 1`.
    ///
    /// # Panics
    ///
    /// Panics when `(x, y)` lies outside the texture. The same holds for
    /// [`Texture::write_pixel`], [`Texture::read_depth`] and
    /// [`Texture::write_depth`].
    pub fn read_pixel(&self, x: u32, y: u32) -> Vec4 {
        let index = self.pixel_index(x, y);
        match &self.texels {
            Texels::Depth(data) => Vec4::new(data[index], 0.0, 0.0, 1.0),
            Texels::Unorm8(data) => match self.format {
                TextureFormat::R8 => Vec4::new(unorm_to_float(data[index]), 0.0, 0.0, 1.0),
                TextureFormat::Srgb8A8 => {
                    let texel = &data[index * 4..index * 4 + 4];
                    Vec4::new(
                        srgb_to_linear(texel[0]),
                        srgb_to_linear(texel[1]),
                        srgb_to_linear(texel[2]),
                        unorm_to_float(texel[3]),
                    )
                }
                _ => {
                    let texel = &data[index * 4..index * 4 + 4];
                    Vec4::new(
                        unorm_to_float(texel[0]),
                        unorm_to_float(texel[1]),
                        unorm_to_float(texel[2]),
                        unorm_to_float(texel[3]),
                    )
                }
            },
        }
    }

    /// Encodes a linear RGBA value into the pixel at `(x, y)`.
    pub fn write_pixel(&mut self, x: u32, y: u32, color: Vec4) {
        let index = self.pixel_index(x, y);
        let format = self.format;
        match &mut self.texels {
            Texels::Depth(data) => data[index] = color.x,
            Texels::Unorm8(data) => {
                let bpp = format.bytes_per_pixel();
                let encoded = encode_texel(format, color);
                data[index * bpp..index * bpp + bpp].copy_from_slice(&encoded[..bpp]);
            }
        }
    }

    pub fn read_depth(&self, x: u32, y: u32) -> f32 {
        match &self.texels {
            Texels::Depth(data) => data[self.pixel_index(x, y)],
            Texels::Unorm8(_) => self.read_pixel(x, y).x,
        }
    }

    pub fn write_depth(&mut self, x: u32, y: u32, depth: f32) {
        let index = self.pixel_index(x, y);
        match &mut self.texels {
            Texels::Depth(data) => data[index] = depth,
            Texels::Unorm8(_) => self.write_pixel(x, y, Vec4::new(depth, 0.0, 0.0, 1.0)),
        }
    }

    /// Writes `value` into every pixel. Depth textures store `value.x`.
    pub fn fill(&mut self, value: Vec4) {
        let format = self.format;
        match &mut self.texels {
            Texels::Depth(data) => data.fill(value.x),
            Texels::Unorm8(data) => {
                let bpp = format.bytes_per_pixel();
                let encoded = encode_texel(format, value);
                for texel in data.chunks_exact_mut(bpp) {
                    texel.copy_from_slice(&encoded[..bpp]);
                }
            }
        }
    }

    /// Samples the texture at `uv`.
    ///
    /// Color formats are bilinearly filtered with repeat wrapping; depth
    /// textures are point sampled with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.format.is_depth() {
            let (x, y) = self.clamped_texel(uv);
            return self.read_pixel(x, y);
        }

        let u = uv.x * self.width as f32 - 0.5;
        let v = uv.y * self.height as f32 - 0.5;
        let x0 = u.floor();
        let y0 = v.floor();
        let fx = u - x0;
        let fy = v - y0;
        let x0 = x0 as i64;
        let y0 = y0 as i64;
        // Huge or non-finite coordinates saturate the casts above.
        let (left, right) = (wrap(x0, self.width), wrap(x0.wrapping_add(1), self.width));
        let (bottom, top) = (wrap(y0, self.height), wrap(y0.wrapping_add(1), self.height));

        let lower = self
            .read_pixel(left, bottom)
            .lerp(self.read_pixel(right, bottom), fx);
        let upper = self.read_pixel(left, top).lerp(self.read_pixel(right, top), fx);
        lower.lerp(upper, fy)
    }

    /// Compares `reference` against the stored depth nearest to `uv`.
    ///
    /// Returns 1.0 when `compare.passes(reference, stored)` holds, else 0.0.
    pub fn sample_compare(&self, uv: Vec2, reference: f32, compare: CompareFunction) -> f32 {
        let (x, y) = self.clamped_texel(uv);
        if compare.passes(reference, self.read_depth(x, y)) {
            1.0
        } else {
            0.0
        }
    }

    fn clamped_texel(&self, uv: Vec2) -> (u32, u32) {
        let x = ((uv.x * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1);
        let y = ((uv.y * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1);
        (x as u32, y as u32)
    }

    fn pixel_index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) is outside a {}x{} texture",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

fn allocate<T: Clone>(len: usize, value: T) -> Option<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.resize(len, value);
    Some(buffer)
}

fn wrap(index: i64, size: u32) -> u32 {
    index.rem_euclid(size as i64) as u32
}

fn encode_texel(format: TextureFormat, color: Vec4) -> [u8; 4] {
    match format {
        TextureFormat::Srgb8A8 => [
            linear_to_srgb(color.x),
            linear_to_srgb(color.y),
            linear_to_srgb(color.z),
            float_to_unorm(color.w),
        ],
        _ => [
            float_to_unorm(color.x),
            float_to_unorm(color.y),
            float_to_unorm(color.z),
            float_to_unorm(color.w),
        ],
    }
}

pub fn unorm_to_float(value: u8) -> f32 {
    value as f32 / 255.0
}

pub fn float_to_unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Decodes an sRGB-encoded byte to a linear value in `[0, 1]`.
pub fn srgb_to_linear(value: u8) -> f32 {
    static TABLE: OnceLock<[f32; 256]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut table = [0.0; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let c = i as f32 / 255.0;
            *entry = if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            };
        }
        table
    });
    table[value as usize]
}

/// Encodes a linear value to an sRGB byte, clamping to `[0, 1]` first.
pub fn linear_to_srgb(value: f32) -> u8 {
    let c = value.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    float_to_unorm(encoded)
}
