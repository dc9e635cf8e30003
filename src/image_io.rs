//! Conversion between [`Texture`]s and image files.
//!
//! Image files store rows top-down while textures keep row 0 at the bottom
//! (`v = 0`), so rows are flipped in both directions.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, GrayImage, RgbaImage};

use crate::graphics::texture::{float_to_unorm, linear_to_srgb};
use crate::graphics::{Texture, TextureFormat};

/// Loads an image file into a texture.
///
/// Color data is tagged sRGB and decoded on sampling. Non-color data stays
/// linear, single-channel images becoming `R8`.
pub fn load_texture(path: impl AsRef<Path>, is_color_data: bool) -> Result<Texture> {
    let path = path.as_ref();
    let image = image::open(path)
        .with_context(|| format!("unable to read image {}", path.display()))?;
    texture_from_image(&image, is_color_data)
        .with_context(|| format!("unable to create texture from {}", path.display()))
}

pub fn texture_from_image(image: &DynamicImage, is_color_data: bool) -> Result<Texture> {
    let image = image.flipv();
    let (width, height) = (image.width(), image.height());
    let texture = if !is_color_data && image.color().channel_count() == 1 {
        let luma = image.to_luma8();
        Texture::with_pixels(TextureFormat::R8, width, height, luma.as_raw().as_slice())?
    } else {
        let format = if is_color_data {
            TextureFormat::Srgb8A8
        } else {
            TextureFormat::Rgba8
        };
        let rgba = image.to_rgba8();
        Texture::with_pixels(format, width, height, rgba.as_raw().as_slice())?
    };
    Ok(texture)
}

/// Converts a texture into an 8-bit image.
///
/// Single-channel textures become grayscale. When `is_color_data` is set the
/// output is sRGB encoded, otherwise linear values are stored directly.
pub fn image_from_texture(texture: &Texture, is_color_data: bool) -> Result<DynamicImage> {
    let (width, height) = texture.size();
    let format = texture.format();
    let encode = |value: f32| {
        if is_color_data {
            linear_to_srgb(value)
        } else {
            float_to_unorm(value)
        }
    };

    let image = match format {
        TextureFormat::R8 | TextureFormat::DepthFloat => {
            let mut data = Vec::with_capacity(width as usize * height as usize);
            for y in (0..height).rev() {
                for x in 0..width {
                    data.push(encode(texture.read_pixel(x, y).x));
                }
            }
            let luma = GrayImage::from_raw(width, height, data)
                .ok_or_else(|| anyhow!("texture data does not match its size"))?;
            DynamicImage::ImageLuma8(luma)
        }
        TextureFormat::Rgba8 | TextureFormat::Srgb8A8 => {
            let stored_srgb = format == TextureFormat::Srgb8A8;
            let row_len = width as usize * 4;
            let bytes = texture.as_bytes();
            let mut data = Vec::with_capacity(row_len * height as usize);
            for y in (0..height).rev() {
                if stored_srgb == is_color_data {
                    let start = y as usize * row_len;
                    data.extend_from_slice(&bytes[start..start + row_len]);
                    continue;
                }
                for x in 0..width {
                    let pixel = texture.read_pixel(x, y);
                    data.extend_from_slice(&[
                        encode(pixel.x),
                        encode(pixel.y),
                        encode(pixel.z),
                        float_to_unorm(pixel.w),
                    ]);
                }
            }
            let rgba = RgbaImage::from_raw(width, height, data)
                .ok_or_else(|| anyhow!("texture data does not match its size"))?;
            DynamicImage::ImageRgba8(rgba)
        }
    };
    Ok(image)
}

/// Saves a texture; the file format follows the path's extension.
pub fn save_texture(texture: &Texture, path: impl AsRef<Path>, is_color_data: bool) -> Result<()> {
    let path = path.as_ref();
    image_from_texture(texture, is_color_data)?
        .save(path)
        .with_context(|| format!("unable to write image {}", path.display()))
}
