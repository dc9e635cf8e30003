use thiserror::Error;

use crate::graphics::{AttachmentSlot, TextureFormat};

/// Failures raised by the texture, framebuffer and rasterizer layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot allocate {width}x{height} {format:?} texture")]
    Allocation {
        format: TextureFormat,
        width: u32,
        height: u32,
    },
    #[error("texture dimensions must be non-zero (got {width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} bytes but the texture needs {expected}")]
    PixelBufferSize { expected: usize, actual: usize },
    #[error("{format:?} textures cannot be bound to the {slot:?} attachment")]
    AttachmentFormat {
        slot: AttachmentSlot,
        format: TextureFormat,
    },
    #[error(
        "attachment size {actual_width}x{actual_height} does not match framebuffer size {expected_width}x{expected_height}"
    )]
    AttachmentSize {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}
