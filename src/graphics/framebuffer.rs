use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::graphics::texture::{Texture, TextureFormat};

/// Named binding points of a [`Framebuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentSlot {
    Color,
    Depth,
}

/// Binding of render-target textures used as the rasterizer's write target.
///
/// The framebuffer borrows its attachments; the borrow guarantees every
/// attachment outlives the draws that write through it.
#[derive(Debug, Default)]
pub struct Framebuffer<'a> {
    color: Option<&'a mut Texture>,
    depth: Option<&'a mut Texture>,
}

impl<'a> Framebuffer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `texture` to `slot`, returning the texture previously bound there.
    pub fn attach(
        &mut self,
        slot: AttachmentSlot,
        texture: &'a mut Texture,
    ) -> Result<Option<&'a mut Texture>, RenderError> {
        let format = texture.format();
        let format_ok = match slot {
            AttachmentSlot::Color => !format.is_depth(),
            AttachmentSlot::Depth => format == TextureFormat::DepthFloat,
        };
        if !format_ok {
            return Err(RenderError::AttachmentFormat { slot, format });
        }

        let other = match slot {
            AttachmentSlot::Color => self.depth.as_deref(),
            AttachmentSlot::Depth => self.color.as_deref(),
        };
        if let Some(other) = other {
            if other.size() != texture.size() {
                return Err(RenderError::AttachmentSize {
                    expected_width: other.width(),
                    expected_height: other.height(),
                    actual_width: texture.width(),
                    actual_height: texture.height(),
                });
            }
        }

        Ok(self.slot_mut(slot).replace(texture))
    }

    pub fn detach(&mut self, slot: AttachmentSlot) -> Option<&'a mut Texture> {
        self.slot_mut(slot).take()
    }

    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&Texture> {
        match slot {
            AttachmentSlot::Color => self.color.as_deref(),
            AttachmentSlot::Depth => self.depth.as_deref(),
        }
    }

    /// Dimensions shared by the bound attachments, if any are bound.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.color
            .as_deref()
            .or(self.depth.as_deref())
            .map(Texture::size)
    }

    /// Clears every bound attachment.
    pub fn clear(&mut self, color: Vec4, depth: f32) {
        self.clear_color(color);
        self.clear_depth(depth);
    }

    pub fn clear_color(&mut self, color: Vec4) {
        if let Some(texture) = self.color.as_deref_mut() {
            texture.fill(color);
        }
    }

    pub fn clear_depth(&mut self, depth: f32) {
        if let Some(texture) = self.depth.as_deref_mut() {
            texture.fill(Vec4::new(depth, 0.0, 0.0, 1.0));
        }
    }

    pub(crate) fn targets_mut(&mut self) -> (Option<&mut Texture>, Option<&mut Texture>) {
        (self.color.as_deref_mut(), self.depth.as_deref_mut())
    }

    fn slot_mut(&mut self, slot: AttachmentSlot) -> &mut Option<&'a mut Texture> {
        match slot {
            AttachmentSlot::Color => &mut self.color,
            AttachmentSlot::Depth => &mut self.depth,
        }
    }
}
