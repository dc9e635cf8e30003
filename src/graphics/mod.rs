pub mod framebuffer;
pub mod rasterizer;
pub mod shader;
pub mod texture;

pub use framebuffer::{AttachmentSlot, Framebuffer};
pub use rasterizer::{RasterStats, Rasterizer, Viewport};
pub use shader::{Fragment, FragmentShader, Varying, VertexOutput, VertexShader};
pub use texture::{CompareFunction, Texture, TextureFormat};
