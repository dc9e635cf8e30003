//! Software rasterizer with physically based shading and shadow mapping.
//!
//! The `graphics` module holds the pipeline core (textures, framebuffers,
//! the shader contract and the rasterizer). `shaders` provides the standard
//! metallic-roughness shader and the shadow-casting pass. The remaining
//! modules load assets and scenes and drive animated frame sequences.

pub mod animation;
pub mod app;
pub mod error;
pub mod frame;
pub mod graphics;
pub mod image_io;
pub mod math;
pub mod obj;
pub mod renderer;
pub mod scene;
pub mod shaders;

pub use animation::{Animation, Timeline, Track};
pub use error::RenderError;
pub use frame::{Camera, DirectionalLight, FrameParams, MaterialParams};
pub use graphics::{
    AttachmentSlot, CompareFunction, Fragment, FragmentShader, Framebuffer, RasterStats,
    Rasterizer, Texture, TextureFormat, Varying, VertexOutput, VertexShader, Viewport,
};
pub use image_io::{load_texture, save_texture};
pub use obj::{load_mesh, load_obj_from_str, Mesh, MeshVertex};
pub use renderer::{FrameRenderer, Model, RenderSettings, ShadowSettings};
pub use scene::SceneConfig;
