//! Two-pass frame rendering: an optional shadow-map pass from the light,
//! then the camera pass with the standard shader.

use glam::{Mat3, Mat4, Vec4};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::frame::FrameParams;
use crate::graphics::{AttachmentSlot, Framebuffer, Rasterizer, Texture, TextureFormat, Viewport};
use crate::math::scale_bias;
use crate::obj::Mesh;
use crate::shaders::{
    MaterialInput, ShadowCastingFragmentShader, ShadowCastingUniform, ShadowCastingVertexShader,
    StandardAttribute, StandardFragmentShader, StandardMaterial, StandardUniform,
    StandardVertexShader,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub enabled: bool,
    /// Width and height of the shadow map in texels.
    pub size: u32,
    /// Half-size of the light's orthographic volume.
    pub extent: f32,
    /// Distance from the camera target to the light's eye point.
    pub distance: f32,
    pub bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 1024,
            extent: 1.0,
            distance: 2.0,
            bias: 0.005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub shadow: ShadowSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            shadow: ShadowSettings::default(),
        }
    }
}

/// A mesh and the material maps it is drawn with. Dropping the model
/// releases every texture it owns.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub mesh: Mesh,
    pub base_color_map: Option<Texture>,
    pub normal_map: Option<Texture>,
    pub metallic_map: Option<Texture>,
    pub roughness_map: Option<Texture>,
}

impl Model {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            ..Self::default()
        }
    }

    fn attributes(&self) -> Vec<StandardAttribute> {
        self.mesh
            .vertices()
            .iter()
            .map(|vertex| StandardAttribute {
                position: vertex.position,
                normal: vertex.normal,
                tangent: vertex.tangent,
                texcoord: vertex.texcoord,
            })
            .collect()
    }
}

/// Owns the render targets, allocated once and reused for every frame.
pub struct FrameRenderer {
    settings: RenderSettings,
    color_buffer: Texture,
    depth_buffer: Texture,
    shadow_map: Texture,
}

impl FrameRenderer {
    pub fn new(settings: RenderSettings) -> Result<Self, RenderError> {
        let color_buffer = Texture::new(TextureFormat::Srgb8A8, settings.width, settings.height)?;
        let depth_buffer = Texture::new(TextureFormat::DepthFloat, settings.width, settings.height)?;
        let shadow_map = if settings.shadow.enabled {
            let size = settings.shadow.size;
            Texture::new(TextureFormat::DepthFloat, size, size)?
        } else {
            // Every lookup into this map passes, so nothing is shadowed.
            Texture::with_pixels(TextureFormat::DepthFloat, 1, 1, &[1.0f32])?
        };
        Ok(Self {
            settings,
            color_buffer,
            depth_buffer,
            shadow_map,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn color_buffer(&self) -> &Texture {
        &self.color_buffer
    }

    pub fn shadow_map(&self) -> &Texture {
        &self.shadow_map
    }

    /// Renders one frame and returns the color buffer.
    ///
    /// A single rasterizer serves both passes: it starts bound to the
    /// shadow-casting shaders over the shadow map, then is rebound to the
    /// standard shaders over the color buffer.
    pub fn render(&mut self, model: &Model, params: &FrameParams) -> Result<&Texture, RenderError> {
        let local2world = params.local2world();
        let shadow = self.settings.shadow;
        let (shadow_width, shadow_height) = self.shadow_map.size();
        let shadow_vertex = ShadowCastingVertexShader;
        let shadow_fragment = ShadowCastingFragmentShader;
        let mut rasterizer = Rasterizer::new(
            &shadow_vertex,
            &shadow_fragment,
            Viewport::full(shadow_width, shadow_height),
        );

        let light_world2clip = if shadow.enabled {
            let world2clip = params.light.world2clip(
                params.camera.target,
                shadow.extent,
                shadow.distance,
            );
            self.shadow_pass(&mut rasterizer, model, local2world, world2clip)?;
            debug!("shadow pass: {:?}", rasterizer.stats());
            world2clip
        } else {
            Mat4::IDENTITY
        };

        let standard_vertex = StandardVertexShader;
        let standard_fragment = StandardFragmentShader;
        let mut rasterizer = rasterizer.bind_shaders(&standard_vertex, &standard_fragment);
        rasterizer.reset_stats();
        rasterizer.set_viewport(Viewport::full(self.settings.width, self.settings.height));
        self.camera_pass(&mut rasterizer, model, params, local2world, light_world2clip)?;
        debug!("camera pass: {:?}", rasterizer.stats());
        Ok(&self.color_buffer)
    }

    fn shadow_pass(
        &mut self,
        rasterizer: &mut Rasterizer<'_, ShadowCastingVertexShader, ShadowCastingFragmentShader>,
        model: &Model,
        local2world: Mat4,
        light_world2clip: Mat4,
    ) -> Result<(), RenderError> {
        let mut framebuffer = Framebuffer::new();
        framebuffer.attach(AttachmentSlot::Depth, &mut self.shadow_map)?;
        framebuffer.clear_depth(1.0);

        let uniform = ShadowCastingUniform::new(local2world, light_world2clip);
        let mesh = &model.mesh;
        for triangle in 0..mesh.triangle_count() {
            let positions = [0, 1, 2].map(|corner| mesh.position(triangle, corner));
            rasterizer.draw_triangle(
                &mut framebuffer,
                &uniform,
                [&positions[0], &positions[1], &positions[2]],
            );
        }
        Ok(())
    }

    fn camera_pass(
        &mut self,
        rasterizer: &mut Rasterizer<'_, StandardVertexShader, StandardFragmentShader>,
        model: &Model,
        params: &FrameParams,
        local2world: Mat4,
        light_world2clip: Mat4,
    ) -> Result<(), RenderError> {
        let Self {
            settings,
            color_buffer,
            depth_buffer,
            shadow_map,
        } = self;
        let (width, height) = color_buffer.size();
        let mut framebuffer = Framebuffer::new();
        framebuffer.attach(AttachmentSlot::Color, color_buffer)?;
        framebuffer.attach(AttachmentSlot::Depth, depth_buffer)?;
        framebuffer.clear(Vec4::ZERO, 1.0);

        let local2world_direction = Mat3::from_mat4(local2world);
        let uniform = StandardUniform {
            local2world,
            world2clip: params.camera.world2clip(width as f32 / height as f32),
            local2world_direction,
            local2world_normal: local2world_direction.inverse().transpose(),
            camera_position: params.camera.position,
            light_direction: params.light.unit_direction(),
            illuminance: params.light.illuminance,
            world2light: scale_bias() * light_world2clip,
            shadow_map,
            shadow_bias: settings.shadow.bias,
            ambient_luminance: params.ambient_luminance,
            material: StandardMaterial {
                base_color: MaterialInput::mapped(
                    params.material.base_color,
                    model.base_color_map.as_ref(),
                ),
                metallic: MaterialInput::mapped(
                    params.material.metallic,
                    model.metallic_map.as_ref(),
                ),
                roughness: MaterialInput::mapped(
                    params.material.roughness,
                    model.roughness_map.as_ref(),
                ),
                reflectance: params.material.reflectance,
                normal_map: model.normal_map.as_ref(),
            },
        };

        let attributes = model.attributes();
        for triangle in model.mesh.indices().chunks_exact(3) {
            rasterizer.draw_triangle(
                &mut framebuffer,
                &uniform,
                [
                    &attributes[triangle[0] as usize],
                    &attributes[triangle[1] as usize],
                    &attributes[triangle[2] as usize],
                ],
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::load_obj_from_str;

    const QUAD: &str = "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nvn 0 0 1\nf 1//1 2//1 3//1 4//1\n";

    fn small_settings(shadow: bool) -> RenderSettings {
        RenderSettings {
            width: 16,
            height: 16,
            shadow: ShadowSettings {
                enabled: shadow,
                size: 32,
                ..ShadowSettings::default()
            },
        }
    }

    #[test]
    fn disabled_shadows_use_a_single_lit_texel() {
        let renderer = FrameRenderer::new(small_settings(false)).unwrap();
        assert_eq!(renderer.shadow_map().size(), (1, 1));
        assert_eq!(renderer.shadow_map().read_depth(0, 0), 1.0);

        let renderer = FrameRenderer::new(small_settings(true)).unwrap();
        assert_eq!(renderer.shadow_map().size(), (32, 32));
        assert_eq!(renderer.settings(), &small_settings(true));
        assert_eq!(renderer.color_buffer().size(), (16, 16));
        assert_eq!(renderer.color_buffer().format(), TextureFormat::Srgb8A8);
    }

    #[test]
    fn zero_sized_output_is_rejected() {
        let settings = RenderSettings {
            width: 0,
            ..small_settings(false)
        };
        assert!(FrameRenderer::new(settings).is_err());
    }

    #[test]
    fn facing_quad_fills_the_view_with_ambient() {
        let model = Model::new(load_obj_from_str(QUAD).unwrap());
        let mut params = FrameParams::default();
        params.camera.position = glam::Vec3::new(0.0, 0.0, 0.5);
        params.camera.target = glam::Vec3::ZERO;
        params.light.illuminance = glam::Vec3::ZERO;
        params.ambient_luminance = glam::Vec3::splat(1.0);

        let mut renderer = FrameRenderer::new(small_settings(true)).unwrap();
        let center = renderer.render(&model, &params).unwrap().read_pixel(8, 8);
        assert!((center - Vec4::ONE).abs().max_element() < 1e-2);
        assert_eq!(renderer.color_buffer().read_pixel(8, 8), center);
        let shadow_map = renderer.shadow_map();
        let covered = (0..32)
            .flat_map(|y| (0..32).map(move |x| (x, y)))
            .filter(|&(x, y)| shadow_map.read_depth(x, y) < 1.0)
            .count();
        assert!(covered > 0);
    }
}
