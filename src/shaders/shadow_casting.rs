//! Depth-only shader pair rendering geometry from the light's point of view.

use glam::{Mat4, Vec3, Vec4};

use crate::graphics::{Fragment, FragmentShader, VertexOutput, VertexShader};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCastingUniform {
    pub local2clip: Mat4,
}

impl ShadowCastingUniform {
    pub fn new(local2world: Mat4, light_world2clip: Mat4) -> Self {
        Self {
            local2clip: light_world2clip * local2world,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowCastingVertexShader;

impl VertexShader<ShadowCastingUniform> for ShadowCastingVertexShader {
    type Attribute = Vec3;
    type Varying = ();

    fn shade_vertex(&self, position: &Vec3, uniform: &ShadowCastingUniform) -> VertexOutput<()> {
        VertexOutput {
            clip_position: uniform.local2clip * position.extend(1.0),
            varying: (),
        }
    }
}

/// Accepts every fragment so its depth is stored; the shadow framebuffer has
/// no color attachment, so the returned color is never written.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowCastingFragmentShader;

impl FragmentShader<ShadowCastingUniform> for ShadowCastingFragmentShader {
    type Varying = ();

    fn shade_fragment(&self, _varying: &(), _uniform: &ShadowCastingUniform) -> Fragment {
        Fragment::Color(Vec4::ONE)
    }
}
