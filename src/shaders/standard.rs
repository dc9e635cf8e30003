//! Metallic-roughness shading with normal mapping, one directional light,
//! a constant ambient term and binary shadow-map occlusion.

use std::f32::consts::PI;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::graphics::{
    CompareFunction, Fragment, FragmentShader, Texture, Varying, VertexOutput, VertexShader,
};

/// Perceptual roughness is clamped to this floor to keep the specular lobe
/// finite.
const MIN_PERCEPTUAL_ROUGHNESS: f32 = 0.045;

/// Per-vertex inputs read from the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StandardAttribute {
    pub position: Vec3,
    pub normal: Vec3,
    /// `w` carries the bitangent handedness (+1 or -1).
    pub tangent: Vec4,
    pub texcoord: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StandardVarying {
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub world_tangent: Vec4,
    pub texcoord: Vec2,
}

impl Varying for StandardVarying {
    fn interpolate(values: [&Self; 3], weights: Vec3) -> Self {
        Self {
            world_position: Vec3::interpolate(values.map(|v| &v.world_position), weights),
            world_normal: Vec3::interpolate(values.map(|v| &v.world_normal), weights),
            world_tangent: Vec4::interpolate(values.map(|v| &v.world_tangent), weights),
            texcoord: Vec2::interpolate(values.map(|v| &v.texcoord), weights),
        }
    }
}

/// A material parameter: a constant factor, optionally modulated by a map.
///
/// Without a map the factor is used as is, which matches sampling a white
/// 1x1 texture.
#[derive(Debug, Clone, Copy)]
pub struct MaterialInput<'a, T> {
    pub factor: T,
    pub map: Option<&'a Texture>,
}

impl<'a, T> MaterialInput<'a, T> {
    pub fn value(factor: T) -> Self {
        Self { factor, map: None }
    }

    pub fn mapped(factor: T, map: Option<&'a Texture>) -> Self {
        Self { factor, map }
    }
}

impl MaterialInput<'_, Vec3> {
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        match self.map {
            Some(map) => self.factor * map.sample(uv).truncate(),
            None => self.factor,
        }
    }
}

impl MaterialInput<'_, f32> {
    pub fn sample(&self, uv: Vec2) -> f32 {
        match self.map {
            Some(map) => self.factor * map.sample(uv).x,
            None => self.factor,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StandardMaterial<'a> {
    pub base_color: MaterialInput<'a, Vec3>,
    pub metallic: MaterialInput<'a, f32>,
    pub roughness: MaterialInput<'a, f32>,
    /// Dielectric reflectance; 0.5 maps to the common F0 of 4%.
    pub reflectance: f32,
    /// Tangent-space normal map. `None` means no perturbation.
    pub normal_map: Option<&'a Texture>,
}

impl Default for StandardMaterial<'_> {
    fn default() -> Self {
        Self {
            base_color: MaterialInput::value(Vec3::ONE),
            metallic: MaterialInput::value(0.0),
            roughness: MaterialInput::value(1.0),
            reflectance: 0.5,
            normal_map: None,
        }
    }
}

/// Constant data shared by every vertex and fragment of one draw.
#[derive(Debug, Clone, Copy)]
pub struct StandardUniform<'a> {
    pub local2world: Mat4,
    pub world2clip: Mat4,
    pub local2world_direction: Mat3,
    pub local2world_normal: Mat3,
    pub camera_position: Vec3,
    /// Unit vector from the surface towards the light.
    pub light_direction: Vec3,
    pub illuminance: Vec3,
    /// World to light clip space, remapped to `[0, 1]` by [`crate::math::scale_bias`].
    pub world2light: Mat4,
    pub shadow_map: &'a Texture,
    pub shadow_bias: f32,
    pub ambient_luminance: Vec3,
    pub material: StandardMaterial<'a>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardVertexShader;

impl<'a> VertexShader<StandardUniform<'a>> for StandardVertexShader {
    type Attribute = StandardAttribute;
    type Varying = StandardVarying;

    fn shade_vertex(
        &self,
        attribute: &StandardAttribute,
        uniform: &StandardUniform<'a>,
    ) -> VertexOutput<StandardVarying> {
        let world_position = uniform.local2world * attribute.position.extend(1.0);
        let world_tangent = uniform.local2world_direction * attribute.tangent.truncate();
        VertexOutput {
            clip_position: uniform.world2clip * world_position,
            varying: StandardVarying {
                world_position: world_position.truncate(),
                world_normal: uniform.local2world_normal * attribute.normal,
                world_tangent: world_tangent.extend(attribute.tangent.w),
                texcoord: attribute.texcoord,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFragmentShader;

impl<'a> FragmentShader<StandardUniform<'a>> for StandardFragmentShader {
    type Varying = StandardVarying;

    fn shade_fragment(&self, varying: &StandardVarying, uniform: &StandardUniform<'a>) -> Fragment {
        let material = &uniform.material;
        let uv = varying.texcoord;
        let base_color = material.base_color.sample(uv);
        let metallic = material.metallic.sample(uv).clamp(0.0, 1.0);
        let perceptual_roughness = material
            .roughness
            .sample(uv)
            .clamp(MIN_PERCEPTUAL_ROUGHNESS, 1.0);
        let roughness = perceptual_roughness * perceptual_roughness;

        let n = shading_normal(varying, material.normal_map);
        let v = (uniform.camera_position - varying.world_position).normalize_or_zero();
        let l = uniform.light_direction.normalize_or_zero();
        let h = (v + l).normalize_or_zero();
        let n_dot_v = n.dot(v).abs() + 1e-5;
        let n_dot_l = n.dot(l).clamp(0.0, 1.0);
        let n_dot_h = n.dot(h).clamp(0.0, 1.0);
        let l_dot_h = l.dot(h).clamp(0.0, 1.0);

        let dielectric_f0 = 0.16 * material.reflectance * material.reflectance;
        let f0 = Vec3::splat(dielectric_f0).lerp(base_color, metallic);
        let specular = fresnel_schlick(f0, l_dot_h)
            * (distribution_ggx(n_dot_h, roughness)
                * visibility_smith_ggx_correlated(n_dot_v, n_dot_l, roughness));
        let diffuse_color = base_color * (1.0 - metallic);
        let diffuse = diffuse_color / PI;

        let shadow = shadow_factor(
            uniform.world2light,
            uniform.shadow_map,
            varying.world_position,
            uniform.shadow_bias,
        );
        let direct = (diffuse + specular) * uniform.illuminance * (n_dot_l * shadow);
        let ambient = uniform.ambient_luminance * diffuse_color;
        let color = (direct + ambient).clamp(Vec3::ZERO, Vec3::ONE);
        Fragment::Color(color.extend(1.0))
    }
}

/// Occlusion of `world_position` from the light: 1.0 lit, 0.0 shadowed.
///
/// Positions that fall outside the light frustum are lit.
pub fn shadow_factor(
    world2light: Mat4,
    shadow_map: &Texture,
    world_position: Vec3,
    bias: f32,
) -> f32 {
    let position = world2light * world_position.extend(1.0);
    if !(position.w > 0.0) {
        return 1.0;
    }
    let position = position.truncate() / position.w;
    if !position.is_finite()
        || position.cmplt(Vec3::ZERO).any()
        || position.cmpgt(Vec3::ONE).any()
    {
        return 1.0;
    }
    shadow_map.sample_compare(
        position.truncate(),
        position.z - bias,
        CompareFunction::LessEqual,
    )
}

/// World-space normal used for lighting, perturbed by the tangent-space
/// normal map when one is bound.
pub fn shading_normal(varying: &StandardVarying, normal_map: Option<&Texture>) -> Vec3 {
    let normal = varying.world_normal.normalize_or_zero();
    let Some(normal_map) = normal_map else {
        return normal;
    };
    let tangent = varying.world_tangent.truncate();
    let tangent = (tangent - normal * normal.dot(tangent)).normalize_or_zero();
    let handedness = if varying.world_tangent.w < 0.0 { -1.0 } else { 1.0 };
    let bitangent = normal.cross(tangent) * handedness;
    let texel = normal_map.sample(varying.texcoord).truncate() * 2.0 - Vec3::ONE;
    let perturbed = tangent * texel.x + bitangent * texel.y + normal * texel.z;
    let perturbed = perturbed.normalize_or_zero();
    if perturbed == Vec3::ZERO {
        normal
    } else {
        perturbed
    }
}

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a2 = roughness * roughness;
    let f = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * f * f)
}

fn visibility_smith_ggx_correlated(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let a2 = roughness * roughness;
    let ggx_l = n_dot_v * (n_dot_l * n_dot_l * (1.0 - a2) + a2).sqrt();
    let ggx_v = n_dot_l * (n_dot_v * n_dot_v * (1.0 - a2) + a2).sqrt();
    0.5 / (ggx_v + ggx_l)
}

fn fresnel_schlick(f0: Vec3, l_dot_h: f32) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - l_dot_h).powi(5)
}
