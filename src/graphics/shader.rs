//! Programmable stage contract invoked by the rasterizer.
//!
//! A vertex stage turns one vertex attribute bundle into a clip-space
//! position plus a set of varyings; a fragment stage turns interpolated
//! varyings into a color. Both receive the draw's uniform block `U` and must
//! be pure functions of their inputs, since the rasterizer is free to visit
//! pixels in any order.

use glam::{Vec2, Vec3, Vec4};

/// Per-vertex values blended across a triangle's surface.
pub trait Varying: Copy {
    /// Blends three values with weights that sum to one.
    fn interpolate(values: [&Self; 3], weights: Vec3) -> Self;
}

impl Varying for () {
    fn interpolate(_values: [&Self; 3], _weights: Vec3) -> Self {}
}

macro_rules! impl_linear_varying {
    ($($ty:ty),*) => {
        $(
            impl Varying for $ty {
                fn interpolate(values: [&Self; 3], weights: Vec3) -> Self {
                    *values[0] * weights.x + *values[1] * weights.y + *values[2] * weights.z
                }
            }
        )*
    };
}

impl_linear_varying!(f32, Vec2, Vec3, Vec4);

/// Result of the vertex stage for a single vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput<V> {
    pub clip_position: Vec4,
    pub varying: V,
}

/// Result of the fragment stage for a single covered pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fragment {
    /// Linear RGBA written into the color attachment, replacing the old value.
    Color(Vec4),
    /// Leaves both the color and depth attachments untouched.
    Discard,
}

pub trait VertexShader<U> {
    type Attribute;
    type Varying: Varying;

    fn shade_vertex(&self, attribute: &Self::Attribute, uniform: &U) -> VertexOutput<Self::Varying>;
}

pub trait FragmentShader<U> {
    type Varying: Varying;

    fn shade_fragment(&self, varying: &Self::Varying, uniform: &U) -> Fragment;
}
