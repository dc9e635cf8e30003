use glam::{Mat4, Vec3};

/// Remaps each component of a clip-space position from `[-1, 1]` to `[0, 1]`.
///
/// Applied after a light's world-to-clip transform so the result can be used
/// directly as shadow-map texture coordinates and reference depth.
pub fn scale_bias() -> Mat4 {
    Mat4::from_translation(Vec3::splat(0.5)) * Mat4::from_scale(Vec3::splat(0.5))
}

/// Linear interpolation between two values of the same type.
pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn scale_bias_maps_clip_cube_corners_to_unit_cube() {
        let matrix = scale_bias();
        let low = matrix * Vec4::new(-1.0, -1.0, -1.0, 1.0);
        let high = matrix * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(low, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(high, Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn lerp_hits_both_endpoints() {
        assert_eq!(2.0f32.lerp(4.0, 0.0), 2.0);
        assert_eq!(2.0f32.lerp(4.0, 1.0), 4.0);
        assert_eq!(
            Lerp::lerp(Vec3::ZERO, Vec3::new(0.0, 0.6, 2.2), 0.5),
            Vec3::new(0.0, 0.3, 1.1)
        );
    }
}
