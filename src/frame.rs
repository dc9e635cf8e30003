//! Immutable per-frame scene values: camera, light and material constants.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn world2view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Perspective projection with NDC depth in `[-1, 1]`.
    pub fn view2clip(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, aspect.max(0.01), self.near, self.far)
    }

    pub fn world2clip(&self, aspect: f32) -> Mat4 {
        self.view2clip(aspect) * self.world2view()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.6, 2.2),
            target: Vec3::new(-0.06, 0.48, 0.0),
            up: Vec3::Y,
            fov_y: 36.0f32.to_radians(),
            near: 0.1,
            far: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction from the scene towards the light. Need not be normalized.
    pub direction: Vec3,
    pub illuminance: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing towards the light, or `+Y` for a zero direction.
    pub fn unit_direction(&self) -> Vec3 {
        let direction = self.direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            Vec3::Y
        } else {
            direction
        }
    }

    /// Orthographic light transform looking at `target` from `distance`
    /// along the light direction, covering `extent` on each side.
    pub fn world2clip(&self, target: Vec3, extent: f32, distance: f32) -> Mat4 {
        let direction = self.unit_direction();
        let eye = target + direction * distance;
        // Keep look-at well defined when the light is nearly vertical.
        let up = if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(eye, target, up);
        let projection =
            Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, 0.0, 2.0 * distance);
        projection * view
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::ONE,
            illuminance: Vec3::ONE,
        }
    }
}

/// Material constants; maps are attached to the model separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    pub base_color: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            metallic: 0.0,
            roughness: 1.0,
            reflectance: 0.5,
        }
    }
}

/// Everything that may change from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameParams {
    pub camera: Camera,
    pub light: DirectionalLight,
    pub ambient_luminance: Vec3,
    /// Model rotation about the world Y axis, in radians.
    pub rotation_y: f32,
    pub material: MaterialParams,
}

impl FrameParams {
    pub fn local2world(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_y)
    }
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            light: DirectionalLight::default(),
            ambient_luminance: Vec3::splat(0.98),
            rotation_y: 0.0,
            material: MaterialParams::default(),
        }
    }
}
