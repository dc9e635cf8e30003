//! Linear parameter tracks sampled over a fixed-rate timeline.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::frame::FrameParams;
use crate::math::Lerp;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub fps: f32,
    /// Length in seconds.
    pub duration: f32,
}

impl Timeline {
    pub fn frame_count(&self) -> usize {
        let frames = (self.duration * self.fps).floor();
        if frames.is_finite() && frames > 0.0 {
            frames as usize
        } else {
            0
        }
    }

    /// Normalized time of frame `index`, in `[0, 1)`.
    pub fn time(&self, index: usize) -> f32 {
        let count = self.frame_count();
        if count == 0 {
            0.0
        } else {
            index as f32 / count as f32
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            fps: 30.0,
            duration: 4.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property", rename_all = "snake_case")]
pub enum Track {
    RotationY { from: f32, to: f32 },
    CameraPosition { from: Vec3, to: Vec3 },
    /// Moves the camera along the ray from the origin through its base position.
    CameraDistance { from: f32, to: f32 },
    LightDirection { from: Vec3, to: Vec3 },
}

impl Track {
    pub fn name(&self) -> &'static str {
        match self {
            Track::RotationY { .. } => "rotation_y",
            Track::CameraPosition { .. } => "camera_position",
            Track::CameraDistance { .. } => "camera_distance",
            Track::LightDirection { .. } => "light_direction",
        }
    }

    pub fn apply(&self, params: &mut FrameParams, t: f32) {
        match *self {
            Track::RotationY { from, to } => params.rotation_y = Lerp::lerp(from, to, t),
            Track::CameraPosition { from, to } => params.camera.position = from.lerp(to, t),
            Track::CameraDistance { from, to } => {
                let direction = params.camera.position.normalize_or_zero();
                params.camera.position = direction * Lerp::lerp(from, to, t);
            }
            Track::LightDirection { from, to } => params.light.direction = from.lerp(to, t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Animation {
    pub timeline: Timeline,
    pub tracks: Vec<Track>,
}

impl Animation {
    pub fn frame_count(&self) -> usize {
        self.timeline.frame_count()
    }

    /// Parameters of frame `index`, with every track applied in order.
    pub fn frame(&self, base: &FrameParams, index: usize) -> FrameParams {
        let t = self.timeline.time(index);
        let mut params = *base;
        for track in &self.tracks {
            track.apply(&mut params, t);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_truncates() {
        assert_eq!(Timeline::default().frame_count(), 135);
        assert_eq!(Timeline { fps: 2.0, duration: 1.0 }.frame_count(), 2);
        assert_eq!(Timeline { fps: 30.0, duration: 0.0 }.frame_count(), 0);
    }

    #[test]
    fn rotation_track_reaches_near_end_value() {
        let animation = Animation {
            timeline: Timeline::default(),
            tracks: vec![Track::RotationY { from: 0.0, to: -0.94 }],
        };
        let base = FrameParams::default();
        assert_eq!(animation.frame(&base, 0).rotation_y, 0.0);
        let last = animation.frame(&base, 134).rotation_y;
        assert!((last - (-0.94 * 134.0 / 135.0)).abs() < 1e-5);
        assert!((last + 0.9330).abs() < 1e-3);
    }

    #[test]
    fn camera_distance_keeps_direction() {
        let mut base = FrameParams::default();
        base.camera.position = Vec3::new(0.0, 3.0, 4.0);
        let animation = Animation {
            timeline: Timeline { fps: 1.0, duration: 2.0 },
            tracks: vec![Track::CameraDistance { from: 10.0, to: 0.0 }],
        };
        let position = animation.frame(&base, 1).camera.position;
        assert!((position - Vec3::new(0.0, 3.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn tracks_leave_other_parameters_alone() {
        let base = FrameParams::default();
        let animation = Animation {
            timeline: Timeline::default(),
            tracks: vec![Track::LightDirection {
                from: Vec3::X,
                to: Vec3::Z,
            }],
        };
        let frame = animation.frame(&base, 10);
        assert_eq!(frame.camera, base.camera);
        assert_eq!(frame.material, base.material);
        assert_ne!(frame.light.direction, base.light.direction);
    }

    #[test]
    fn track_names_match_scene_properties() {
        let tracks = [
            Track::RotationY { from: 0.0, to: 1.0 },
            Track::CameraPosition {
                from: Vec3::ZERO,
                to: Vec3::ONE,
            },
            Track::CameraDistance { from: 1.0, to: 2.0 },
            Track::LightDirection {
                from: Vec3::X,
                to: Vec3::Y,
            },
        ];
        let names: Vec<_> = tracks.iter().map(Track::name).collect();
        assert_eq!(
            names,
            ["rotation_y", "camera_position", "camera_distance", "light_direction"]
        );
    }
}
