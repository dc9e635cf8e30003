use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::animation::{Animation, Timeline, Track};
use crate::frame::{Camera, DirectionalLight, FrameParams, MaterialParams};
use crate::renderer::{RenderSettings, ShadowSettings};

/// Scene description: what to render, how, and how it animates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneConfig {
    pub output: OutputConfig,
    pub model: ModelConfig,
    pub material: MaterialParams,
    pub camera: Camera,
    pub light: LightConfig,
    pub shadow: ShadowSettings,
    pub animation: Animation,
    /// Directory relative asset paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub directory: String,
    pub prefix: String,
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            directory: "output".to_string(),
            prefix: String::new(),
            extension: "tga".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    pub mesh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness_map: Option<String>,
    /// Radians.
    #[serde(default)]
    pub rotation_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub direction: Vec3,
    pub illuminance: Vec3,
    pub ambient: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        let light = DirectionalLight::default();
        Self {
            direction: light.direction,
            illuminance: light.illuminance,
            ambient: Vec3::splat(0.98),
        }
    }
}

impl SceneConfig {
    /// Reads a scene file; relative asset paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)
            .with_context(|| format!("unable to read scene {}", path.display()))?;
        let mut config = Self::from_xml(&xml)
            .with_context(|| format!("failed to parse scene {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        let mut config = Self::default();

        if let Some(node) = child(&root, "output") {
            let output = &mut config.output;
            output.width = parse_number(optional_text(&node, "width"), output.width)?;
            output.height = parse_number(optional_text(&node, "height"), output.height)?;
            if let Some(directory) = optional_text(&node, "directory") {
                output.directory = directory;
            }
            if let Some(prefix) = optional_text(&node, "prefix") {
                output.prefix = prefix;
            }
            if let Some(extension) = optional_text(&node, "extension") {
                output.extension = extension.trim_start_matches('.').to_string();
            }
        }

        let model = child(&root, "model").ok_or_else(|| anyhow!("<model> tag is missing"))?;
        config.model = ModelConfig {
            mesh: required_text(&model, "mesh")?,
            base_color_map: optional_text(&model, "base_color_map"),
            normal_map: optional_text(&model, "normal_map"),
            metallic_map: optional_text(&model, "metallic_map"),
            roughness_map: optional_text(&model, "roughness_map"),
            rotation_y: parse_number(optional_text(&model, "rotation_y"), 0.0)?,
        };

        if let Some(node) = child(&root, "material") {
            let material = &mut config.material;
            material.base_color =
                parse_spectrum(optional_text(&node, "base_color"), material.base_color)?;
            material.metallic = parse_number(optional_text(&node, "metallic"), material.metallic)?;
            material.roughness =
                parse_number(optional_text(&node, "roughness"), material.roughness)?;
            material.reflectance =
                parse_number(optional_text(&node, "reflectance"), material.reflectance)?;
        }

        if let Some(node) = child(&root, "camera") {
            let camera = &mut config.camera;
            camera.position = parse_vec3(optional_text(&node, "position"), camera.position)?;
            camera.target = parse_vec3(optional_text(&node, "target"), camera.target)?;
            camera.up = parse_vec3(optional_text(&node, "up"), camera.up)?;
            camera.fov_y = parse_number(optional_text(&node, "fov"), camera.fov_y.to_degrees())?
                .to_radians();
            camera.near = parse_number(optional_text(&node, "near"), camera.near)?;
            camera.far = parse_number(optional_text(&node, "far"), camera.far)?;
        }

        if let Some(node) = child(&root, "light") {
            let light = &mut config.light;
            light.direction = parse_vec3(optional_text(&node, "direction"), light.direction)?;
            light.illuminance =
                parse_spectrum(optional_text(&node, "illuminance"), light.illuminance)?;
            light.ambient = parse_spectrum(optional_text(&node, "ambient"), light.ambient)?;
        }

        if let Some(node) = child(&root, "shadow") {
            let shadow = &mut config.shadow;
            shadow.enabled = parse_bool(optional_text(&node, "enabled"), true)?;
            shadow.size = parse_number(optional_text(&node, "size"), shadow.size)?;
            shadow.extent = parse_number(optional_text(&node, "extent"), shadow.extent)?;
            shadow.distance = parse_number(optional_text(&node, "distance"), shadow.distance)?;
            shadow.bias = parse_number(optional_text(&node, "bias"), shadow.bias)?;
        }

        if let Some(node) = child(&root, "animation") {
            let defaults = Timeline::default();
            config.animation.timeline = Timeline {
                fps: parse_number(optional_text(&node, "fps"), defaults.fps)?,
                duration: parse_number(optional_text(&node, "duration"), defaults.duration)?,
            };
            for track in node.children().filter(|n| n.has_tag_name("track")) {
                config.animation.tracks.push(parse_track(&track)?);
            }
        }

        if config.output.width == 0 || config.output.height == 0 {
            return Err(anyhow!("output size must be non-zero"));
        }
        if !(config.animation.timeline.fps > 0.0) {
            return Err(anyhow!("animation fps must be positive"));
        }
        Ok(config)
    }

    /// Frame parameters before any animation track is applied.
    pub fn base_frame(&self) -> FrameParams {
        FrameParams {
            camera: self.camera,
            light: DirectionalLight {
                direction: self.light.direction,
                illuminance: self.light.illuminance,
            },
            ambient_luminance: self.light.ambient,
            rotation_y: self.model.rotation_y,
            material: self.material,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.animation.frame_count()
    }

    pub fn frame(&self, index: usize) -> FrameParams {
        self.animation.frame(&self.base_frame(), index)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            width: self.output.width,
            height: self.output.height,
            shadow: self.shadow,
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}

fn parse_track(node: &Node<'_, '_>) -> Result<Track> {
    let property = required_text(node, "property")?;
    let from = required_text(node, "from")?;
    let to = required_text(node, "to")?;
    let track = match property.as_str() {
        "rotation_y" => Track::RotationY {
            from: parse_number(Some(from), 0.0)?,
            to: parse_number(Some(to), 0.0)?,
        },
        "camera_position" => Track::CameraPosition {
            from: parse_vec3(Some(from), Vec3::ZERO)?,
            to: parse_vec3(Some(to), Vec3::ZERO)?,
        },
        "camera_distance" => Track::CameraDistance {
            from: parse_number(Some(from), 0.0)?,
            to: parse_number(Some(to), 0.0)?,
        },
        "light_direction" => Track::LightDirection {
            from: parse_vec3(Some(from), Vec3::ZERO)?,
            to: parse_vec3(Some(to), Vec3::ZERO)?,
        },
        other => return Err(anyhow!("unknown animation property: {other}")),
    };
    Ok(track)
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse {component:?}: {err}"))
        })
        .collect()
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_components(&value)?.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector needs 3 components: {value:?}")),
    }
}

/// A color or radiometric quantity: three components, or one for grey.
fn parse_spectrum(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_components(&value)?.as_slice() {
        [v] => Ok(Vec3::splat(*v)),
        [r, g, b] => Ok(Vec3::new(*r, *g, *b)),
        _ => Err(anyhow!("expected 1 or 3 components: {value:?}")),
    }
}

fn parse_number<T>(value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value
            .parse::<T>()
            .map_err(|err| anyhow!("failed to parse {value:?}: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(anyhow!("expected a boolean, found {other:?}")),
    }
}
