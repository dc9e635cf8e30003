//! Frame-sequence driver shared by the command line tool and tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::image_io::{load_texture, save_texture};
use crate::obj::load_mesh;
use crate::renderer::{FrameRenderer, Model};
use crate::scene::SceneConfig;

/// Loads the mesh and every material map named by the scene.
pub fn load_model(config: &SceneConfig) -> Result<Model> {
    let model_config = &config.model;
    let mesh = load_mesh(config.resolve(&model_config.mesh))?;
    let load_map = |path: &Option<String>, is_color_data: bool| -> Result<_> {
        path.as_deref()
            .map(|path| load_texture(config.resolve(path), is_color_data))
            .transpose()
    };
    Ok(Model {
        mesh,
        base_color_map: load_map(&model_config.base_color_map, true)?,
        normal_map: load_map(&model_config.normal_map, false)?,
        metallic_map: load_map(&model_config.metallic_map, false)?,
        roughness_map: load_map(&model_config.roughness_map, false)?,
    })
}

/// Output file for frame `index`: `{directory}/{prefix}{index:03}.{extension}`.
pub fn frame_path(directory: &Path, prefix: &str, extension: &str, index: usize) -> PathBuf {
    directory.join(format!("{prefix}{index:03}.{extension}"))
}

/// Renders the scene's frames into `output_dir`, or only `only_frame` when
/// given. Returns the paths written, in order.
///
/// Nothing is created on disk unless the frame index is in range and the
/// render targets could be allocated.
pub fn render_sequence(
    config: &SceneConfig,
    model: &Model,
    output_dir: &Path,
    only_frame: Option<usize>,
) -> Result<Vec<PathBuf>> {
    let frames = frame_indices(config, only_frame)?;
    let mut renderer = FrameRenderer::new(config.render_settings())
        .context("failed to allocate render targets")?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("unable to create {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(frames.len());
    for index in frames {
        let params = config.frame(index);
        let color = renderer
            .render(model, &params)
            .with_context(|| format!("failed to render frame {index}"))?;
        let path = frame_path(
            output_dir,
            &config.output.prefix,
            &config.output.extension,
            index,
        );
        save_texture(color, &path, true)?;
        info!("frame {index} -> {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Frames selected by `only_frame`, or the whole sequence.
pub fn frame_indices(config: &SceneConfig, only_frame: Option<usize>) -> Result<Vec<usize>> {
    let count = config.frame_count();
    match only_frame {
        Some(index) if index >= count => Err(anyhow!(
            "frame {index} is out of range; the sequence has {count} frame(s)"
        )),
        Some(index) => Ok(vec![index]),
        None => Ok((0..count).collect()),
    }
}
