use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use softlight::app::{frame_indices, load_model, render_sequence};
use softlight::SceneConfig;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = SceneConfig::load(&options.path)
        .with_context(|| format!("failed to load scene {}", options.path))?;
    let model = load_model(&config).context("failed to load model assets")?;

    println!("Loaded mesh with {} triangles", model.mesh.triangle_count());
    println!(
        "Output {}x{}, {} frame(s), shadows {}",
        config.output.width,
        config.output.height,
        config.frame_count(),
        if config.shadow.enabled { "on" } else { "off" }
    );

    if options.summary_only {
        print_frames(&config, &frame_indices(&config, options.frame)?);
        return Ok(());
    }

    let output_dir = options
        .output_dir
        .unwrap_or_else(|| config.resolve(&config.output.directory));
    let written = render_sequence(&config, &model, &output_dir, options.frame)?;
    println!("Rendered {} frame(s)", written.len());
    Ok(())
}

fn print_frames(config: &SceneConfig, frames: &[usize]) {
    for &index in frames {
        let params = config.frame(index);
        let camera = params.camera.position;
        let light = params.light.direction;
        println!(
            " - frame {index:03} rotation={:.4} camera=({:.3}, {:.3}, {:.3}) light=({:.3}, {:.3}, {:.3})",
            params.rotation_y, camera.x, camera.y, camera.z, light.x, light.y, light.z
        );
    }
}

struct CliOptions {
    path: String,
    output_dir: Option<PathBuf>,
    frame: Option<usize>,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: softlight <scene.xml> [--output-dir DIR] [--frame N] [--summary-only]"
            ));
        };
        let mut output_dir = None;
        let mut frame = None;
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--output-dir" => {
                    let dir = args
                        .next()
                        .ok_or_else(|| anyhow!("--output-dir needs a directory"))?;
                    output_dir = Some(PathBuf::from(dir));
                }
                "--frame" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frame needs a frame index"))?;
                    frame = Some(
                        value
                            .parse::<usize>()
                            .with_context(|| format!("invalid frame index {value:?}"))?,
                    );
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --output-dir, --frame or --summary-only"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            output_dir,
            frame,
            summary_only,
        })
    }
}
