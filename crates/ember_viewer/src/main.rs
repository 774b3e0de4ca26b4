//! Offline progressive render driver.
//!
//! Builds a demo scene, accumulates a number of render passes, and writes
//! the tonemapped result to a PNG. Settings come from an optional JSON
//! file passed as the first argument; any omitted field keeps its default.

use anyhow::{Context, Result};
use ember_tracer::{RenderSettings, Renderer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

mod scenes;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct Config {
    render: RenderSettings,
    passes: u32,
    scene: scenes::DemoScene,
    output: PathBuf,
    /// Optional OBJ mesh placed into the scene.
    model: Option<PathBuf>,
    /// Optional environment image; the skydome scene falls back to a
    /// built-in gradient without one.
    skydome: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            passes: 16,
            scene: scenes::DemoScene::Showcase,
            output: PathBuf::from("render.png"),
            model: None,
            skydome: None,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings file {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing settings file {path}"))?
        }
        None => Config::default(),
    };

    let scene = scenes::build(
        config.scene,
        config.model.as_deref(),
        config.skydome.as_deref(),
    )?;

    let mut renderer = Renderer::new(scene, config.render);
    scenes::place_camera(renderer.camera_mut(), config.scene);

    log::info!(
        "rendering {:?} at {}x{}, {} passes, {} primitives",
        config.scene,
        config.render.width,
        config.render.height,
        config.passes,
        renderer.scene().primitive_count()
    );

    let start = Instant::now();
    for pass in 1..=config.passes {
        let pass_start = Instant::now();
        renderer.render_pass();
        log::info!(
            "pass {pass}/{} in {:.1?}",
            config.passes,
            pass_start.elapsed()
        );
    }
    log::info!("accumulated {} passes in {:.1?}", config.passes, start.elapsed());

    let settings = renderer.settings();
    let image = image::RgbaImage::from_raw(settings.width, settings.height, renderer.to_rgba())
        .context("resolved buffer does not match the configured dimensions")?;
    image
        .save(&config.output)
        .with_context(|| format!("writing {}", config.output.display()))?;
    log::info!("wrote {}", config.output.display());

    Ok(())
}
