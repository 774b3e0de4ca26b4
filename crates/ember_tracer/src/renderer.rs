//! Progressive render loop.
//!
//! The [`Renderer`] owns the scene, camera, accumulator, and settings.
//! Each [`render_pass`](Renderer::render_pass) adds one stratified sample
//! set per pixel. Rows are fanned out over the rayon pool with a per-row
//! generator seeded from (seed, pass, row), so a pass is deterministic for
//! a fixed seed regardless of scheduling.

use crate::accumulator::Accumulator;
use crate::camera::Camera;
use crate::integrator::{sample, sample_nee};
use crate::material::Color;
use crate::scene::Scene;
use ember_math::{Vec3, EPSILON};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which path-sampling estimator drives the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Cosine-importance-sampled bounces with Russian roulette.
    Importance,
    /// Next-event estimation with uniform bounces and a fixed depth cap.
    NextEvent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Each pixel is split into `strata x strata` jittered sub-samples
    /// per pass.
    pub strata: u32,
    /// Display brightness factor applied when resolving to 8-bit.
    pub brightness: f32,
    pub mode: SamplingMode,
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 512,
            strata: 2,
            brightness: 1.0,
            mode: SamplingMode::Importance,
            seed: 1,
        }
    }
}

pub struct Renderer {
    scene: Scene,
    camera: Camera,
    accumulator: Accumulator,
    settings: RenderSettings,
}

impl Renderer {
    pub fn new(scene: Scene, settings: RenderSettings) -> Self {
        Self {
            scene,
            camera: Camera::new(settings.width, settings.height),
            accumulator: Accumulator::new(settings.width as usize, settings.height as usize),
            settings,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access. Any mutation invalidates accumulated samples,
    /// so the accumulator is reset up front.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.accumulator.reset();
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access; resets the accumulator. Callers that poke
    /// positional fields directly must finish with
    /// [`Camera::calculate_screen`].
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.accumulator.reset();
        &mut self.camera
    }

    /// Move the eye and target together and restart accumulation.
    pub fn translate_camera(&mut self, offset: Vec3) {
        self.accumulator.reset();
        self.camera.translate(offset);
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Switching estimators mid-flight would average two different
    /// distributions, so the accumulator restarts.
    pub fn set_mode(&mut self, mode: SamplingMode) {
        if self.settings.mode != mode {
            self.settings.mode = mode;
            self.accumulator.reset();
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Samples accumulated per pixel so far.
    pub fn samples(&self) -> u32 {
        self.accumulator.samples()
    }

    /// Trace one stratified sample set per pixel and fold it into the
    /// accumulator, one rayon task per image row.
    pub fn render_pass(&mut self) {
        self.accumulator.increase();
        let pass = self.accumulator.samples();

        let scene = &self.scene;
        let camera = &self.camera;
        let settings = self.settings;
        let width = settings.width as usize;

        self.accumulator
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, pixels)| {
                let mut rng = SmallRng::seed_from_u64(row_seed(settings.seed, pass, row as u64));
                for (x, pixel) in pixels.iter_mut().enumerate() {
                    *pixel += sample_pixel(
                        scene,
                        camera,
                        &settings,
                        x as f32,
                        row as f32,
                        &mut rng,
                    );
                }
            });
    }

    /// Resolve the running average to 8-bit RGBA for display or export.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.accumulator.to_rgba(self.settings.brightness)
    }
}

/// One pass worth of radiance for the pixel at (x, y): a jittered sample
/// per stratum, averaged over the strata grid.
fn sample_pixel<R: Rng>(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    x: f32,
    y: f32,
    rng: &mut R,
) -> Color {
    let strata = settings.strata.max(1);
    let stratum_width = 1.0 / strata as f32;

    let mut color = Color::ZERO;
    for i in 0..strata {
        for j in 0..strata {
            let dx = rng.gen::<f32>() * (stratum_width - EPSILON) + j as f32 * stratum_width;
            let dy = rng.gen::<f32>() * (stratum_width - EPSILON) + i as f32 * stratum_width;

            let ray = camera.generate_ray(x + dx, y + dy);
            color += match settings.mode {
                SamplingMode::Importance => sample(scene, ray, rng, 0, true),
                SamplingMode::NextEvent => sample_nee(scene, ray, rng, 0, true),
            };
        }
    }

    color * (stratum_width * stratum_width)
}

/// Decorrelate rows and passes without sharing generator state across the
/// pool (splitmix-style multiplicative mixing).
fn row_seed(seed: u64, pass: u32, row: u64) -> u64 {
    seed ^ (pass as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ row.wrapping_mul(0xd1b5_4a32_d192_ed03)
}
