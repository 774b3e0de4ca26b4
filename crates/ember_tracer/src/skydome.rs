//! Equirectangular environment map.

use crate::error::SceneError;
use crate::material::Color;
use ember_math::{Vec3, Vec4};
use std::f32::consts::FRAC_1_PI;
use std::path::Path;

/// Radiance lookup for rays that escape the scene, indexed by direction.
pub struct Skydome {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Skydome {
    /// Load from an image file (HDR formats supported by `image`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| SceneError::Skydome {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgb32f();

        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| Vec4::new(p.0[0], p.0[1], p.0[2], 1.0))
            .collect();

        log::info!("loaded skydome {} ({width}x{height})", path.display());
        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
        })
    }

    /// Build from raw pixels (row-major), mainly for tests.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>) -> Self {
        assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Equirectangular lookup by unit direction.
    pub fn sample(&self, direction: Vec3) -> Color {
        let u = (0.5 * (1.0 + direction.x.atan2(-direction.z) * FRAC_1_PI)).fract();
        let v = direction.y.clamp(-1.0, 1.0).acos() * FRAC_1_PI;

        let x = (u * (self.width - 1) as f32) as usize;
        let y = (v * (self.height - 1) as f32) as usize;
        self.pixels[x + y * self.width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_picks_expected_texel() {
        // 4x2 dome with distinct colors
        let pixels: Vec<Color> = (0..8)
            .map(|i| Color::new(i as f32, 0.0, 0.0, 1.0))
            .collect();
        let dome = Skydome::from_pixels(4, 2, pixels);

        // Straight up: v = acos(1)/pi = 0, top row
        let c = dome.sample(Vec3::Y);
        assert_eq!(c.y, 0.0);
        let up_row = (c.x as usize) / 4;
        assert_eq!(up_row, 0);

        // Straight down: v = acos(-1)/pi = 1, bottom row
        let c = dome.sample(-Vec3::Y);
        let down_row = (c.x as usize) / 4;
        assert_eq!(down_row, 1);
    }

    #[test]
    fn test_sample_is_deterministic_per_direction() {
        let pixels = vec![Color::ONE; 16 * 8];
        let dome = Skydome::from_pixels(16, 8, pixels);
        let dir = Vec3::new(0.3, 0.5, -0.8).normalize();
        assert_eq!(dome.sample(dir), dome.sample(dir));
    }
}
