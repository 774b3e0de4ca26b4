//! Surface material description.

use ember_math::Vec4;

/// RGBA color. The alpha channel doubles as the dielectric mixing weight
/// (how strongly the glass tints what passes through it).
pub type Color = Vec4;

/// How a surface scatters light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Lambertian surface; albedo from `color`.
    Diffuse,
    /// Perfect mirror; reflection tinted by `color`.
    Mirror,
    /// Glass-like surface; Fresnel-weighted reflection/refraction.
    Dielectric,
}

/// Material parameters shared by all primitives that reference it.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// Albedo, alpha = dielectric mixing weight.
    pub color: Color,
    pub kind: MaterialKind,
    /// Reflection coefficient, used by the deterministic dielectric blend.
    pub reflection: f32,
    /// Index of refraction; meaningful only for dielectrics.
    pub refraction: f32,
}

impl Material {
    pub fn diffuse(color: Color) -> Self {
        Self {
            color,
            kind: MaterialKind::Diffuse,
            reflection: 0.0,
            refraction: 1.0,
        }
    }

    pub fn mirror(color: Color) -> Self {
        Self {
            color,
            kind: MaterialKind::Mirror,
            reflection: 1.0,
            refraction: 1.0,
        }
    }

    pub fn dielectric(color: Color, refraction: f32, reflection: f32) -> Self {
        Self {
            color,
            kind: MaterialKind::Dielectric,
            reflection,
            refraction,
        }
    }

    /// Russian-roulette survival probability: the brightest albedo channel,
    /// clamped to [0, 1] and further capped at 0.5 for dielectrics so glass
    /// chains cannot recurse almost forever.
    pub fn survival_probability(&self) -> f32 {
        let p = self.color.x.max(self.color.y).max(self.color.z).min(1.0);
        if self.kind == MaterialKind::Dielectric {
            p.min(0.5)
        } else {
            p
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survival_probability_uses_brightest_channel() {
        let m = Material::diffuse(Color::new(0.2, 0.8, 0.4, 1.0));
        assert_eq!(m.survival_probability(), 0.8);

        // Over-bright albedo clamps to 1
        let m = Material::diffuse(Color::new(2.0, 0.1, 0.1, 1.0));
        assert_eq!(m.survival_probability(), 1.0);
    }

    #[test]
    fn test_survival_probability_dielectric_cap() {
        let m = Material::dielectric(Color::new(1.0, 1.0, 1.0, 1.0), 1.5, 0.1);
        assert_eq!(m.survival_probability(), 0.5);

        // Dim glass stays below the cap
        let m = Material::dielectric(Color::new(0.3, 0.1, 0.1, 1.0), 1.5, 0.1);
        assert!((m.survival_probability() - 0.3).abs() < 1e-6);
    }
}
