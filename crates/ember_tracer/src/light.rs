//! Light sources.
//!
//! Lights are intersectable as tiny emissive solids (so specular chains
//! can see them directly) and sampleable for next-event estimation.

use crate::material::Color;
use ember_math::{Ray, Vec3, EPSILON};
use rand::Rng;
use std::f32::consts::PI;

/// A registered light source. Ids are indices into the scene's light list.
#[derive(Debug, Clone)]
pub enum Light {
    /// Zero-area light; its direct term is intensity scaled at the
    /// receiving point (1/d^2), not a solid angle.
    Point {
        position: Vec3,
        color: Color,
        intensity: f32,
    },
    /// Finite sphere, sampled uniformly over its surface.
    Sphere {
        position: Vec3,
        radius: f32,
        color: Color,
        intensity: f32,
        area: f32,
    },
}

impl Light {
    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        Light::Point {
            position,
            color,
            intensity,
        }
    }

    pub fn sphere(position: Vec3, radius: f32, color: Color, intensity: f32) -> Self {
        Light::Sphere {
            position,
            radius,
            color,
            intensity,
            area: 4.0 * PI * radius * radius,
        }
    }

    pub fn color(&self) -> Color {
        match *self {
            Light::Point { color, .. } | Light::Sphere { color, .. } => color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match *self {
            Light::Point { intensity, .. } | Light::Sphere { intensity, .. } => intensity,
        }
    }

    /// Emitted radiance seen by a ray that hit the light directly.
    pub fn emitted(&self) -> Color {
        self.color() * self.intensity()
    }

    /// Intersect as an emissive solid, updating the ray's hit state on a
    /// strictly closer hit.
    pub fn intersect(&self, id: u32, ray: &mut Ray) {
        match *self {
            Light::Point { position, .. } => {
                // A zero-area light is only hit by a ray passing exactly
                // through it.
                let oc = position - ray.origin;
                let t = oc.dot(ray.direction);
                if t < 0.0 {
                    return;
                }
                if (oc - t * ray.direction).length_squared() < 1e-12 {
                    ray.register_light_hit(id, t);
                }
            }
            Light::Sphere {
                position, radius, ..
            } => {
                let oc = position - ray.origin;
                let t_mid = oc.dot(ray.direction);
                if t_mid < 0.0 {
                    return;
                }
                let p2 = (oc - t_mid * ray.direction).length_squared();
                let r2 = radius * radius;
                if p2 > r2 {
                    return;
                }
                let t = t_mid - (r2 - p2).sqrt();
                if t >= EPSILON {
                    ray.register_light_hit(id, t);
                }
            }
        }
    }

    /// Sample a point on the light's surface for a shadow ray.
    pub fn sample_point<R: Rng>(&self, rng: &mut R) -> Vec3 {
        match *self {
            Light::Point { position, .. } => position,
            Light::Sphere {
                position, radius, ..
            } => {
                // Uniform over the sphere via (theta, cos phi)
                let theta = 2.0 * PI * rng.gen::<f32>();
                let phi = (1.0 - 2.0 * rng.gen::<f32>()).acos();
                let dir = Vec3::new(
                    phi.sin() * theta.cos(),
                    phi.sin() * theta.sin(),
                    phi.cos(),
                );
                position + radius * dir
            }
        }
    }

    /// Unit normal toward `point` (for the emitter-side cosine).
    pub fn normal(&self, point: Vec3) -> Vec3 {
        match *self {
            Light::Point { position, .. } | Light::Sphere { position, .. } => {
                (point - position).normalize()
            }
        }
    }

    /// Surface area; near-zero (never zero) for point lights so the
    /// solid-angle division stays finite.
    pub fn area(&self) -> f32 {
        match *self {
            Light::Point { .. } => EPSILON,
            Light::Sphere { area, .. } => area,
        }
    }
}
