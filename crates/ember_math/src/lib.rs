// Re-export glam for convenience
pub use glam::*;

// Ember math types
mod aabb;
mod poly;
mod ray;

pub use aabb::Aabb;
pub use poly::{smallest_positive_root, solve_cubic, solve_quadratic, solve_quartic};
pub use ray::{Hit, Ray};

/// Shared intersection epsilon: shadow-ray offsets, self-intersection
/// avoidance, degenerate-area floors.
pub const EPSILON: f32 = 1e-4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec4_color_channels() {
        let c = Vec4::new(0.2, 0.4, 0.6, 1.0);
        assert_eq!(c.truncate(), Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(c.w, 1.0);
    }
}
