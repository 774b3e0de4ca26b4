use crate::{Ray, Vec3};

/// Axis-aligned bounding box for the BVH acceleration structures.
///
/// Invariant: `min <= max` componentwise for any box that contains
/// geometry. [`Aabb::EMPTY`] deliberately violates this so it behaves as
/// the identity for [`Aabb::union`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty box (contains nothing, identity for `union`).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a box from two opposite corners, in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing both inputs.
    pub fn union(a: &Aabb, b: &Aabb) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Grow the box to contain `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Center of the box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Rigidly shift the box by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Pad near-flat axes so planar geometry still has volume.
    pub fn padded(mut self) -> Aabb {
        const DELTA: f32 = 1e-4;
        for axis in 0..3 {
            if self.max[axis] - self.min[axis] < DELTA {
                self.min[axis] -= DELTA * 0.5;
                self.max[axis] += DELTA * 0.5;
            }
        }
        self
    }

    /// Slab test against a ray, pruned by the ray's current nearest hit.
    ///
    /// Returns true if the ray enters the box somewhere in `[0, ray.t)`.
    /// Uses the ray's precomputed reciprocal direction; axis-parallel rays
    /// produce infinite reciprocals, which propagate through the min/max
    /// arithmetic and give the correct accept/reject answer without
    /// branching on them.
    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        let t0 = (self.min - ray.origin) * ray.inv_direction;
        let t1 = (self.max - ray.origin) * ray.inv_direction;

        let t_near = t0.min(t1);
        let t_far = t0.max(t1);

        let t_entry = t_near.max_element().max(0.0);
        let t_exit = t_far.min_element();

        t_entry <= t_exit && t_entry < ray.t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Per-slab reference implementation from the textbook definition,
    /// used to validate the vectorized test.
    fn slab_reference(aabb: &Aabb, ray: &Ray) -> bool {
        let mut t_min = 0.0f32;
        let mut t_max = ray.t;
        for axis in 0..3 {
            let inv = 1.0 / ray.direction[axis];
            let mut a = (aabb.min[axis] - ray.origin[axis]) * inv;
            let mut b = (aabb.max[axis] - ray.origin[axis]) * inv;
            if a > b {
                std::mem::swap(&mut a, &mut b);
            }
            // NaN from 0 * inf: the slab does not constrain this axis
            if a.is_nan() || b.is_nan() {
                if ray.origin[axis] < aabb.min[axis] || ray.origin[axis] > aabb.max[axis] {
                    return false;
                }
                continue;
            }
            t_min = t_min.max(a);
            t_max = t_max.min(b);
            if t_min > t_max {
                return false;
            }
        }
        true
    }

    #[test]
    fn test_from_points_orders_corners() {
        let aabb = Aabb::from_points(Vec3::new(5.0, -1.0, 2.0), Vec3::new(-3.0, 4.0, 0.0));
        assert_eq!(aabb.min, Vec3::new(-3.0, -1.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(5.0, 4.0, 2.0));
    }

    #[test]
    fn test_union() {
        let a = Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0));
        let b = Aabb::from_points(Vec3::splat(3.0), Vec3::splat(10.0));
        let u = Aabb::union(&a, &b);
        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = Aabb::from_points(Vec3::splat(-2.0), Vec3::splat(3.0));
        let u = Aabb::union(&Aabb::EMPTY, &a);
        assert_eq!(u, a);
    }

    #[test]
    fn test_hit_basic() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Toward the box
        assert!(aabb.hit(&Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z)));
        // Away from the box
        assert!(!aabb.hit(&Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z)));
        // Parallel miss
        assert!(!aabb.hit(&Ray::new(Vec3::new(10.0, 0.0, -5.0), Vec3::Z)));
        // Origin inside
        assert!(aabb.hit(&Ray::new(Vec3::ZERO, Vec3::X)));
    }

    #[test]
    fn test_hit_respects_ray_t_cap() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0));
        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(aabb.hit(&ray));

        // A nearer hit already known: the box cannot contain anything closer
        ray.t = 5.0;
        assert!(!aabb.hit(&ray));
    }

    #[test]
    fn test_hit_axis_parallel_ray() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Direction has zero X and Z components: reciprocals are infinite
        let ray = Ray::new(Vec3::new(0.5, -5.0, 0.5), Vec3::Y);
        assert!(aabb.hit(&ray));

        let ray = Ray::new(Vec3::new(2.0, -5.0, 0.5), Vec3::Y);
        assert!(!aabb.hit(&ray));
    }

    #[test]
    fn test_hit_agrees_with_slab_reference() {
        // Small deterministic LCG; no external RNG needed here
        let mut state = 0x12345678u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
        };

        for _ in 0..2000 {
            let aabb = Aabb::from_points(
                Vec3::new(next() * 10.0, next() * 10.0, next() * 10.0),
                Vec3::new(next() * 10.0, next() * 10.0, next() * 10.0),
            );
            let mut dir = Vec3::new(next(), next(), next());
            // Exercise axis-parallel rays regularly
            if next() > 0.5 {
                dir.x = 0.0;
            }
            if dir.length_squared() < 1e-6 {
                continue;
            }
            let ray = Ray::new(
                Vec3::new(next() * 20.0, next() * 20.0, next() * 20.0),
                dir.normalize(),
            );
            assert_eq!(aabb.hit(&ray), slab_reference(&aabb, &ray));
        }
    }

    #[test]
    fn test_longest_axis_and_centroid() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 2.0, 4.0));
        assert_eq!(aabb.longest_axis(), 0);
        assert_eq!(aabb.centroid(), Vec3::new(5.0, 1.0, 2.0));

        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 4.0));
        assert_eq!(aabb.longest_axis(), 2);
    }

    #[test]
    fn test_translate_round_trip() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let offset = Vec3::new(3.0, -2.0, 0.5);
        let back = aabb.translate(offset).translate(-offset);
        assert_eq!(back, aabb);
    }
}
