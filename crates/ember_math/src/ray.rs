use crate::Vec3;

/// Identity of the nearest entity a ray has intersected so far.
///
/// Replaces the classic `-1` sentinel id plus "was it a light" flag with a
/// single tagged value. `u32` payloads are indices into the scene's
/// primitive or light list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    None,
    Primitive(u32),
    Light(u32),
}

impl Hit {
    /// True if any entity has been hit.
    #[inline]
    pub fn is_some(&self) -> bool {
        !matches!(self, Hit::None)
    }
}

/// A ray carrying its own nearest-hit state.
///
/// `t` starts at +infinity and only ever decreases: intersection routines
/// must go through [`Ray::register_primitive_hit`] /
/// [`Ray::register_light_hit`], which accept strictly closer hits only.
/// The reciprocal direction is precomputed for the AABB slab test; zero
/// direction components yield infinite reciprocals, which the slab test
/// tolerates.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
    /// Distance to the nearest hit found so far (+inf when none).
    pub t: f32,
    pub hit: Hit,
}

impl Ray {
    /// Create a ray with fresh hit state. `direction` should be unit length.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            t: f32::INFINITY,
            hit: Hit::None,
        }
    }

    /// Create a shadow ray whose `t` is capped at `max_t`, treated as an
    /// exclusive upper bound: any registered hit means occlusion.
    #[inline]
    pub fn shadow(origin: Vec3, direction: Vec3, max_t: f32) -> Self {
        let mut ray = Self::new(origin, direction);
        ray.t = max_t;
        ray
    }

    /// Point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Point of the current nearest hit.
    #[inline]
    pub fn hit_point(&self) -> Vec3 {
        self.at(self.t)
    }

    /// Record a primitive hit if it is strictly closer than the current one.
    /// Returns true if the hit was accepted.
    #[inline]
    pub fn register_primitive_hit(&mut self, id: u32, t: f32) -> bool {
        if t < self.t {
            self.t = t;
            self.hit = Hit::Primitive(id);
            true
        } else {
            false
        }
    }

    /// Record a light hit if it is strictly closer than the current one.
    #[inline]
    pub fn register_light_hit(&mut self, id: u32, t: f32) -> bool {
        if t < self.t {
            self.t = t;
            self.hit = Hit::Light(id);
            true
        } else {
            false
        }
    }
}
