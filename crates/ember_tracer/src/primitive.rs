//! Scene primitives as tagged variants.
//!
//! A single enum over {sphere, plane, triangle, cylinder, torus} keeps the
//! innermost traversal loop free of virtual dispatch and the primitive
//! array contiguous. A primitive's id is its index in the scene's list,
//! assigned at registration and passed back in at intersection time.

use ember_math::{smallest_positive_root, solve_quartic, Aabb, Ray, Vec3, EPSILON};

/// Geometry of a primitive.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// Finite disc-like plane patch: points within `size` of `point`.
    Plane {
        point: Vec3,
        normal: Vec3,
        size: f32,
    },
    Triangle {
        v0: Vec3,
        v1: Vec3,
        v2: Vec3,
        normal: Vec3,
    },
    /// Open tube from `base` to `base + axis * height`, `axis` unit length.
    Cylinder {
        base: Vec3,
        axis: Vec3,
        radius: f32,
        height: f32,
    },
    /// Ring around `axis` through `center`; `major` is the ring radius,
    /// `minor` the tube radius. `u`/`v` complete the orthonormal frame.
    Torus {
        center: Vec3,
        axis: Vec3,
        u: Vec3,
        v: Vec3,
        major: f32,
        minor: f32,
    },
}

impl Shape {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    pub fn plane(point: Vec3, normal: Vec3, size: f32) -> Self {
        Shape::Plane {
            point,
            normal: normal.normalize(),
            size,
        }
    }

    pub fn triangle(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Shape::Triangle {
            v0,
            v1,
            v2,
            normal: (v1 - v0).cross(v2 - v0).normalize(),
        }
    }

    pub fn cylinder(base: Vec3, axis: Vec3, radius: f32, height: f32) -> Self {
        Shape::Cylinder {
            base,
            axis: axis.normalize(),
            radius,
            height,
        }
    }

    pub fn torus(center: Vec3, axis: Vec3, major: f32, minor: f32) -> Self {
        let axis = axis.normalize();
        let u = axis.any_orthonormal_vector();
        let v = axis.cross(u);
        Shape::Torus {
            center,
            axis,
            u,
            v,
            major,
            minor,
        }
    }
}

/// A registered primitive: its shape plus the id of its material in the
/// scene's material list.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub shape: Shape,
    pub material: usize,
}

impl Primitive {
    pub fn new(shape: Shape, material: usize) -> Self {
        Self { shape, material }
    }

    /// Intersect, updating the ray's `t`/hit pair on a strictly closer hit.
    pub fn intersect(&self, id: u32, ray: &mut Ray) {
        if let Some(t) = self.shape.hit_distance(ray) {
            ray.register_primitive_hit(id, t);
        }
    }

    /// Outward unit surface normal at a point on the primitive.
    pub fn normal(&self, point: Vec3) -> Vec3 {
        self.shape.normal(point)
    }

    /// Rigidly shift the primitive.
    pub fn translate(&mut self, offset: Vec3) {
        self.shape.translate(offset);
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Aabb {
        self.shape.bounds()
    }
}

impl Shape {
    /// Nearest intersection distance beyond the self-intersection epsilon,
    /// ignoring the ray's current hit state (the caller compares).
    fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Shape::Sphere { center, radius } => {
                let oc = center - ray.origin;
                let h = oc.dot(ray.direction);
                let disc = h * h - oc.length_squared() + radius * radius;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                // Nearest root in front of the origin; the far root covers
                // rays starting inside the sphere (dielectrics).
                let t = h - sqrt_disc;
                if t > EPSILON {
                    return Some(t);
                }
                let t = h + sqrt_disc;
                (t > EPSILON).then_some(t)
            }

            Shape::Plane {
                point,
                normal,
                size,
            } => {
                let denom = ray.direction.dot(normal);
                if denom.abs() < 1e-8 {
                    return None;
                }
                let t = (point - ray.origin).dot(normal) / denom;
                if t <= EPSILON {
                    return None;
                }
                let hit = ray.at(t);
                ((hit - point).length_squared() <= size * size).then_some(t)
            }

            Shape::Triangle { v0, v1, v2, .. } => {
                // Moeller-Trumbore
                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                let h = ray.direction.cross(edge2);
                let a = edge1.dot(h);
                if a.abs() < 1e-8 {
                    return None; // parallel to the triangle plane
                }

                let f = 1.0 / a;
                let s = ray.origin - v0;
                let u = f * s.dot(h);
                if !(0.0..=1.0).contains(&u) {
                    return None;
                }

                let q = s.cross(edge1);
                let v = f * ray.direction.dot(q);
                if v < 0.0 || u + v > 1.0 {
                    return None;
                }

                let t = f * edge2.dot(q);
                (t > EPSILON).then_some(t)
            }

            Shape::Cylinder {
                base,
                axis,
                radius,
                height,
            } => {
                let oc = ray.origin - base;
                let d_axial = ray.direction.dot(axis);
                let oc_axial = oc.dot(axis);

                let d_perp = ray.direction - d_axial * axis;
                let oc_perp = oc - oc_axial * axis;

                let a = d_perp.length_squared();
                if a < 1e-12 {
                    return None; // ray parallel to the axis
                }
                let half_b = oc_perp.dot(d_perp);
                let c = oc_perp.length_squared() - radius * radius;

                let disc = half_b * half_b - a * c;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();

                for t in [(-half_b - sqrt_disc) / a, (-half_b + sqrt_disc) / a] {
                    if t <= EPSILON {
                        continue;
                    }
                    let h = oc_axial + t * d_axial;
                    if (0.0..=height).contains(&h) {
                        return Some(t);
                    }
                }
                None
            }

            Shape::Torus {
                center,
                axis,
                u,
                v,
                major,
                minor,
            } => {
                // Solve in the torus frame, where the ring lies in the
                // local xy plane. Coefficients in f64: the quartic is
                // numerically touchy at grazing angles.
                let oc = ray.origin - center;
                let o = glam::DVec3::new(
                    oc.dot(u) as f64,
                    oc.dot(v) as f64,
                    oc.dot(axis) as f64,
                );
                let d = glam::DVec3::new(
                    ray.direction.dot(u) as f64,
                    ray.direction.dot(v) as f64,
                    ray.direction.dot(axis) as f64,
                );

                let rr = major as f64 * major as f64;
                let g = d.length_squared();
                let h = 2.0 * o.dot(d);
                let oo = o.length_squared();
                let i = oo + rr - (minor as f64 * minor as f64);

                let a4 = g * g;
                let a3 = 2.0 * g * h;
                let a2 = h * h + 2.0 * g * i - 4.0 * rr * (g - d.z * d.z);
                let a1 = 2.0 * h * i - 4.0 * rr * (h - 2.0 * d.z * o.z);
                let a0 = i * i - 4.0 * rr * (oo - o.z * o.z);

                let (roots, n) = solve_quartic(a4, a3, a2, a1, a0);
                smallest_positive_root(&roots[..n], EPSILON as f64).map(|t| t as f32)
            }
        }
    }

    fn normal(&self, point: Vec3) -> Vec3 {
        match *self {
            Shape::Sphere { center, radius } => (point - center) / radius,
            Shape::Plane { normal, .. } => normal,
            Shape::Triangle { normal, .. } => normal,
            Shape::Cylinder { base, axis, .. } => {
                let h = (point - base).dot(axis);
                (point - base - h * axis).normalize()
            }
            Shape::Torus {
                center,
                axis,
                u,
                v,
                major,
                minor,
            } => {
                let q = point - center;
                let p = Vec3::new(q.dot(u), q.dot(v), q.dot(axis));
                let k = p.length_squared() - minor * minor - major * major;
                let n_local = Vec3::new(
                    p.x * k,
                    p.y * k,
                    p.z * (k + 2.0 * major * major),
                );
                (u * n_local.x + v * n_local.y + axis * n_local.z).normalize()
            }
        }
    }

    fn translate(&mut self, offset: Vec3) {
        match self {
            Shape::Sphere { center, .. } => *center += offset,
            Shape::Plane { point, .. } => *point += offset,
            Shape::Triangle { v0, v1, v2, .. } => {
                *v0 += offset;
                *v1 += offset;
                *v2 += offset;
            }
            Shape::Cylinder { base, .. } => *base += offset,
            Shape::Torus { center, .. } => *center += offset,
        }
    }

    fn bounds(&self) -> Aabb {
        match *self {
            Shape::Sphere { center, radius } => {
                Aabb::from_points(center - Vec3::splat(radius), center + Vec3::splat(radius))
            }
            Shape::Plane { point, size, .. } => {
                Aabb::from_points(point - Vec3::splat(size), point + Vec3::splat(size)).padded()
            }
            Shape::Triangle { v0, v1, v2, .. } => {
                let mut aabb = Aabb::from_points(v0, v1);
                aabb.grow(v2);
                aabb.padded()
            }
            Shape::Cylinder {
                base,
                axis,
                radius,
                height,
            } => {
                // Conservative: segment box padded by the radius
                let top = base + axis * height;
                let r = Vec3::splat(radius);
                Aabb::union(
                    &Aabb::from_points(base - r, base + r),
                    &Aabb::from_points(top - r, top + r),
                )
            }
            Shape::Torus { center, major, minor, .. } => {
                // Conservative: sphere of the outer radius
                let r = Vec3::splat(major + minor);
                Aabb::from_points(center - r, center + r)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_math::Hit;

    fn hit_t(shape: &Shape, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut ray = Ray::new(origin, direction.normalize());
        Primitive::new(shape.clone(), 0).intersect(7, &mut ray);
        match ray.hit {
            Hit::Primitive(7) => Some(ray.t),
            _ => None,
        }
    }

    #[test]
    fn test_sphere_hit_outside_and_inside() {
        let sphere = Shape::sphere(Vec3::new(0.0, 0.0, -5.0), 1.0);

        let t = hit_t(&sphere, Vec3::ZERO, -Vec3::Z).expect("front hit");
        assert!((t - 4.0).abs() < 1e-4);

        // Ray starting at the center exits through the far wall
        let t = hit_t(&sphere, Vec3::new(0.0, 0.0, -5.0), -Vec3::Z).expect("inside hit");
        assert!((t - 1.0).abs() < 1e-4);

        assert!(hit_t(&sphere, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_sphere_does_not_overwrite_closer_hit() {
        let sphere = Shape::sphere(Vec3::new(0.0, 0.0, -5.0), 1.0);
        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        ray.register_primitive_hit(0, 2.0);

        Primitive::new(sphere, 0).intersect(1, &mut ray);
        assert_eq!(ray.hit, Hit::Primitive(0));
        assert_eq!(ray.t, 2.0);
    }

    #[test]
    fn test_plane_hit_within_size() {
        let plane = Shape::plane(Vec3::new(0.0, -2.0, 0.0), Vec3::Y, 10.0);

        let t = hit_t(&plane, Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0)).expect("hit");
        assert!((t - 2.0).abs() < 1e-4);

        // Outside the patch radius
        assert!(hit_t(
            &plane,
            Vec3::new(20.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0)
        )
        .is_none());

        // Parallel ray
        assert!(hit_t(&plane, Vec3::ZERO, Vec3::X).is_none());
    }

    #[test]
    fn test_triangle_hit() {
        let tri = Shape::triangle(
            Vec3::new(-1.0, -1.0, -3.0),
            Vec3::new(1.0, -1.0, -3.0),
            Vec3::new(0.0, 1.0, -3.0),
        );

        let t = hit_t(&tri, Vec3::ZERO, -Vec3::Z).expect("hit");
        assert!((t - 3.0).abs() < 1e-4);

        // Past the edge
        assert!(hit_t(&tri, Vec3::new(2.0, 0.0, 0.0), -Vec3::Z).is_none());
    }

    #[test]
    fn test_cylinder_hit_side_and_height_range() {
        let cyl = Shape::cylinder(Vec3::new(0.0, -1.0, -5.0), Vec3::Y, 0.5, 2.0);

        let t = hit_t(&cyl, Vec3::ZERO, -Vec3::Z).expect("hit");
        assert!((t - 4.5).abs() < 1e-3);

        // Above the tube
        assert!(hit_t(&cyl, Vec3::new(0.0, 3.0, 0.0), -Vec3::Z).is_none());

        let n = cyl.normal(Vec3::new(0.0, 0.0, -4.5));
        assert!((n - Vec3::Z).length() < 1e-3);
    }

    #[test]
    fn test_torus_hit() {
        // Ring of radius 2, tube 0.5, around the Y axis at the origin
        let torus = Shape::torus(Vec3::ZERO, Vec3::Y, 2.0, 0.5);

        // From z = 5 along -Z the near tube surface sits at z = 2.5
        let t = hit_t(&torus, Vec3::new(0.0, 0.0, 5.0), -Vec3::Z).expect("hit");
        assert!((t - 2.5).abs() < 1e-3, "t = {t}");

        // Straight through the hole
        assert!(hit_t(&torus, Vec3::new(0.0, 5.0, 0.0), -Vec3::Y).is_none());

        // Normal on the outer equator points outward
        let n = torus.normal(Vec3::new(0.0, 0.0, 2.5));
        assert!((n - Vec3::Z).length() < 1e-3, "n = {n}");
    }

    #[test]
    fn test_translate_round_trip() {
        let mut prim = Primitive::new(Shape::sphere(Vec3::ZERO, 1.0), 0);
        let offset = Vec3::new(1.0, 2.0, 3.0);
        prim.translate(offset);
        prim.translate(-offset);
        match prim.shape {
            Shape::Sphere { center, .. } => assert_eq!(center, Vec3::ZERO),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bounds_contain_shape() {
        let cyl = Shape::cylinder(Vec3::ZERO, Vec3::Y, 0.5, 2.0);
        let bounds = cyl.bounds();
        assert!(bounds.min.x <= -0.5 && bounds.max.x >= 0.5);
        assert!(bounds.min.y <= 0.0 && bounds.max.y >= 2.0);

        let torus = Shape::torus(Vec3::ZERO, Vec3::Y, 2.0, 0.5);
        let bounds = torus.bounds();
        assert!(bounds.max.x >= 2.5 && bounds.min.x <= -2.5);
    }
}
