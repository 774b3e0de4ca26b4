//! Top-level bounding volume hierarchy.
//!
//! A second tree over the bottom-level trees' world-space bounds, one leaf
//! per model. Traversal uses the same slab-test pruning as the bottom
//! level, except a leaf dispatches into the model's own tree. The whole
//! tree is rebuilt from scratch whenever the model set changes.

use crate::bvh::Bvh;
use crate::primitive::Primitive;
use ember_math::{Aabb, Ray};

#[derive(Debug)]
enum Node {
    Leaf {
        /// Index of the bottom-level tree this leaf dispatches into.
        model: u32,
        bounds: Aabb,
    },
    Inner {
        left: u32,
        right: u32,
        bounds: Aabb,
    },
}

/// Tree over all bottom-level trees. An empty scene yields an empty tree
/// whose traversal is a no-op that leaves the ray's hit state unchanged.
#[derive(Debug, Default)]
pub struct TopBvh {
    nodes: Vec<Node>,
    root: u32,
}

impl TopBvh {
    /// Build over the world bounds of every bottom-level tree, keyed by
    /// model id.
    pub fn build(trees: &[Bvh]) -> Self {
        let mut entries: Vec<(u32, Aabb)> = trees
            .iter()
            .enumerate()
            .map(|(id, tree)| (id as u32, tree.bounds()))
            .collect();

        let mut top = Self::default();
        if entries.is_empty() {
            return top;
        }
        let count = entries.len();
        top.root = top.build_range(&mut entries, 0, count);

        log::debug!("built top-level BVH over {} models", count);
        top
    }

    fn build_range(&mut self, entries: &mut [(u32, Aabb)], first: usize, count: usize) -> u32 {
        let slice = &entries[first..first + count];
        let bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, b)| Aabb::union(&acc, b));

        if count == 1 {
            self.nodes.push(Node::Leaf {
                model: slice[0].0,
                bounds,
            });
            return (self.nodes.len() - 1) as u32;
        }

        let centroid_bounds = slice.iter().fold(Aabb::EMPTY, |mut acc, (_, b)| {
            acc.grow(b.centroid());
            acc
        });
        let axis = centroid_bounds.longest_axis();

        entries[first..first + count].sort_unstable_by(|(_, a), (_, b)| {
            a.centroid()[axis]
                .partial_cmp(&b.centroid()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = count / 2;
        let left = self.build_range(entries, first, mid);
        let right = self.build_range(entries, first + mid, count - mid);

        self.nodes.push(Node::Inner {
            left,
            right,
            bounds,
        });
        (self.nodes.len() - 1) as u32
    }

    /// Traverse into every bottom-level tree the ray could enter closer
    /// than its current nearest hit.
    pub fn traverse(
        &self,
        primitives: &[Primitive],
        trees: &[Bvh],
        ray: &mut Ray,
        is_shadow_ray: bool,
    ) {
        if self.nodes.is_empty() {
            return;
        }
        self.traverse_node(self.root, primitives, trees, ray, is_shadow_ray);
    }

    fn traverse_node(
        &self,
        node: u32,
        primitives: &[Primitive],
        trees: &[Bvh],
        ray: &mut Ray,
        is_shadow_ray: bool,
    ) {
        match self.nodes[node as usize] {
            Node::Leaf { model, ref bounds } => {
                if bounds.hit(ray) {
                    trees[model as usize].traverse(primitives, ray, is_shadow_ray);
                }
            }
            Node::Inner {
                left,
                right,
                ref bounds,
            } => {
                if !bounds.hit(ray) {
                    return;
                }
                self.traverse_node(left, primitives, trees, ray, is_shadow_ray);
                if is_shadow_ray && ray.hit.is_some() {
                    return;
                }
                self.traverse_node(right, primitives, trees, ray, is_shadow_ray);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Shape;
    use ember_math::{Hit, Vec3};

    #[test]
    fn test_empty_traversal_is_a_no_op() {
        let top = TopBvh::build(&[]);
        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        top.traverse(&[], &[], &mut ray, false);
        assert_eq!(ray.hit, Hit::None);
        assert_eq!(ray.t, f32::INFINITY);
    }

    #[test]
    fn test_dispatches_to_nearest_model() {
        // Two single-primitive models along -Z
        let primitives = vec![
            Primitive::new(Shape::sphere(Vec3::new(0.0, 0.0, -20.0), 1.0), 0),
            Primitive::new(Shape::sphere(Vec3::new(0.0, 0.0, -8.0), 1.0), 0),
        ];
        let trees = vec![
            Bvh::build(&primitives, 0, 0),
            Bvh::build(&primitives, 1, 1),
        ];
        let top = TopBvh::build(&trees);

        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        top.traverse(&primitives, &trees, &mut ray, false);
        assert_eq!(ray.hit, Hit::Primitive(1));
        assert!((ray.t - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_many_models_match_linear() {
        let mut primitives = Vec::new();
        let mut trees = Vec::new();
        for i in 0..40u32 {
            let center = Vec3::new((i % 7) as f32 * 5.0 - 15.0, (i / 7) as f32 * 5.0 - 15.0, -30.0);
            primitives.push(Primitive::new(Shape::sphere(center, 1.5), 0));
            trees.push(Bvh::build(&primitives, i, i));
        }
        let top = TopBvh::build(&trees);

        for x in -3..4 {
            for y in -3..4 {
                let dir = Vec3::new(x as f32 * 0.1, y as f32 * 0.1, -1.0).normalize();

                let mut ray = Ray::new(Vec3::ZERO, dir);
                top.traverse(&primitives, &trees, &mut ray, false);

                let mut linear = Ray::new(Vec3::ZERO, dir);
                for (id, primitive) in primitives.iter().enumerate() {
                    primitive.intersect(id as u32, &mut linear);
                }

                assert_eq!(ray.hit, linear.hit);
            }
        }
    }
}
