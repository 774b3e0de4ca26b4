//! Bottom-level bounding volume hierarchy.
//!
//! One tree per model (one loaded mesh or one standalone primitive),
//! built over a contiguous range of the scene's primitive ids. Nodes live
//! in a per-tree arena and address each other by index, so teardown and
//! rebuild are just dropping the vectors; there are no parent/child
//! pointers to chase or leak.

use crate::primitive::Primitive;
use ember_math::{Aabb, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// Split recursion stops here even for pathological centroid clusters.
const MAX_DEPTH: usize = 32;

/// Arena node: a leaf owns a contiguous range of the tree's primitive-id
/// array; an inner node owns two child indices and a box enclosing both.
#[derive(Debug)]
enum Node {
    Leaf {
        first: u32,
        count: u32,
        bounds: Aabb,
    },
    Inner {
        left: u32,
        right: u32,
        bounds: Aabb,
    },
}

impl Node {
    fn bounds(&self) -> &Aabb {
        match self {
            Node::Leaf { bounds, .. } | Node::Inner { bounds, .. } => bounds,
        }
    }
}

/// A binary tree over the primitive indices `[start, end]` of one model.
#[derive(Debug)]
pub struct Bvh {
    nodes: Vec<Node>,
    /// Global primitive ids, reordered during construction; leaves index
    /// into this array.
    indices: Vec<u32>,
    root: u32,
}

impl Bvh {
    /// Build a tree over the inclusive primitive-id range `[start, end]`.
    ///
    /// A single-primitive range yields a single leaf, the common case for
    /// standalone primitives.
    pub fn build(primitives: &[Primitive], start: u32, end: u32) -> Self {
        let indices: Vec<u32> = (start..=end).collect();
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * indices.len()),
            indices,
            root: 0,
        };
        let count = bvh.indices.len();
        bvh.root = bvh.build_range(primitives, 0, count, 0);

        log::debug!(
            "built BVH over primitives [{start}, {end}]: {} nodes",
            bvh.nodes.len()
        );
        bvh
    }

    /// World-space bounds of the whole tree.
    pub fn bounds(&self) -> Aabb {
        *self.nodes[self.root as usize].bounds()
    }

    fn build_range(
        &mut self,
        primitives: &[Primitive],
        first: usize,
        count: usize,
        depth: usize,
    ) -> u32 {
        let slice = &self.indices[first..first + count];
        let bounds = slice.iter().fold(Aabb::EMPTY, |acc, &id| {
            Aabb::union(&acc, &primitives[id as usize].bounds())
        });

        if count <= LEAF_MAX_SIZE || depth >= MAX_DEPTH {
            self.nodes.push(Node::Leaf {
                first: first as u32,
                count: count as u32,
                bounds,
            });
            return (self.nodes.len() - 1) as u32;
        }

        // Median split on the axis where the centroids spread the most
        let centroid_bounds = slice.iter().fold(Aabb::EMPTY, |mut acc, &id| {
            acc.grow(primitives[id as usize].bounds().centroid());
            acc
        });
        let axis = centroid_bounds.longest_axis();

        self.indices[first..first + count].sort_unstable_by(|&a, &b| {
            let ca = primitives[a as usize].bounds().centroid()[axis];
            let cb = primitives[b as usize].bounds().centroid()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = count / 2;
        let left = self.build_range(primitives, first, mid, depth + 1);
        let right = self.build_range(primitives, first + mid, count - mid, depth + 1);

        self.nodes.push(Node::Inner {
            left,
            right,
            bounds,
        });
        (self.nodes.len() - 1) as u32
    }

    /// Find the nearest primitive hit (or, for shadow rays, any hit below
    /// the ray's capped `t`), updating the ray's hit state.
    ///
    /// Subtrees are pruned when the slab test misses or cannot beat the
    /// ray's current nearest hit; the result equals brute-force linear
    /// intersection regardless of traversal order.
    pub fn traverse(&self, primitives: &[Primitive], ray: &mut Ray, is_shadow_ray: bool) {
        self.traverse_node(self.root, primitives, ray, is_shadow_ray);
    }

    fn traverse_node(&self, node: u32, primitives: &[Primitive], ray: &mut Ray, is_shadow_ray: bool) {
        match self.nodes[node as usize] {
            Node::Leaf {
                first,
                count,
                ref bounds,
            } => {
                if !bounds.hit(ray) {
                    return;
                }
                for &id in &self.indices[first as usize..(first + count) as usize] {
                    primitives[id as usize].intersect(id, ray);
                    // A shadow ray only needs existence of an occluder
                    if is_shadow_ray && ray.hit.is_some() {
                        return;
                    }
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
                self.traverse_node(left, primitives, ray, is_shadow_ray);
                if is_shadow_ray && ray.hit.is_some() {
                    return;
                }
                self.traverse_node(right, primitives, ray, is_shadow_ray);
            }
        }
    }
}
