//! Abstract spatial index interface
//!
//! Two layers:
//! - [`IndexNode`] is the traversal capability every tree node exposes. The
//!   single-triangle query and the pair comparator are written once against
//!   it and shared by every index layout.
//! - [`SpatialIndex`] is the object-safe interface the marker holds. It lets
//!   the layout be chosen from configuration at runtime.

use std::any::Any;
use std::collections::VecDeque;

use crate::collision::predicates::{box_intersects_triangle, triangles_intersect};
use crate::collision::primitives::{Triangle, AABB};
use crate::config::{IndexConfig, IndexKind};
use crate::error::IntersectError;
use crate::spatial::kd_tree::KdTree;
use crate::spatial::octree::Octree;
use crate::spatial::pair::IndexPairHits;

/// Read-only view of one node of a spatial tree
pub trait IndexNode: Sized {
    /// Volume guaranteed to enclose every triangle stored at or below this node
    fn bounds(&self) -> &AABB;

    /// Triangles stored on this node itself
    ///
    /// For a leaf this is its payload. An interior node may still hold
    /// overflow triangles that no child accepted.
    fn triangles(&self) -> &[Triangle];

    /// Child nodes; empty for a leaf
    fn children(&self) -> &[Self];

    /// Check if this node is a leaf (has no children)
    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// Every stored triangle that intersects `incoming`.
///
/// Breadth-first walk that prunes subtrees whose bounds miss `incoming`.
/// A triangle stored in several leaves is reported once per leaf.
pub fn query_triangle<N: IndexNode>(root: Option<&N>, incoming: &Triangle) -> Vec<Triangle> {
    let mut hits = Vec::new();
    let Some(root) = root else {
        return hits;
    };

    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if !box_intersects_triangle(node.bounds(), incoming) {
            continue;
        }

        hits.extend(
            node.triangles()
                .iter()
                .filter(|stored| triangles_intersect(stored, incoming))
                .copied(),
        );
        queue.extend(node.children());
    }

    hits
}

/// Object-safe spatial index over one mesh's triangles
pub trait SpatialIndex: Send + Sync {
    /// Which layout this index uses
    fn kind(&self) -> IndexKind;

    /// Discard the current tree and index `triangles` inside `root_bounds`.
    ///
    /// An empty triangle list leaves the index without a root.
    fn build(&mut self, triangles: Vec<Triangle>, root_bounds: AABB);

    /// Drop every stored triangle
    fn clear(&mut self);

    /// Whether the index has no root
    fn is_empty(&self) -> bool;

    /// Number of stored triangle references, counting duplicates
    fn triangle_count(&self) -> usize;

    /// Every stored triangle that intersects `incoming`
    fn query_triangle(&self, incoming: &Triangle) -> Vec<Triangle>;

    /// Intersect this index with another index of the same kind
    ///
    /// Returns the intersecting triangles of each side, `a` from `self` and
    /// `b` from `other`.
    fn intersect_index(&self, other: &dyn SpatialIndex) -> Result<IndexPairHits, IntersectError>;

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;
}

/// Create an empty index of the configured kind
pub fn create(config: &IndexConfig) -> Box<dyn SpatialIndex> {
    match config.kind {
        IndexKind::Octree => Box::new(Octree::new(config.into())),
        IndexKind::KdTree => Box::new(KdTree::new(config.into())),
    }
}
