//! Octree over one mesh's triangles
//!
//! Divides the mesh bounds into hierarchical octants. A leaf subdivides into
//! 8 children once it holds more than `max_triangles_per_node` triangles.
//! Triangles are never clipped: a triangle straddling child boundaries is
//! stored in every child that holds one of its vertices, and each node keeps
//! loose bounds that grow to cover every triangle stored beneath it.

use std::any::Any;

use crate::collision::predicates::{box_contains_all_vertices, box_contains_any_vertex};
use crate::collision::primitives::{Triangle, AABB};
use crate::config::{IndexConfig, IndexKind};
use crate::error::IntersectError;
use crate::foundation::logging::debug;
use crate::foundation::math::Vec3;
use crate::spatial::pair::{self, IndexPairHits};
use crate::spatial::spatial_query::{self, IndexNode, SpatialIndex};

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq)]
pub struct OctreeConfig {
    /// Maximum triangles per leaf before subdivision
    pub max_triangles_per_node: usize,

    /// Depth past which triangles are appended without further subdivision
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_triangles_per_node: 10,
            max_depth: 32,
        }
    }
}

impl From<&IndexConfig> for OctreeConfig {
    fn from(config: &IndexConfig) -> Self {
        Self {
            max_triangles_per_node: config.max_triangles_per_node,
            max_depth: config.max_depth,
        }
    }
}

/// Counters collected while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    /// Leaves turned into interior nodes
    pub split_count: usize,
    /// Triangles no child accepted, kept on an interior node
    pub overflow_count: usize,
    /// Triangles appended past `max_depth`
    pub depth_capped_count: usize,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Cell of this node; children bisect it at its center
    pub bounds: AABB,

    /// Cell grown to cover every triangle stored at or below this node
    pub loose_bounds: AABB,

    /// Triangles stored on this node (leaf payload or interior overflow)
    pub triangles: Vec<Triangle>,

    /// Child nodes (8 octants), None if this is a leaf
    pub children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            loose_bounds: bounds,
            triangles: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn push(&mut self, triangle: Triangle) {
        self.loose_bounds = self.loose_bounds.union(&triangle.bounds());
        self.triangles.push(triangle);
    }

    /// Insert a triangle at recursion level `level`
    ///
    /// Past `max_depth` the triangle is appended unconditionally. A full
    /// leaf is split and the insertion retried one level deeper. An interior
    /// node forwards the triangle to every child holding one of its vertices
    /// and keeps it itself when no child does.
    pub fn insert(&mut self, triangle: Triangle, level: u32, config: &OctreeConfig, stats: &mut OctreeStats) {
        if level > config.max_depth {
            stats.depth_capped_count += 1;
            self.push(triangle);
            return;
        }

        if self.is_leaf() {
            if self.triangles.len() < config.max_triangles_per_node {
                self.push(triangle);
            } else {
                self.split(stats);
                self.insert(triangle, level + 1, config, stats);
            }
            return;
        }

        self.loose_bounds = self.loose_bounds.union(&triangle.bounds());
        let mut inserted = false;
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if box_contains_any_vertex(&child.bounds, &triangle) {
                    child.insert(triangle, level + 1, config, stats);
                    inserted = true;
                }
            }
        }

        if !inserted {
            stats.overflow_count += 1;
            self.push(triangle);
        }
    }

    /// Subdivide this node into 8 children and hand its triangles down
    fn split(&mut self, stats: &mut OctreeStats) {
        let boxes = self.bounds.octants();
        let depth = self.depth + 1;
        let mut children = boxes.map(|bounds| OctreeNode::new(bounds, depth));

        for triangle in self.triangles.drain(..) {
            let slot = boxes
                .iter()
                .position(|bounds| box_contains_all_vertices(bounds, &triangle))
                .unwrap_or_else(|| nearest_octant(&boxes, &triangle.centroid()));
            children[slot].push(triangle);
        }

        self.children = Some(Box::new(children));
        stats.split_count += 1;
    }

    /// Get all leaf nodes
    pub fn get_all_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode>) {
        if self.is_leaf() {
            leaves.push(self);
        } else if let Some(ref children) = self.children {
            for child in children.iter() {
                child.get_all_leaves(leaves);
            }
        }
    }

    /// Count triangles in this node and all children, duplicates included
    pub fn count_triangles(&self) -> usize {
        let mut count = self.triangles.len();

        if let Some(ref children) = self.children {
            for child in children.iter() {
                count += child.count_triangles();
            }
        }

        count
    }

    /// Deepest node depth at or below this node
    pub fn max_depth(&self) -> u32 {
        self.children
            .as_ref()
            .map_or(self.depth, |children| children.iter().map(OctreeNode::max_depth).max().unwrap_or(self.depth))
    }
}

/// Child whose center is closest to `point`; the first minimum wins
fn nearest_octant(boxes: &[AABB; 8], point: &Vec3) -> usize {
    let mut nearest = 0;
    let mut min_distance = (boxes[0].center() - point).norm();
    for (i, bounds) in boxes.iter().enumerate().skip(1) {
        let distance = (bounds.center() - point).norm();
        if distance < min_distance {
            min_distance = distance;
            nearest = i;
        }
    }
    nearest
}

impl IndexNode for OctreeNode {
    fn bounds(&self) -> &AABB {
        &self.loose_bounds
    }

    fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    fn children(&self) -> &[Self] {
        match &self.children {
            Some(children) => children.as_slice(),
            None => &[],
        }
    }
}

/// Octree spatial partitioning structure
#[derive(Debug, Clone, Default)]
pub struct Octree {
    /// Root node, absent until built from at least one triangle
    root: Option<OctreeNode>,

    /// Configuration
    config: OctreeConfig,

    /// Counters from the last build
    stats: OctreeStats,
}

impl Octree {
    /// Create an empty octree
    pub fn new(config: OctreeConfig) -> Self {
        Self {
            root: None,
            config,
            stats: OctreeStats::default(),
        }
    }

    /// Discard the current tree and insert `triangles` in order
    pub fn build(&mut self, triangles: Vec<Triangle>, root_bounds: AABB) {
        self.clear();
        if triangles.is_empty() {
            debug!("Octree build skipped: no triangles");
            return;
        }

        let input_count = triangles.len();
        let mut root = OctreeNode::new(root_bounds, 0);
        for triangle in triangles {
            root.insert(triangle, 0, &self.config, &mut self.stats);
        }

        debug!(
            "Built octree: {} triangles, {} stored, {} splits, {} overflow, depth {}",
            input_count,
            root.count_triangles(),
            self.stats.split_count,
            self.stats.overflow_count,
            root.max_depth()
        );
        self.root = Some(root);
    }

    /// Root node, if built
    pub fn root(&self) -> Option<&OctreeNode> {
        self.root.as_ref()
    }

    /// Build parameters
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Counters from the last build
    pub fn stats(&self) -> OctreeStats {
        self.stats
    }

    /// Get all leaf nodes
    pub fn get_all_leaves(&self) -> Vec<&OctreeNode> {
        let mut leaves = Vec::new();
        if let Some(root) = &self.root {
            root.get_all_leaves(&mut leaves);
        }
        leaves
    }

    /// Clear the octree
    pub fn clear(&mut self) {
        self.root = None;
        self.stats = OctreeStats::default();
    }
}

impl SpatialIndex for Octree {
    fn kind(&self) -> IndexKind {
        IndexKind::Octree
    }

    fn build(&mut self, triangles: Vec<Triangle>, root_bounds: AABB) {
        Octree::build(self, triangles, root_bounds);
    }

    fn clear(&mut self) {
        Octree::clear(self);
    }

    fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn triangle_count(&self) -> usize {
        self.root.as_ref().map_or(0, OctreeNode::count_triangles)
    }

    fn query_triangle(&self, incoming: &Triangle) -> Vec<Triangle> {
        spatial_query::query_triangle(self.root.as_ref(), incoming)
    }

    fn intersect_index(&self, other: &dyn SpatialIndex) -> Result<IndexPairHits, IntersectError> {
        let other_tree = other
            .as_any()
            .downcast_ref::<Octree>()
            .ok_or(IntersectError::UnsupportedIndexPairing {
                left: self.kind(),
                right: other.kind(),
            })?;
        Ok(pair::intersect_nodes(self.root.as_ref(), other_tree.root.as_ref()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
