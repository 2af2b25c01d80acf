//! KD-tree over one mesh's triangles
//!
//! Binary alternative to the octree. A leaf that grows past capacity is cut
//! in half along the longest axis of its cell; each triangle goes to the
//! side holding the center of its bounding box.

use std::any::Any;

use crate::collision::primitives::{Triangle, AABB};
use crate::config::IndexKind;
use crate::error::IntersectError;
use crate::foundation::logging::debug;
use crate::spatial::octree::OctreeConfig;
use crate::spatial::pair::{self, IndexPairHits};
use crate::spatial::spatial_query::{self, IndexNode, SpatialIndex};

/// Build parameters; shared with the octree
pub type KdTreeConfig = OctreeConfig;

/// Axis-aligned splitting plane of an interior node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdSplit {
    /// 0 = X, 1 = Y, 2 = Z
    pub axis: usize,
    /// Coordinate of the plane along `axis`
    pub value: f64,
}

/// Single node of the KD-tree
#[derive(Debug, Clone)]
pub struct KdNode {
    /// Cell of this node
    pub bounds: AABB,
    /// Cell grown to cover every triangle stored at or below this node
    pub loose_bounds: AABB,
    /// Leaf payload; always empty on interior nodes
    pub triangles: Vec<Triangle>,
    /// Splitting plane, set on interior nodes
    pub split: Option<KdSplit>,
    /// Lower and upper half, None if this is a leaf
    pub children: Option<Box<[KdNode; 2]>>,
    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl KdNode {
    fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            loose_bounds: bounds,
            triangles: Vec::new(),
            split: None,
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn insert(&mut self, triangle: Triangle, config: &KdTreeConfig, split_count: &mut usize) {
        self.loose_bounds = self.loose_bounds.union(&triangle.bounds());

        if let (Some(split), Some(children)) = (self.split, self.children.as_mut()) {
            let side = usize::from(triangle.bounds().center()[split.axis] >= split.value);
            children[side].insert(triangle, config, split_count);
            return;
        }

        self.triangles.push(triangle);
        if self.triangles.len() > config.max_triangles_per_node && self.depth < config.max_depth {
            self.split_leaf();
            *split_count += 1;
        }
    }

    fn split_leaf(&mut self) {
        let axis = self.bounds.longest_axis();
        let value = (self.bounds.min[axis] + self.bounds.max[axis]) * 0.5;

        let mut lower_bounds = self.bounds;
        lower_bounds.max[axis] = value;
        let mut upper_bounds = self.bounds;
        upper_bounds.min[axis] = value;

        let mut children = [
            KdNode::new(lower_bounds, self.depth + 1),
            KdNode::new(upper_bounds, self.depth + 1),
        ];
        for triangle in self.triangles.drain(..) {
            let side = usize::from(triangle.bounds().center()[axis] >= value);
            let child = &mut children[side];
            child.loose_bounds = child.loose_bounds.union(&triangle.bounds());
            child.triangles.push(triangle);
        }

        self.split = Some(KdSplit { axis, value });
        self.children = Some(Box::new(children));
    }

    fn count_triangles(&self) -> usize {
        self.triangles.len() + self.children().iter().map(KdNode::count_triangles).sum::<usize>()
    }
}

impl IndexNode for KdNode {
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

/// KD-tree spatial index
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    root: Option<KdNode>,
    config: KdTreeConfig,
    split_count: usize,
}

impl KdTree {
    /// Create an empty KD-tree
    pub fn new(config: KdTreeConfig) -> Self {
        Self {
            root: None,
            config,
            split_count: 0,
        }
    }

    /// Discard the current tree and insert `triangles` in order
    pub fn build(&mut self, triangles: Vec<Triangle>, root_bounds: AABB) {
        self.clear();
        if triangles.is_empty() {
            debug!("KD-tree build skipped: no triangles");
            return;
        }

        let input_count = triangles.len();
        let mut root = KdNode::new(root_bounds, 0);
        for triangle in triangles {
            root.insert(triangle, &self.config, &mut self.split_count);
        }

        debug!("Built KD-tree: {} triangles, {} splits", input_count, self.split_count);
        self.root = Some(root);
    }

    /// Root node, if built
    pub fn root(&self) -> Option<&KdNode> {
        self.root.as_ref()
    }

    /// Number of leaf splits performed by the last build
    pub fn split_count(&self) -> usize {
        self.split_count
    }

    /// Clear the tree
    pub fn clear(&mut self) {
        self.root = None;
        self.split_count = 0;
    }
}

impl SpatialIndex for KdTree {
    fn kind(&self) -> IndexKind {
        IndexKind::KdTree
    }

    fn build(&mut self, triangles: Vec<Triangle>, root_bounds: AABB) {
        KdTree::build(self, triangles, root_bounds);
    }

    fn clear(&mut self) {
        KdTree::clear(self);
    }

    fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn triangle_count(&self) -> usize {
        self.root.as_ref().map_or(0, KdNode::count_triangles)
    }

    fn query_triangle(&self, incoming: &Triangle) -> Vec<Triangle> {
        spatial_query::query_triangle(self.root.as_ref(), incoming)
    }

    fn intersect_index(&self, other: &dyn SpatialIndex) -> Result<IndexPairHits, IntersectError> {
        let other_tree = other
            .as_any()
            .downcast_ref::<KdTree>()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn tri_at(id: usize, p: Vec3) -> Triangle {
        Triangle::new(id, 0, p, p + Vec3::new(0.1, 0.0, 0.0), p + Vec3::new(0.0, 0.1, 0.0))
    }

    #[test]
    fn test_splits_longest_axis_at_midpoint() {
        let bounds = AABB::new(Vec3::zeros(), Vec3::new(8.0, 2.0, 2.0));
        let mut tree = KdTree::new(KdTreeConfig {
            max_triangles_per_node: 2,
            max_depth: 32,
        });
        tree.build(
            vec![
                tri_at(0, Vec3::new(1.0, 1.0, 1.0)),
                tri_at(1, Vec3::new(2.0, 1.0, 1.0)),
                tri_at(2, Vec3::new(6.0, 1.0, 1.0)),
            ],
            bounds,
        );

        let root = tree.root().unwrap();
        assert_eq!(root.split, Some(KdSplit { axis: 0, value: 4.0 }));
        let children = root.children.as_ref().unwrap();
        assert_eq!(children[0].triangles.len(), 2);
        assert_eq!(children[1].triangles.len(), 1);
        assert_eq!(children[1].bounds.min.x, 4.0);
        assert_eq!(tree.split_count(), 1);
    }

    #[test]
    fn test_triangles_outside_cell_are_kept() {
        let bounds = AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let mut tree = KdTree::new(KdTreeConfig::default());
        let far = tri_at(0, Vec3::new(5.0, 5.0, 5.0));
        tree.build(vec![far], bounds);

        assert_eq!(SpatialIndex::triangle_count(&tree), 1);
        assert_eq!(SpatialIndex::query_triangle(&tree, &far).len(), 1);
    }

    #[test]
    fn test_depth_limit_stops_splitting() {
        let bounds = AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let mut tree = KdTree::new(KdTreeConfig {
            max_triangles_per_node: 1,
            max_depth: 3,
        });
        let triangles = (0..20).map(|i| tri_at(i, Vec3::new(0.2, 0.2, 0.2))).collect();
        tree.build(triangles, bounds);

        assert!(tree.split_count() <= 3);
        assert_eq!(SpatialIndex::triangle_count(&tree), 20);
    }

    #[test]
    fn test_mixed_kind_pairing_rejected() {
        let bounds = AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let mut kd_tree = KdTree::new(KdTreeConfig::default());
        kd_tree.build(vec![tri_at(0, Vec3::new(0.5, 0.5, 0.5))], bounds);
        let octree = crate::spatial::octree::Octree::new(OctreeConfig::default());

        let err = kd_tree.intersect_index(&octree).unwrap_err();
        assert!(matches!(
            err,
            IntersectError::UnsupportedIndexPairing {
                left: IndexKind::KdTree,
                right: IndexKind::Octree,
            }
        ));
    }
}
