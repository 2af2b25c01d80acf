//! Spatial partitioning data structures
//!
//! Provides the triangle indices built over each mesh and the
//! algorithms that query and compare them.

pub mod kd_tree;
pub mod octree;
pub mod pair;
pub mod spatial_query;

pub use kd_tree::{KdNode, KdTree, KdTreeConfig};
pub use octree::{Octree, OctreeConfig, OctreeNode, OctreeStats};
pub use pair::{intersect_nodes, IndexPairHits};
pub use spatial_query::{create, query_triangle, IndexNode, SpatialIndex};
