//! Geometry primitives and exact intersection predicates

pub mod primitives;
pub mod predicates;

pub use primitives::{Triangle, AABB};
pub use predicates::{
    box_contains_all_vertices, box_contains_any_vertex, box_intersects_triangle, boxes_overlap,
    triangles_intersect,
};
