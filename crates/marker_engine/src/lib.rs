//! # Marker Engine
//!
//! Finds which triangles of two independently deforming meshes overlap in
//! 3D space, so a host application can highlight the intersecting regions.
//!
//! ## Features
//!
//! - **Spatial indices**: octree and KD-tree over each mesh's triangles
//! - **Exact predicates**: separating-axis box/triangle and triangle/triangle tests
//! - **Change detection**: BLAKE3 geometry fingerprints skip work on unchanged frames
//! - **Highlights**: offset face geometry ready for an overlay pass
//!
//! ## Quick Start
//!
//! ```rust
//! use marker_engine::prelude::*;
//!
//! fn main() -> Result<(), IntersectError> {
//!     let a = Mesh::cube(Vec3::zeros(), 1.0);
//!     let b = Mesh::cube(Vec3::zeros(), 1.0);
//!     let shifted = Transform::from_translation(Vec3::new(0.5, 0.0, 0.0)).to_matrix();
//!
//!     let mut marker = IntersectionMarker::new(MarkerConfig::default())?;
//!     let output = marker.evaluate(
//!         MarkerInput::new(&a, Mat4::identity()),
//!         MarkerInput::new(&b, shifted),
//!     )?;
//!
//!     assert!(output.face_ids_a().contains(&0));
//!     assert!(output.face_ids_b().contains(&1));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod collision;
pub mod mesh;
pub mod spatial;
pub mod marker;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::{IntersectError, Result};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        IntersectError,
        collision::{Triangle, AABB},
        config::{Config, ConfigError, IndexConfig, IndexKind, MarkerConfig},
        foundation::math::{Mat4, Transform, Vec3},
        marker::{FaceHighlight, Fingerprint, IntersectionMarker, MarkerInput, MarkerOutput},
        mesh::{Mesh, MeshSnapshot},
        spatial::{IndexPairHits, SpatialIndex},
    };
}
