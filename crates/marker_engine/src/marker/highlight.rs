//! Face highlight geometry
//!
//! Turns the face ids reported by the marker into triangles a renderer can
//! draw on top of the surface. Each triangle is pushed a small distance along
//! its face normal to keep it from z-fighting with the mesh itself.

use std::collections::BTreeSet;

use crate::collision::primitives::Triangle;
use crate::error::IntersectError;
use crate::foundation::logging::warn;
use crate::foundation::math::{Mat4, Vec3};
use crate::mesh::Mesh;

/// Offset triangles of one highlighted face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceHighlight {
    /// Face the triangles belong to
    pub face_id: usize,
    /// Fan triangles of the face, displaced along the face normal
    pub triangles: Vec<Triangle>,
}

/// Build highlight geometry for `face_ids` on `mesh`.
///
/// Face ids are de-duplicated and emitted in ascending order. Ids outside
/// the mesh, or faces that cannot be triangulated, are skipped and returned
/// as diagnostics.
pub fn face_highlights<I>(
    mesh: &Mesh,
    transform: &Mat4,
    face_ids: I,
    offset: f64,
) -> (Vec<FaceHighlight>, Vec<IntersectError>)
where
    I: IntoIterator<Item = usize>,
{
    let face_ids: BTreeSet<usize> = face_ids.into_iter().collect();
    let mut highlights = Vec::with_capacity(face_ids.len());
    let mut diagnostics = Vec::new();

    for face_id in face_ids {
        match mesh.face_triangles(face_id, transform) {
            Ok(triangles) => highlights.push(FaceHighlight {
                face_id,
                triangles: triangles.into_iter().map(|tri| displaced(tri, offset)).collect(),
            }),
            Err(err) => {
                warn!("Skipping highlight: {err}");
                diagnostics.push(err);
            }
        }
    }

    (highlights, diagnostics)
}

fn displaced(tri: Triangle, offset: f64) -> Triangle {
    let shift = tri.face_normal.map_or_else(Vec3::zeros, |n| n * offset);
    Triangle {
        v0: tri.v0 + shift,
        v1: tri.v1 + shift,
        v2: tri.v2 + shift,
        ..tri
    }
}
