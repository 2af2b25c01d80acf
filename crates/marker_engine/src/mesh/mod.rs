//! Polygon meshes and triangle snapshots
//!
//! A [`Mesh`] is the host-side surface: shared vertex positions plus polygons
//! that index into them. Polygon ids are their position in the polygon list
//! and stay stable for the lifetime of the mesh. [`Mesh::snapshot`] fans every
//! polygon into triangles expressed in a shared comparison space; the
//! resulting [`Triangle`] values own their coordinates and stay valid after
//! the mesh is edited.

use std::collections::BTreeSet;

use crate::collision::primitives::{Triangle, AABB};
use crate::error::IntersectError;
use crate::foundation::checksum::GeometryChecksum;
use crate::foundation::logging::warn;
use crate::foundation::math::{normal_matrix, transform_point, Mat3, Mat4, Vec3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Polygonal surface with stable face ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    polygons: Vec<Vec<u32>>,
}

/// Triangles extracted from one mesh under one transform
#[derive(Debug, Default)]
pub struct MeshSnapshot {
    /// Fan triangles of every valid polygon, in polygon order
    pub triangles: Vec<Triangle>,
    /// Bounds of the transformed triangles, `None` when there are none
    pub bounds: Option<AABB>,
    /// Polygons that were skipped
    pub diagnostics: Vec<IntersectError>,
}

impl Mesh {
    /// Create a mesh from vertex positions and polygon vertex lists
    pub fn new(positions: Vec<Vec3>, polygons: Vec<Vec<u32>>) -> Self {
        Self { positions, polygons }
    }

    /// Axis-aligned cube with outward facing quads.
    ///
    /// Face ids: 0 = +X, 1 = -X, 2 = +Y, 3 = -Y, 4 = +Z, 5 = -Z.
    pub fn cube(center: Vec3, size: f64) -> Self {
        let half = size * 0.5;
        let positions = (0..8u32)
            .map(|i| {
                let sign = |bit: u32| if i & bit != 0 { half } else { -half };
                center + Vec3::new(sign(1), sign(2), sign(4))
            })
            .collect();
        let polygons = vec![
            vec![1, 3, 7, 5],
            vec![0, 4, 6, 2],
            vec![2, 6, 7, 3],
            vec![0, 1, 5, 4],
            vec![4, 5, 7, 6],
            vec![0, 2, 3, 1],
        ];
        Self { positions, polygons }
    }

    /// Vertex positions in object space
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Mutable vertex positions, for deforming the surface in place
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Polygon vertex lists, indexed by face id
    pub fn polygons(&self) -> &[Vec<u32>] {
        &self.polygons
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of polygons; valid face ids are `0..polygon_count()`
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Fan triangles of one face, transformed by `matrix`.
    ///
    /// Every triangle carries the face's unit normal in the same space.
    pub fn face_triangles(&self, face_id: usize, matrix: &Mat4) -> Result<Vec<Triangle>, IntersectError> {
        self.fan(face_id, matrix, &normal_matrix(matrix))
    }

    fn fan(&self, face_id: usize, matrix: &Mat4, normals: &Mat3) -> Result<Vec<Triangle>, IntersectError> {
        let polygon = self.polygons.get(face_id).ok_or_else(|| {
            IntersectError::InvalidInput(format!(
                "face {face_id} out of range for mesh with {} polygons",
                self.polygons.len()
            ))
        })?;

        if polygon.len() < 3 {
            return Err(IntersectError::InvalidInput(format!(
                "face {face_id} has {} vertices, at least 3 required",
                polygon.len()
            )));
        }

        let points = polygon
            .iter()
            .map(|&index| {
                self.positions.get(index as usize).copied().ok_or_else(|| {
                    IntersectError::InvalidInput(format!(
                        "face {face_id} references vertex {index}, mesh has {}",
                        self.positions.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let normal = normals * newell_normal(&points);
        let normal = normal.try_normalize(f64::EPSILON);

        let world: Vec<Vec3> = points.iter().map(|p| transform_point(matrix, p)).collect();
        let triangles = (1..world.len() - 1)
            .map(|i| {
                let tri = Triangle::new(face_id, i - 1, world[0], world[i], world[i + 1]);
                match normal {
                    Some(n) => tri.with_face_normal(n),
                    None => tri,
                }
            })
            .collect();

        Ok(triangles)
    }

    /// Extract every polygon as triangles in the space given by `matrix`.
    ///
    /// Invalid polygons are skipped, logged and reported in
    /// [`MeshSnapshot::diagnostics`]; extraction always continues.
    pub fn snapshot(&self, matrix: &Mat4) -> MeshSnapshot {
        let normals = normal_matrix(matrix);

        #[cfg(feature = "parallel")]
        let per_face: Vec<_> = (0..self.polygons.len())
            .into_par_iter()
            .map(|face_id| self.fan(face_id, matrix, &normals))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let per_face: Vec<_> = (0..self.polygons.len())
            .map(|face_id| self.fan(face_id, matrix, &normals))
            .collect();

        let mut snapshot = MeshSnapshot::default();
        for result in per_face {
            match result {
                Ok(triangles) => snapshot.triangles.extend(triangles),
                Err(err) => {
                    warn!("Skipping polygon: {err}");
                    snapshot.diagnostics.push(err);
                }
            }
        }

        snapshot.bounds = AABB::from_points(snapshot.triangles.iter().flat_map(Triangle::vertices));
        snapshot
    }

    /// Geometry fingerprint of topology, positions and `matrix`.
    ///
    /// Feeds every vertex index, the sorted indices of the vertices it shares
    /// an edge with and its object-space position, then every polygon's face
    /// id, vertex count and vertex indices, then the matrix entries in row
    /// order. Any edit to the mesh, its face ids or its transform changes the
    /// value with overwhelming probability.
    pub fn fingerprint(&self, matrix: &Mat4) -> u32 {
        let mut neighbours = vec![BTreeSet::new(); self.positions.len()];
        for polygon in &self.polygons {
            for (i, &a) in polygon.iter().enumerate() {
                let b = polygon[(i + 1) % polygon.len()];
                if a == b {
                    continue;
                }
                if let Some(set) = neighbours.get_mut(a as usize) {
                    set.insert(b);
                }
                if let Some(set) = neighbours.get_mut(b as usize) {
                    set.insert(a);
                }
            }
        }

        let mut checksum = GeometryChecksum::new();
        for (index, (position, connected)) in self.positions.iter().zip(&neighbours).enumerate() {
            checksum.put_u32(index as u32);
            for &other in connected {
                checksum.put_u32(other);
            }
            checksum.put_f64(position.x);
            checksum.put_f64(position.y);
            checksum.put_f64(position.z);
        }

        // Face ids are list positions, so reordering polygons must show up
        for (face_id, polygon) in self.polygons.iter().enumerate() {
            checksum.put_u32(face_id as u32);
            checksum.put_u32(polygon.len() as u32);
            for &index in polygon {
                checksum.put_u32(index);
            }
        }

        for row in 0..4 {
            for col in 0..4 {
                checksum.put_f64(matrix[(row, col)]);
            }
        }

        checksum.finish()
    }
}

/// Area-weighted polygon normal (Newell's method), not normalized
fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_normals_point_outward() {
        let cube = Mesh::cube(Vec3::zeros(), 2.0);
        let expected = [
            Vec3::x(),
            -Vec3::x(),
            Vec3::y(),
            -Vec3::y(),
            Vec3::z(),
            -Vec3::z(),
        ];
        for (face_id, normal) in expected.iter().enumerate() {
            let triangles = cube.face_triangles(face_id, &Mat4::identity()).unwrap();
            assert_eq!(triangles.len(), 2);
            for tri in triangles {
                assert_eq!(tri.face_id, face_id);
                assert_relative_eq!(tri.face_normal.unwrap(), *normal, epsilon = 1e-12);
                assert_relative_eq!(tri.plane_normal().normalize(), *normal, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_fan_triangulation() {
        let mesh = Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(1.0, 2.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3, 4]],
        );
        let triangles = mesh.face_triangles(0, &Mat4::identity()).unwrap();
        assert_eq!(triangles.len(), 3);
        for (i, tri) in triangles.iter().enumerate() {
            assert_eq!(tri.sub_index, i);
            assert_eq!(tri.v0, Vec3::zeros());
        }
        assert_eq!(triangles[2].v2, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_snapshot_applies_transform() {
        let cube = Mesh::cube(Vec3::zeros(), 1.0);
        let matrix = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)).to_matrix();
        let snapshot = cube.snapshot(&matrix);

        assert_eq!(snapshot.triangles.len(), 12);
        assert!(snapshot.diagnostics.is_empty());
        let bounds = snapshot.bounds.unwrap();
        assert_relative_eq!(bounds.min, Vec3::new(9.5, -0.5, -0.5), epsilon = 1e-12);
        assert_relative_eq!(bounds.max, Vec3::new(10.5, 0.5, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_snapshot_skips_invalid_polygons() {
        let mesh = Mesh::new(
            vec![Vec3::zeros(), Vec3::x(), Vec3::y()],
            vec![vec![0, 1, 2], vec![0, 1], vec![0, 1, 9]],
        );
        let snapshot = mesh.snapshot(&Mat4::identity());
        assert_eq!(snapshot.triangles.len(), 1);
        assert_eq!(snapshot.diagnostics.len(), 2);
        assert!(snapshot
            .diagnostics
            .iter()
            .all(|err| matches!(err, IntersectError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        let snapshot = Mesh::default().snapshot(&Mat4::identity());
        assert!(snapshot.triangles.is_empty());
        assert!(snapshot.bounds.is_none());
    }

    #[test]
    fn test_face_out_of_range() {
        let cube = Mesh::cube(Vec3::zeros(), 1.0);
        assert!(matches!(
            cube.face_triangles(6, &Mat4::identity()),
            Err(IntersectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_fingerprint_tracks_edits() {
        let mut cube = Mesh::cube(Vec3::zeros(), 1.0);
        let identity = Mat4::identity();
        let original = cube.fingerprint(&identity);
        assert_eq!(original, cube.clone().fingerprint(&identity));

        let moved = Transform::from_translation(Vec3::new(0.0, 0.0, 0.25)).to_matrix();
        assert_ne!(original, cube.fingerprint(&moved));

        cube.positions_mut()[3].x += 1e-6;
        assert_ne!(original, cube.fingerprint(&identity));
    }

    #[test]
    fn test_fingerprint_tracks_topology() {
        let positions = vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::new(1.0, 1.0, 0.0)];
        let a = Mesh::new(positions.clone(), vec![vec![0, 1, 3], vec![0, 3, 2]]);
        let b = Mesh::new(positions, vec![vec![0, 1, 2], vec![1, 3, 2]]);
        assert_ne!(a.fingerprint(&Mat4::identity()), b.fingerprint(&Mat4::identity()));
    }

    #[test]
    fn test_fingerprint_tracks_polygon_order() {
        let cube = Mesh::cube(Vec3::zeros(), 1.0);
        let mut polygons = cube.polygons().to_vec();
        polygons.swap(0, 1);
        let reordered = Mesh::new(cube.positions().to_vec(), polygons);

        assert_ne!(cube.fingerprint(&Mat4::identity()), reordered.fingerprint(&Mat4::identity()));
    }

    #[test]
    fn test_fingerprint_tracks_polygon_rotation() {
        let cube = Mesh::cube(Vec3::zeros(), 1.0);
        let mut polygons = cube.polygons().to_vec();
        polygons[0].rotate_left(1);
        let rotated = Mesh::new(cube.positions().to_vec(), polygons);

        assert_ne!(cube.fingerprint(&Mat4::identity()), rotated.fingerprint(&Mat4::identity()));
    }

    /// Holds with and without the `parallel` feature
    #[test]
    fn test_snapshot_keeps_polygon_order() {
        let mut positions = Vec::new();
        let mut polygons = Vec::new();
        for i in 0..64u32 {
            let base = Vec3::new(f64::from(i), 0.0, 0.0);
            positions.extend([base, base + Vec3::x() * 0.5, base + Vec3::y(), base + Vec3::new(0.5, 1.0, 0.0)]);
            polygons.push(vec![i * 4, i * 4 + 1, i * 4 + 3, i * 4 + 2]);
        }
        polygons.insert(10, vec![0, 1]);
        let mesh = Mesh::new(positions, polygons);
        let matrix = Transform::from_translation(Vec3::new(0.0, 0.0, 2.0)).to_matrix();

        let snapshot = mesh.snapshot(&matrix);
        let sequential: Vec<Triangle> = (0..mesh.polygon_count())
            .filter_map(|face_id| mesh.face_triangles(face_id, &matrix).ok())
            .flatten()
            .collect();

        assert_eq!(snapshot.triangles, sequential);
        assert_eq!(snapshot.triangles.len(), 128);
        assert_eq!(snapshot.diagnostics.len(), 1);
    }
}
