//! Primitive geometric value types
//!
//! Provides the triangle and axis-aligned box types shared by the predicates,
//! the spatial indices and the marker.

use crate::foundation::math::Vec3;

/// Axis-Aligned Bounding Box
///
/// Bounds are inclusive. Zero-volume boxes are legal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "AABB min must be <= max on all axes"
        );
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |aabb, p| aabb.expanded_to(&p)))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the size of the AABB (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB fully contains another AABB
    pub fn contains_box(&self, other: &AABB) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Box grown to include `point`
    #[must_use]
    pub fn expanded_to(&self, point: &Vec3) -> Self {
        Self {
            min: self.min.inf(point),
            max: self.max.sup(point),
        }
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &AABB) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// The eight octants of this box, bisected at its center.
    ///
    /// The order is fixed; octree child slots are indexed by it.
    pub fn octants(&self) -> [AABB; 8] {
        let c = self.center();
        let min = self.min;
        let max = self.max;
        [
            AABB { min, max: c },
            AABB { min: Vec3::new(c.x, min.y, min.z), max: Vec3::new(max.x, c.y, c.z) },
            AABB { min: Vec3::new(c.x, min.y, c.z), max: Vec3::new(max.x, c.y, max.z) },
            AABB { min: Vec3::new(min.x, min.y, c.z), max: Vec3::new(c.x, c.y, max.z) },
            AABB { min: Vec3::new(min.x, c.y, min.z), max: Vec3::new(c.x, max.y, c.z) },
            AABB { min: Vec3::new(c.x, c.y, min.z), max: Vec3::new(max.x, max.y, c.z) },
            AABB { min: c, max },
            AABB { min: Vec3::new(min.x, c.y, c.z), max: Vec3::new(c.x, max.y, max.z) },
        ]
    }

    /// Index of the longest axis (0 = X, 1 = Y, 2 = Z); ties favour the later axis
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }
}

/// A triangle snapshot taken from one face of a mesh
///
/// Vertices are already expressed in the shared comparison space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Id of the polygon this triangle was cut from
    pub face_id: usize,
    /// Index of this triangle within its polygon's fan
    pub sub_index: usize,
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
    /// Unit normal of the owning face, when known
    pub face_normal: Option<Vec3>,
}

impl Triangle {
    /// Creates a new triangle without a face normal
    pub fn new(face_id: usize, sub_index: usize, v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self {
            face_id,
            sub_index,
            v0,
            v1,
            v2,
            face_normal: None,
        }
    }

    /// Attach the owning face's normal
    #[must_use]
    pub fn with_face_normal(mut self, normal: Vec3) -> Self {
        self.face_normal = Some(normal);
        self
    }

    /// The three vertices in winding order
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// The three edges `v1 - v0`, `v2 - v1`, `v0 - v2`
    pub fn edges(&self) -> [Vec3; 3] {
        [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2]
    }

    /// Non-normalized plane normal (right-hand rule); zero for degenerate triangles
    pub fn plane_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Surface area
    pub fn area(&self) -> f64 {
        self.plane_normal().norm() * 0.5
    }

    /// Whether the triangle has (numerically) zero area
    pub fn is_degenerate(&self) -> bool {
        let e0 = self.v1 - self.v0;
        let e1 = self.v2 - self.v0;
        let n = e0.cross(&e1);
        n.norm_squared() <= DEGENERATE_TOLERANCE * e0.norm_squared() * e1.norm_squared()
    }

    /// Tight bounding box around the three vertices
    pub fn bounds(&self) -> AABB {
        AABB {
            min: self.v0.inf(&self.v1).inf(&self.v2),
            max: self.v0.sup(&self.v1).sup(&self.v2),
        }
    }
}

/// Squared sine of the smallest angle accepted between two triangle edges
const DEGENERATE_TOLERANCE: f64 = 1e-20;
