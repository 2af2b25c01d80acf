//! Intersection predicates between boxes and triangles
//!
//! All predicates are inclusive: touching counts as overlapping. The
//! separating axis tests normalize each candidate axis before comparing
//! projected intervals so a single tolerance works at any model scale.

use super::primitives::{Triangle, AABB};
use crate::foundation::math::Vec3;

/// Relative tolerance used to discard numerically parallel axes
const AXIS_EPSILON: f64 = 1e-12;

/// Tolerance on projected gaps, scaled by the size of the inputs
const GAP_EPSILON: f64 = 1e-9;

/// Inclusive overlap on all three axes
#[inline]
pub fn boxes_overlap(a: &AABB, b: &AABB) -> bool {
    a.intersects(b)
}

/// True when at least one vertex of `tri` lies inside `aabb` (boundary included)
pub fn box_contains_any_vertex(aabb: &AABB, tri: &Triangle) -> bool {
    tri.vertices().iter().any(|v| aabb.contains_point(v))
}

/// True when every vertex of `tri` lies inside `aabb` (boundary included)
pub fn box_contains_all_vertices(aabb: &AABB, tri: &Triangle) -> bool {
    tri.vertices().iter().all(|v| aabb.contains_point(v))
}

fn project(points: &[Vec3; 3], axis: &Vec3) -> (f64, f64) {
    let p0 = axis.dot(&points[0]);
    let p1 = axis.dot(&points[1]);
    let p2 = axis.dot(&points[2]);
    (p0.min(p1).min(p2), p0.max(p1).max(p2))
}

/// Exact box/triangle overlap test
///
/// Separating axis test over the three box axes, the nine cross products of
/// triangle edges with box axes and the triangle plane. A triangle that
/// crosses the box without any vertex inside it still overlaps. Degenerate
/// triangles and zero-volume boxes are handled without special cases.
pub fn box_intersects_triangle(aabb: &AABB, tri: &Triangle) -> bool {
    let center = aabb.center();
    let h = aabb.extents();
    let scale = h.amax().max(tri.bounds().size().amax()).max(1.0);
    let tolerance = GAP_EPSILON * scale;

    // Work in box-centered coordinates
    let v = [tri.v0 - center, tri.v1 - center, tri.v2 - center];

    // Box face normals, equivalent to a box/box test against the triangle bounds
    for axis in 0..3 {
        let lo = v[0][axis].min(v[1][axis]).min(v[2][axis]);
        let hi = v[0][axis].max(v[1][axis]).max(v[2][axis]);
        if lo > h[axis] + tolerance || hi < -h[axis] - tolerance {
            return false;
        }
    }

    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];
    let box_axes = [Vec3::x(), Vec3::y(), Vec3::z()];

    for edge in &edges {
        let edge_len = edge.norm();
        for box_axis in &box_axes {
            let axis = box_axis.cross(edge);
            let len = axis.norm();
            if len <= AXIS_EPSILON * edge_len {
                continue;
            }
            let axis = axis / len;
            let (lo, hi) = project(&v, &axis);
            let r = h.x * axis.x.abs() + h.y * axis.y.abs() + h.z * axis.z.abs();
            if lo > r + tolerance || hi < -r - tolerance {
                return false;
            }
        }
    }

    let normal = edges[0].cross(&edges[1]);
    let len = normal.norm();
    if len > AXIS_EPSILON * edges[0].norm() * edges[1].norm() {
        let normal = normal / len;
        let d = normal.dot(&v[0]);
        let r = h.x * normal.x.abs() + h.y * normal.y.abs() + h.z * normal.z.abs();
        if d.abs() > r + tolerance {
            return false;
        }
    }

    true
}

/// Exact triangle/triangle overlap test
///
/// Separating axis test over both face normals, the nine edge/edge cross
/// products and the six in-plane edge normals. The in-plane axes make the
/// test exact for coplanar pairs as well. Touching counts as intersecting.
/// A zero-area triangle on either side never intersects anything.
pub fn triangles_intersect(a: &Triangle, b: &Triangle) -> bool {
    if a.is_degenerate() || b.is_degenerate() {
        return false;
    }

    let pa = a.vertices();
    let pb = b.vertices();
    let scale = a.bounds().union(&b.bounds()).size().amax().max(1.0);
    let tolerance = GAP_EPSILON * scale;

    // Returns true when `axis` separates the two triangles
    let separates = |axis: Vec3, reference: f64| -> bool {
        let len = axis.norm();
        if len <= AXIS_EPSILON * reference {
            return false;
        }
        let axis = axis / len;
        let (min_a, max_a) = project(&pa, &axis);
        let (min_b, max_b) = project(&pb, &axis);
        max_a < min_b - tolerance || max_b < min_a - tolerance
    };

    let edges_a = a.edges();
    let edges_b = b.edges();
    let n1 = a.plane_normal();
    let n2 = b.plane_normal();

    if separates(n1, 0.0) || separates(n2, 0.0) {
        return false;
    }

    for ea in &edges_a {
        for eb in &edges_b {
            if separates(ea.cross(eb), ea.norm() * eb.norm()) {
                return false;
            }
        }
    }

    // In-plane edge normals; these only matter for (near) coplanar pairs
    let n1_len = n1.norm();
    for ea in &edges_a {
        if separates(n1.cross(ea), n1_len * ea.norm()) {
            return false;
        }
    }
    let n2_len = n2.norm();
    for eb in &edges_b {
        if separates(n2.cross(eb), n2_len * eb.norm()) {
            return false;
        }
    }

    true
}
