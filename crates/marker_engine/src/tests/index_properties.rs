//! Randomized checks of the index invariants against brute force
//!
//! Triangle soups are generated from a fixed seed. Every query and pair
//! comparison is checked against an all-pairs scan with the same exact
//! predicate, for both index layouts and for deliberately undersized root
//! boxes that force fallback placement and interior overflow.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collision::predicates::triangles_intersect;
use crate::collision::primitives::{Triangle, AABB};
use crate::config::{IndexConfig, IndexKind};
use crate::foundation::math::Vec3;
use crate::spatial::octree::OctreeNode;
use crate::spatial::spatial_query::{self, IndexNode, SpatialIndex};
use crate::spatial::Octree;

const KINDS: [IndexKind; 2] = [IndexKind::Octree, IndexKind::KdTree];

fn random_soup(rng: &mut StdRng, count: usize, extent: f64, size: f64) -> Vec<Triangle> {
    (0..count)
        .map(|id| {
            let center = Vec3::new(
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
            );
            let mut corner = || {
                center
                    + Vec3::new(
                        rng.gen_range(-size..size),
                        rng.gen_range(-size..size),
                        rng.gen_range(-size..size),
                    )
            };
            Triangle::new(id, 0, corner(), corner(), corner())
        })
        .collect()
}

fn tight_bounds(triangles: &[Triangle]) -> AABB {
    AABB::from_points(triangles.iter().flat_map(Triangle::vertices))
        .unwrap_or_else(|| AABB::new(Vec3::zeros(), Vec3::zeros()))
}

fn build(kind: IndexKind, triangles: &[Triangle], bounds: AABB) -> Box<dyn SpatialIndex> {
    let mut index = spatial_query::create(&IndexConfig {
        kind,
        max_triangles_per_node: 4,
        max_depth: 32,
    });
    index.build(triangles.to_vec(), bounds);
    index
}

fn face_ids(triangles: &[Triangle]) -> BTreeSet<usize> {
    triangles.iter().map(|tri| tri.face_id).collect()
}

fn brute_force_query(triangles: &[Triangle], probe: &Triangle) -> BTreeSet<usize> {
    triangles
        .iter()
        .filter(|tri| triangles_intersect(tri, probe))
        .map(|tri| tri.face_id)
        .collect()
}

fn brute_force_pairs(a: &[Triangle], b: &[Triangle]) -> BTreeSet<(usize, usize)> {
    let mut pairs = BTreeSet::new();
    for ta in a {
        for tb in b {
            if triangles_intersect(ta, tb) {
                pairs.insert((ta.face_id, tb.face_id));
            }
        }
    }
    pairs
}

/// Every triangle stored at or below `node` lies inside its pruning bounds
fn assert_contained<N: IndexNode>(node: &N) -> Vec<Triangle> {
    let mut below: Vec<Triangle> = node.triangles().to_vec();
    for child in node.children() {
        below.extend(assert_contained(child));
    }
    for tri in &below {
        assert!(node.bounds().contains_box(&tri.bounds()));
    }
    below
}

/// Children of every octree node bisect their parent's cell
fn assert_cells_nested(node: &OctreeNode) {
    if let Some(children) = &node.children {
        for child in children.iter() {
            assert!(node.bounds.contains_box(&child.bounds));
            assert_eq!(child.depth, node.depth + 1);
            assert_cells_nested(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let stored = random_soup(&mut rng, 300, 10.0, 1.0);
        let probes = random_soup(&mut rng, 60, 10.0, 1.5);

        for kind in KINDS {
            let index = build(kind, &stored, tight_bounds(&stored));
            let mut total_hits = 0;
            for probe in &probes {
                let hits = index.query_triangle(probe);
                // Soundness: only real intersections come back
                assert!(hits.iter().all(|tri| triangles_intersect(tri, probe)));
                // Completeness: nothing is missed
                assert_eq!(face_ids(&hits), brute_force_query(&stored, probe), "{kind}");
                total_hits += hits.len();
            }
            assert!(total_hits > 0, "random soup should produce some hits");
        }
    }

    #[test]
    fn test_undersized_root_box_stays_complete() {
        let mut rng = StdRng::seed_from_u64(42);
        let stored = random_soup(&mut rng, 200, 10.0, 1.0);
        let probes = random_soup(&mut rng, 40, 10.0, 1.5);
        let small = AABB::new(Vec3::new(3.0, 3.0, 3.0), Vec3::new(6.0, 6.0, 6.0));

        for kind in KINDS {
            let index = build(kind, &stored, small);
            for probe in &probes {
                assert_eq!(
                    face_ids(&index.query_triangle(probe)),
                    brute_force_query(&stored, probe),
                    "{kind}"
                );
            }
        }
    }

    #[test]
    fn test_pair_comparison_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_soup(&mut rng, 200, 8.0, 1.0);
        let b = random_soup(&mut rng, 200, 8.0, 1.0);
        let expected = brute_force_pairs(&a, &b);
        assert!(!expected.is_empty());

        for kind in KINDS {
            let index_a = build(kind, &a, tight_bounds(&a));
            let index_b = build(kind, &b, tight_bounds(&b));
            let hits = index_a.intersect_index(index_b.as_ref()).unwrap();

            assert_eq!(hits.a.len(), hits.b.len());
            let found: BTreeSet<(usize, usize)> = hits
                .a
                .iter()
                .zip(&hits.b)
                .map(|(ta, tb)| (ta.face_id, tb.face_id))
                .collect();
            assert_eq!(found, expected, "{kind}");
        }
    }

    #[test]
    fn test_pair_comparison_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(99);
        let a = random_soup(&mut rng, 150, 6.0, 1.0);
        let b = random_soup(&mut rng, 150, 6.0, 1.0);

        for kind in KINDS {
            let index_a = build(kind, &a, tight_bounds(&a));
            let index_b = build(kind, &b, tight_bounds(&b));
            let forward = index_a.intersect_index(index_b.as_ref()).unwrap();
            let backward = index_b.intersect_index(index_a.as_ref()).unwrap();

            assert_eq!(face_ids(&forward.a), face_ids(&backward.b), "{kind}");
            assert_eq!(face_ids(&forward.b), face_ids(&backward.a), "{kind}");
        }
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(3);
        let stored = random_soup(&mut rng, 120, 5.0, 1.0);
        let probes = random_soup(&mut rng, 20, 5.0, 1.0);

        for kind in KINDS {
            let mut index = build(kind, &stored, tight_bounds(&stored));
            let first: Vec<BTreeSet<usize>> =
                probes.iter().map(|p| face_ids(&index.query_triangle(p))).collect();
            let count = index.triangle_count();

            index.build(stored.clone(), tight_bounds(&stored));
            let second: Vec<BTreeSet<usize>> =
                probes.iter().map(|p| face_ids(&index.query_triangle(p))).collect();

            assert_eq!(first, second, "{kind}");
            assert_eq!(count, index.triangle_count(), "{kind}");
        }
    }

    #[test]
    fn test_containment_invariant() {
        let mut rng = StdRng::seed_from_u64(11);
        let stored = random_soup(&mut rng, 250, 10.0, 1.5);
        let small = AABB::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(7.0, 7.0, 7.0));

        for bounds in [tight_bounds(&stored), small] {
            let octree_index = build(IndexKind::Octree, &stored, bounds);
            let octree = octree_index.as_any().downcast_ref::<Octree>().unwrap();
            let root = octree.root().unwrap();
            let below = assert_contained(root);
            assert!(below.len() >= stored.len());
            assert_eq!(face_ids(&below).len(), stored.len());
            assert_cells_nested(root);

            let kd_index = build(IndexKind::KdTree, &stored, bounds);
            let kd_tree = kd_index.as_any().downcast_ref::<crate::spatial::KdTree>().unwrap();
            let below = assert_contained(kd_tree.root().unwrap());
            assert_eq!(below.len(), stored.len());
        }
    }

    #[test]
    fn test_mixed_kinds_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let stored = random_soup(&mut rng, 10, 2.0, 0.5);
        let octree = build(IndexKind::Octree, &stored, tight_bounds(&stored));
        let kd_tree = build(IndexKind::KdTree, &stored, tight_bounds(&stored));

        assert!(octree.intersect_index(kd_tree.as_ref()).is_err());
        assert!(kd_tree.intersect_index(octree.as_ref()).is_err());
    }
}
