//! Index-vs-index intersection
//!
//! Walks two trees in lockstep, keeping only node pairs whose bounds
//! overlap, and runs the exact triangle test on the surviving leaf pairs.

use crate::collision::predicates::{boxes_overlap, triangles_intersect};
use crate::collision::primitives::{Triangle, AABB};
use crate::foundation::logging::debug;
use crate::spatial::spatial_query::IndexNode;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Intersecting triangles of both sides of a comparison
///
/// Entry `i` of `a` intersects entry `i` of `b`. A triangle appears once per
/// partner it hits, and again for every leaf it was duplicated into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPairHits {
    /// Triangles of the first index
    pub a: Vec<Triangle>,
    /// Triangles of the second index
    pub b: Vec<Triangle>,
}

impl IndexPairHits {
    /// Whether no intersections were found
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Number of intersecting triangle pairs
    pub fn len(&self) -> usize {
        self.a.len()
    }

    fn append(&mut self, mut other: IndexPairHits) {
        self.a.append(&mut other.a);
        self.b.append(&mut other.b);
    }
}

/// A node as seen by the lockstep walk
///
/// Triangles kept on an interior node are exposed as an extra leaf-like
/// child so the walk never skips them.
enum Visit<'a, N> {
    Node(&'a N),
    Overflow(&'a N),
}

impl<N> Clone for Visit<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for Visit<'_, N> {}

impl<'a, N: IndexNode> Visit<'a, N> {
    fn bounds(&self) -> &'a AABB {
        match *self {
            Visit::Node(node) | Visit::Overflow(node) => node.bounds(),
        }
    }

    fn is_leaf(&self) -> bool {
        match *self {
            Visit::Node(node) => node.is_leaf(),
            Visit::Overflow(_) => true,
        }
    }

    fn triangles(&self) -> &'a [Triangle] {
        match *self {
            Visit::Node(node) | Visit::Overflow(node) => node.triangles(),
        }
    }

    fn expand(&self) -> Vec<Visit<'a, N>> {
        let Visit::Node(node) = *self else {
            return Vec::new();
        };
        let mut visits: Vec<_> = node.children().iter().map(Visit::Node).collect();
        if !node.triangles().is_empty() {
            visits.push(Visit::Overflow(node));
        }
        visits
    }
}

type LeafPair<'a> = (&'a [Triangle], &'a [Triangle]);

fn collect_leaf_pairs<'a, A, B>(a: Visit<'a, A>, b: Visit<'a, B>, pairs: &mut Vec<LeafPair<'a>>)
where
    A: IndexNode,
    B: IndexNode,
{
    if !boxes_overlap(a.bounds(), b.bounds()) {
        return;
    }

    match (a.is_leaf(), b.is_leaf()) {
        (true, true) => {
            let (ta, tb) = (a.triangles(), b.triangles());
            if !ta.is_empty() && !tb.is_empty() {
                pairs.push((ta, tb));
            }
        }
        (true, false) => {
            for child in b.expand() {
                collect_leaf_pairs(a, child, pairs);
            }
        }
        (false, true) => {
            for child in a.expand() {
                collect_leaf_pairs(child, b, pairs);
            }
        }
        (false, false) => {
            let children_b = b.expand();
            for child_a in a.expand() {
                for &child_b in &children_b {
                    collect_leaf_pairs(child_a, child_b, pairs);
                }
            }
        }
    }
}

fn check_leaf_pair((ta, tb): &LeafPair<'_>) -> IndexPairHits {
    let mut hits = IndexPairHits::default();
    for tri_a in ta.iter() {
        for tri_b in tb.iter() {
            if triangles_intersect(tri_a, tri_b) {
                hits.a.push(*tri_a);
                hits.b.push(*tri_b);
            }
        }
    }
    hits
}

/// Intersect two trees given by their roots
///
/// Either side missing yields an empty result. Leaf pairs are tested in the
/// order the walk finds them, so the output order is deterministic and does
/// not depend on the `parallel` feature.
pub fn intersect_nodes<A, B>(root_a: Option<&A>, root_b: Option<&B>) -> IndexPairHits
where
    A: IndexNode + Sync,
    B: IndexNode + Sync,
{
    let (Some(root_a), Some(root_b)) = (root_a, root_b) else {
        return IndexPairHits::default();
    };

    let mut pairs = Vec::new();
    collect_leaf_pairs(Visit::Node(root_a), Visit::Node(root_b), &mut pairs);

    #[cfg(feature = "parallel")]
    let per_pair: Vec<IndexPairHits> = pairs.par_iter().map(check_leaf_pair).collect();

    #[cfg(not(feature = "parallel"))]
    let per_pair: Vec<IndexPairHits> = pairs.iter().map(check_leaf_pair).collect();

    let mut hits = IndexPairHits::default();
    for partial in per_pair {
        hits.append(partial);
    }

    debug!("Compared {} leaf pairs, {} intersecting triangle pairs", pairs.len(), hits.len());
    hits
}
