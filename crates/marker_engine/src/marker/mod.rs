//! Intersection marker
//!
//! Keeps one spatial index per mesh and re-runs the comparison only when
//! the geometry or the transform of either mesh changed since the previous
//! evaluation. Change detection uses the geometry fingerprint of each mesh.

pub mod highlight;

pub use highlight::{face_highlights, FaceHighlight};

use std::collections::BTreeSet;
use std::fmt;

use crate::collision::primitives::Triangle;
use crate::config::MarkerConfig;
use crate::error::{IntersectError, Result};
use crate::foundation::logging::{debug, info};
use crate::foundation::math::Mat4;
use crate::mesh::{Mesh, MeshSnapshot};
use crate::spatial::pair::IndexPairHits;
use crate::spatial::spatial_query::{self, SpatialIndex};

/// Combined geometry fingerprint of both meshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Combine the per-mesh checksums, `a` in the high half
    pub fn combine(a: u32, b: u32) -> Self {
        Self((u64::from(a) << 32) | u64::from(b))
    }

    /// The per-mesh checksums
    pub fn parts(self) -> (u32, u32) {
        ((self.0 >> 32) as u32, self.0 as u32)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One side of an evaluation
#[derive(Debug, Clone, Copy)]
pub struct MarkerInput<'a> {
    /// Surface to compare
    pub mesh: &'a Mesh,
    /// Object-to-comparison-space transform
    pub transform: Mat4,
    /// Hidden sides report no triangles
    pub visible: bool,
}

impl<'a> MarkerInput<'a> {
    /// Visible input
    pub fn new(mesh: &'a Mesh, transform: Mat4) -> Self {
        Self {
            mesh,
            transform,
            visible: true,
        }
    }

    /// Set visibility
    #[must_use]
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Result of one evaluation
#[derive(Debug, Default)]
pub struct MarkerOutput {
    /// Intersecting triangles of mesh A; empty when A is hidden
    pub triangles_a: Vec<Triangle>,
    /// Intersecting triangles of mesh B; empty when B is hidden
    pub triangles_b: Vec<Triangle>,
    /// Fingerprint the result belongs to; `None` when nothing was evaluated
    pub fingerprint: Option<Fingerprint>,
    /// Whether the indices were rebuilt for this call
    pub recomputed: bool,
    /// Polygons skipped while extracting triangles during this call
    pub diagnostics: Vec<IntersectError>,
}

impl MarkerOutput {
    /// Distinct face ids of mesh A, ascending
    pub fn face_ids_a(&self) -> BTreeSet<usize> {
        self.triangles_a.iter().map(|tri| tri.face_id).collect()
    }

    /// Distinct face ids of mesh B, ascending
    pub fn face_ids_b(&self) -> BTreeSet<usize> {
        self.triangles_b.iter().map(|tri| tri.face_id).collect()
    }

    /// Whether neither side reports an intersection
    pub fn is_empty(&self) -> bool {
        self.triangles_a.is_empty() && self.triangles_b.is_empty()
    }
}

/// Memoizing two-mesh intersection marker
pub struct IntersectionMarker {
    config: MarkerConfig,
    index_a: Box<dyn SpatialIndex>,
    index_b: Box<dyn SpatialIndex>,
    last_fingerprint: Option<Fingerprint>,
    cached: IndexPairHits,
    rebuild_count: usize,
}

impl fmt::Debug for IntersectionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntersectionMarker")
            .field("config", &self.config)
            .field("last_fingerprint", &self.last_fingerprint)
            .field("cached_pairs", &self.cached.len())
            .field("rebuild_count", &self.rebuild_count)
            .finish()
    }
}

impl IntersectionMarker {
    /// Create a marker with empty indices of the configured kind
    pub fn new(config: MarkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index_a: spatial_query::create(&config.index),
            index_b: spatial_query::create(&config.index),
            config,
            last_fingerprint: None,
            cached: IndexPairHits::default(),
            rebuild_count: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// Fingerprint of the last computed result
    pub fn last_fingerprint(&self) -> Option<Fingerprint> {
        self.last_fingerprint
    }

    /// How many times the indices were rebuilt
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    /// Index built over mesh A
    pub fn index_a(&self) -> &dyn SpatialIndex {
        self.index_a.as_ref()
    }

    /// Index built over mesh B
    pub fn index_b(&self) -> &dyn SpatialIndex {
        self.index_b.as_ref()
    }

    /// Force the next evaluation to rebuild
    pub fn invalidate(&mut self) {
        self.last_fingerprint = None;
    }

    /// Intersect the two meshes, reusing the previous result when neither
    /// mesh nor transform changed.
    pub fn evaluate(&mut self, a: MarkerInput<'_>, b: MarkerInput<'_>) -> Result<MarkerOutput> {
        if !a.visible && !b.visible {
            debug!("Both meshes hidden, skipping evaluation");
            return Ok(MarkerOutput::default());
        }

        let fingerprint = Fingerprint::combine(
            a.mesh.fingerprint(&a.transform),
            b.mesh.fingerprint(&b.transform),
        );

        let mut diagnostics = Vec::new();
        let recomputed = self.last_fingerprint != Some(fingerprint);
        if recomputed {
            info!("Geometry changed ({fingerprint}), rebuilding indices");

            // A failed comparison leaves the marker invalidated
            self.last_fingerprint = None;
            diagnostics.extend(Self::rebuild(self.index_a.as_mut(), a.mesh.snapshot(&a.transform)));
            diagnostics.extend(Self::rebuild(self.index_b.as_mut(), b.mesh.snapshot(&b.transform)));
            self.cached = self.index_a.intersect_index(self.index_b.as_ref())?;
            self.last_fingerprint = Some(fingerprint);
            self.rebuild_count += 1;
        } else {
            debug!("Geometry unchanged ({fingerprint}), reusing {} pairs", self.cached.len());
        }

        Ok(MarkerOutput {
            triangles_a: if a.visible { self.cached.a.clone() } else { Vec::new() },
            triangles_b: if b.visible { self.cached.b.clone() } else { Vec::new() },
            fingerprint: Some(fingerprint),
            recomputed,
            diagnostics,
        })
    }

    fn rebuild(index: &mut dyn SpatialIndex, snapshot: MeshSnapshot) -> Vec<IntersectError> {
        match snapshot.bounds {
            Some(bounds) => index.build(snapshot.triangles, bounds),
            None => index.clear(),
        }
        snapshot.diagnostics
    }

    /// Highlight geometry for `face_ids` using the configured offset
    pub fn highlights<I>(
        &self,
        mesh: &Mesh,
        transform: &Mat4,
        face_ids: I,
    ) -> (Vec<FaceHighlight>, Vec<IntersectError>)
    where
        I: IntoIterator<Item = usize>,
    {
        face_highlights(mesh, transform, face_ids, self.config.highlight_offset)
    }
}
