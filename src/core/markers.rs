use crate::domain::model::{OrgId, Organization};
use crate::domain::ports::{MarkerSpec, RenderLayer};
use std::collections::{BTreeMap, HashSet};

/// Difference between the rendered markers and the next organization list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDiff {
    pub added: Vec<MarkerSpec>,
    pub removed: Vec<OrgId>,
    pub kept: usize,
}

impl MarkerDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Organization id → render-layer handle for every marker currently drawn.
#[derive(Debug)]
pub struct MarkerSet<H> {
    markers: BTreeMap<OrgId, H>,
}

impl<H> MarkerSet<H> {
    pub fn new() -> Self {
        Self {
            markers: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn contains(&self, id: &OrgId) -> bool {
        self.markers.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &OrgId> {
        self.markers.keys()
    }

    pub fn handle(&self, id: &OrgId) -> Option<&H> {
        self.markers.get(id)
    }

    pub fn diff(&self, next: &[Organization]) -> MarkerDiff {
        let mut seen: HashSet<&OrgId> = HashSet::with_capacity(next.len());
        let mut added = Vec::new();
        let mut kept = 0;

        for org in next {
            // 重複的 id 只保留第一筆
            if !seen.insert(&org.id) {
                continue;
            }
            if self.markers.contains_key(&org.id) {
                kept += 1;
            } else {
                added.push(MarkerSpec::for_organization(org));
            }
        }

        let removed = self
            .markers
            .keys()
            .filter(|id| !seen.contains(id))
            .cloned()
            .collect();

        MarkerDiff {
            added,
            removed,
            kept,
        }
    }

    /// Applies one diff in full. Markers present on both sides are not touched.
    pub fn apply<R>(&mut self, diff: MarkerDiff, layer: &mut R) -> ReconcileSummary
    where
        R: RenderLayer<Handle = H>,
    {
        let mut summary = ReconcileSummary {
            kept: diff.kept,
            ..Default::default()
        };

        for id in diff.removed {
            if let Some(handle) = self.markers.remove(&id) {
                layer.remove_marker(&id, handle);
                summary.removed += 1;
            }
        }

        for spec in diff.added {
            match layer.add_marker(&spec) {
                Ok(handle) => {
                    self.markers.insert(spec.id, handle);
                    summary.added += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to add marker {}: {}", spec.id, e);
                    summary.failed += 1;
                }
            }
        }

        if summary.added > 0 || summary.removed > 0 {
            layer.recompute_clusters();
        }

        tracing::debug!(
            "Reconciled markers: +{} -{} ={} (failed {})",
            summary.added,
            summary.removed,
            summary.kept,
            summary.failed
        );
        summary
    }

    pub fn reconcile<R>(&mut self, next: &[Organization], layer: &mut R) -> ReconcileSummary
    where
        R: RenderLayer<Handle = H>,
    {
        let diff = self.diff(next);
        self.apply(diff, layer)
    }
}

impl<H> Default for MarkerSet<H> {
    fn default() -> Self {
        Self::new()
    }
}
