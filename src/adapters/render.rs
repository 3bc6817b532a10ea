use crate::domain::model::{Coordinate, OrgId, UserLocation, ViewportBounds};
use crate::domain::ports::{MarkerSpec, RenderLayer};
use crate::utils::error::{MapError, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    SetView { center: Coordinate, zoom: u8 },
    Add(OrgId),
    Remove(OrgId),
    RecomputeClusters,
    FitBounds(ViewportBounds),
    UserLocation(Coordinate),
}

/// Render layer that keeps a log of every operation instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingLayer {
    ops: Vec<RenderOp>,
    live: BTreeSet<OrgId>,
    next_handle: u64,
}

impl RecordingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    pub fn live_markers(&self) -> Vec<OrgId> {
        self.live.iter().cloned().collect()
    }

    pub fn views(&self) -> Vec<(Coordinate, u8)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::SetView { center, zoom } => Some((*center, *zoom)),
                _ => None,
            })
            .collect()
    }

    pub fn fitted(&self) -> Vec<ViewportBounds> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::FitBounds(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn user_locations(&self) -> Vec<Coordinate> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::UserLocation(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn count_adds(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Add(_)))
            .count()
    }

    pub fn count_removes(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Remove(_)))
            .count()
    }
}

impl RenderLayer for RecordingLayer {
    type Handle = u64;

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.ops.push(RenderOp::SetView { center, zoom });
    }

    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<u64> {
        if !self.live.insert(spec.id.clone()) {
            return Err(MapError::ConfigError {
                message: format!("marker {} is already on the map", spec.id),
            });
        }
        self.next_handle += 1;
        self.ops.push(RenderOp::Add(spec.id.clone()));
        Ok(self.next_handle)
    }

    fn remove_marker(&mut self, id: &OrgId, _handle: u64) {
        self.live.remove(id);
        self.ops.push(RenderOp::Remove(id.clone()));
    }

    fn recompute_clusters(&mut self) {
        self.ops.push(RenderOp::RecomputeClusters);
    }

    fn fit_bounds(&mut self, bounds: &ViewportBounds) {
        self.ops.push(RenderOp::FitBounds(*bounds));
    }

    fn show_user_location(&mut self, location: &UserLocation) {
        self.ops.push(RenderOp::UserLocation(location.coordinate));
    }
}

/// Render layer for the headless CLI: prints each operation on stdout.
#[derive(Debug, Default)]
pub struct ConsoleLayer {
    drawn: usize,
}

impl ConsoleLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl RenderLayer for ConsoleLayer {
    type Handle = ();

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        println!(
            "🗺️  view {:.4}, {:.4} @ zoom {}",
            center.latitude, center.longitude, zoom
        );
    }

    fn add_marker(&mut self, spec: &MarkerSpec) -> Result<()> {
        self.drawn += 1;
        println!(
            "+ [{}] {} ({}, icon: {}) @ {:.4}, {:.4}",
            spec.id,
            spec.popup.title,
            spec.popup.category,
            spec.icon.asset_name(),
            spec.coordinate.latitude,
            spec.coordinate.longitude
        );
        Ok(())
    }

    fn remove_marker(&mut self, id: &OrgId, _handle: ()) {
        self.drawn = self.drawn.saturating_sub(1);
        println!("- [{}]", id);
    }

    fn recompute_clusters(&mut self) {
        println!("  {} markers on map", self.drawn);
    }

    fn fit_bounds(&mut self, bounds: &ViewportBounds) {
        println!("🔍 fit {}", bounds);
    }

    fn show_user_location(&mut self, location: &UserLocation) {
        println!(
            "📍 you are here: {:.4}, {:.4}{}",
            location.coordinate.latitude,
            location.coordinate.longitude,
            location
                .city
                .as_deref()
                .map(|c| format!(" ({})", c))
                .unwrap_or_default()
        );
    }
}
