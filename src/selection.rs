//! Range selection model.
//!
//! The single owner of the loaded track and of the selected-index set. The time brush
//! and the spatial lasso both propose full replacement selections through
//! [`SelectionModel::set_selection`]; whichever event is handled last wins.
//!
//! Indexes identify points by position. The track is only ever replaced wholesale or
//! shrunk by deletion, never reordered, so positions stay meaningful until the next
//! mutation, which always clears the selection and bumps [`SelectionModel::generation`].

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rstar::{RTree, RTreeObject, AABB};
use thiserror::Error;

use crate::TrackPoint;

/// Rejected selection update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("selection index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Snapshot of the shared selection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_indexes: BTreeSet<usize>,
    pub lasso_active: bool,
}

// =============================================================================
// R-tree Indexed Point for Spatial Queries
// =============================================================================

/// A track point position with its index for R-tree queries, in `[lng, lat]` space.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lng: f64,
    lat: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

fn build_index(points: &[TrackPoint]) -> RTree<IndexedPoint> {
    let indexed: Vec<IndexedPoint> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.latitude.is_finite() && p.longitude.is_finite())
        .map(|(idx, p)| IndexedPoint { idx, lng: p.longitude, lat: p.latitude })
        .collect();

    RTree::bulk_load(indexed)
}

// =============================================================================
// Selection Model
// =============================================================================

/// Canonical track plus selection state.
pub struct SelectionModel {
    points: Vec<TrackPoint>,
    state: SelectionState,
    generation: u64,
    index: RTree<IndexedPoint>,
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("points", &self.points.len())
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionModel {
    /// An empty model: no points, nothing selected, draw mode.
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            state: SelectionState::default(),
            generation: 0,
            index: RTree::new(),
        }
    }

    /// Replace the track wholesale.
    ///
    /// Clears the selection and leaves lasso mode untouched.
    pub fn load_activity(&mut self, points: Vec<TrackPoint>) {
        info!(
            "[Selection] Loading {} points (replacing {}, dropping {} selected)",
            points.len(),
            self.points.len(),
            self.state.selected_indexes.len()
        );
        self.index = build_index(&points);
        self.points = points;
        self.state.selected_indexes.clear();
        self.generation += 1;
    }

    /// Replace the selection.
    ///
    /// The whole update is rejected, leaving the current selection in place, if any index
    /// is not a valid position in the current track.
    pub fn set_selection(&mut self, indexes: BTreeSet<usize>) -> Result<(), SelectionError> {
        let len = self.points.len();
        if let Some(&index) = indexes.range(len..).next() {
            warn!("[Selection] Rejected selection: index {} >= {} points", index, len);
            return Err(SelectionError::IndexOutOfRange { index, len });
        }

        debug!("[Selection] Selected {} of {} points", indexes.len(), len);
        self.state.selected_indexes = indexes;
        Ok(())
    }

    /// Remove every selected point and clear the selection.
    ///
    /// Surviving points keep their relative order. Returns how many points were removed;
    /// with nothing selected this is a no-op and the generation is not bumped.
    pub fn delete_selected(&mut self) -> usize {
        if self.state.selected_indexes.is_empty() {
            return 0;
        }

        let selected = std::mem::take(&mut self.state.selected_indexes);
        let before = self.points.len();
        let mut position = 0;
        self.points.retain(|_| {
            let keep = !selected.contains(&position);
            position += 1;
            keep
        });
        self.index = build_index(&self.points);
        self.generation += 1;

        let removed = before - self.points.len();
        info!("[Selection] Deleted {} points, {} remain", removed, self.points.len());
        removed
    }

    /// Flip between draw and drag-lasso mode. The selection is untouched.
    pub fn toggle_lasso(&mut self) {
        self.state.lasso_active = !self.state.lasso_active;
        debug!("[Selection] Lasso mode {}", if self.state.lasso_active { "on" } else { "off" });
    }

    /// Force the lasso mode flag.
    pub fn set_lasso(&mut self, active: bool) {
        self.state.lasso_active = active;
    }

    /// Empty the selection.
    pub fn clear_selection(&mut self) {
        self.state.selected_indexes.clear();
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn selected_indexes(&self) -> &BTreeSet<usize> {
        &self.state.selected_indexes
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.state.selected_indexes.contains(&index)
    }

    /// Selected points in track order.
    pub fn selected_points(&self) -> Vec<TrackPoint> {
        self.state
            .selected_indexes
            .iter()
            .map(|&i| self.points[i])
            .collect()
    }

    pub fn is_lasso_active(&self) -> bool {
        self.state.lasso_active
    }

    /// Counter bumped on every replacement or shrink of the track.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state.clone()
    }

    /// Indexes of points whose time lies in `[x0, x1]`, both ends inclusive.
    pub fn indexes_in_time_range(&self, x0: f64, x1: f64) -> BTreeSet<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                let t = p.time as f64;
                t >= x0 && t <= x1
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Candidate indexes whose position lies in the `[lng, lat]` box `min..=max`.
    pub fn indexes_in_envelope(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        let envelope = AABB::from_corners(min, max);
        let mut found: Vec<usize> = self
            .index
            .locate_in_envelope(&envelope)
            .map(|p| p.idx)
            .collect();
        found.sort_unstable();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(times: &[i64]) -> Vec<TrackPoint> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| TrackPoint::new(t, i as f64, i as f64, true))
            .collect()
    }

    fn set(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_new_model_is_empty() {
        let model = SelectionModel::new();
        assert!(model.points().is_empty());
        assert!(model.selected_indexes().is_empty());
        assert!(!model.is_lasso_active());
        assert_eq!(model.generation(), 0);
    }

    #[test]
    fn test_load_clears_selection_keeps_lasso() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10, 20]));
        model.set_selection(set(&[0, 2])).unwrap();
        model.toggle_lasso();

        model.load_activity(track(&[0, 5, 10, 15, 20]));

        assert!(model.selected_indexes().is_empty());
        assert!(model.is_lasso_active());
        assert_eq!(model.points().len(), 5);
        assert_eq!(model.generation(), 2);
    }

    #[test]
    fn test_load_empty_clears_selection() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10]));
        model.set_selection(set(&[1])).unwrap();
        model.load_activity(Vec::new());
        assert!(model.selected_indexes().is_empty());
    }

    #[test]
    fn test_set_selection_rejects_out_of_range() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10, 20]));
        model.set_selection(set(&[1])).unwrap();

        let err = model.set_selection(set(&[0, 3, 7])).unwrap_err();

        assert_eq!(err, SelectionError::IndexOutOfRange { index: 3, len: 3 });
        assert_eq!(model.selected_indexes(), &set(&[1]));
    }

    #[test]
    fn test_set_selection_on_empty_track() {
        let mut model = SelectionModel::new();
        assert!(model.set_selection(set(&[0])).is_err());
        assert!(model.set_selection(BTreeSet::new()).is_ok());
    }

    #[test]
    fn test_delete_selected_renumbers() {
        let mut model = SelectionModel::new();
        let points = track(&[0, 10, 20, 30]);
        model.load_activity(points.clone());
        model.set_selection(set(&[1, 3])).unwrap();

        assert_eq!(model.delete_selected(), 2);

        assert_eq!(model.points(), &[points[0], points[2]]);
        assert!(model.selected_indexes().is_empty());
        assert_eq!(model.generation(), 2);
    }

    #[test]
    fn test_delete_nothing_selected() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10]));
        assert_eq!(model.delete_selected(), 0);
        assert_eq!(model.points().len(), 2);
        assert_eq!(model.generation(), 1);
    }

    #[test]
    fn test_delete_rebuilds_spatial_index() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10, 20, 30]));
        model.set_selection(set(&[0])).unwrap();
        model.delete_selected();

        // old point 2 at (2,2) is now index 1
        assert_eq!(model.indexes_in_envelope([1.5, 1.5], [2.5, 2.5]), vec![1]);
        assert!(model.indexes_in_envelope([3.5, 3.5], [4.5, 4.5]).is_empty());
    }

    #[test]
    fn test_toggle_lasso_keeps_selection() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10]));
        model.set_selection(set(&[0])).unwrap();
        model.toggle_lasso();
        assert!(model.is_lasso_active());
        model.toggle_lasso();
        assert!(!model.is_lasso_active());
        assert_eq!(model.selected_indexes(), &set(&[0]));
    }

    #[test]
    fn test_clear_selection() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10]));
        model.set_selection(set(&[0, 1])).unwrap();
        model.clear_selection();
        assert!(model.snapshot().selected_indexes.is_empty());
    }

    #[test]
    fn test_indexes_in_time_range_inclusive() {
        let mut model = SelectionModel::new();
        model.load_activity(track(&[0, 10, 20, 30, 40]));
        assert_eq!(model.indexes_in_time_range(10.0, 30.0), set(&[1, 2, 3]));
        assert_eq!(model.indexes_in_time_range(10.5, 29.5), set(&[2]));
        assert!(model.indexes_in_time_range(41.0, 50.0).is_empty());
    }

    #[test]
    fn test_selected_points_in_track_order() {
        let mut model = SelectionModel::new();
        let points = track(&[0, 10, 20, 30]);
        model.load_activity(points.clone());
        model.set_selection(set(&[3, 1])).unwrap();
        assert_eq!(model.selected_points(), vec![points[1], points[3]]);
        assert!(model.is_selected(3));
        assert!(!model.is_selected(2));
    }
}
