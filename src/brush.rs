//! Time-brush view adapter.
//!
//! Backs a two-chart pace view: an overview chart always showing the full series with a
//! horizontal brush, and a zoomed chart showing only the brushed window. Dragging the
//! brush narrows the zoomed chart and selects every track point inside the window.
//!
//! Times arriving here are already in the time domain; pixel inversion belongs to the
//! rendering host.

use log::debug;
use crate::pace::pace_extent;
use crate::selection::SelectionModel;
use crate::SpeedSample;

/// A time window `[x0, x1]` with `x0 <= x1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct BrushDomain {
    pub x0: f64,
    pub x1: f64,
}

impl BrushDomain {
    /// Build a domain from two edges in either order.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { x0: a, x1: b }
        } else {
            Self { x0: b, x1: a }
        }
    }

    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.x0 && t <= self.x1
    }
}

/// Everything the host needs to draw both charts and the brush.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushView {
    /// Samples shown in the zoomed chart
    pub visible: Vec<SpeedSample>,
    /// Horizontal domain of the zoomed chart (first to last visible sample)
    pub visible_domain: BrushDomain,
    /// Vertical domain of the zoomed chart
    pub visible_pace: (f64, f64),
    /// Horizontal domain of the overview chart
    pub full_domain: BrushDomain,
    /// Vertical domain of the overview chart
    pub full_pace: (f64, f64),
    /// Current extent of the brush control on the overview
    pub brush_extent: BrushDomain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Active { generation: u64 },
}

/// View-local brush state. The selection itself always lives in [`SelectionModel`].
#[derive(Debug, Clone)]
pub struct TimeBrush {
    series: Vec<SpeedSample>,
    /// `None` shows the full series
    window: Option<BrushDomain>,
    /// `None` puts the control at its initial position
    extent: Option<BrushDomain>,
    drag: DragState,
}

impl Default for TimeBrush {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeBrush {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            window: None,
            extent: None,
            drag: DragState::Idle,
        }
    }

    /// Replace the pace series after a recompute.
    ///
    /// The visible window and brush extent are kept, so a smoothing change keeps the
    /// user's zoom.
    pub fn set_series(&mut self, series: Vec<SpeedSample>) {
        self.series = series;
    }

    /// Drop the zoom and brush position for a freshly loaded track.
    ///
    /// A drag in progress stays pinned to the old generation, so its remaining moves are
    /// discarded.
    pub fn reset_for_new_track(&mut self, series: Vec<SpeedSample>) {
        self.series = series;
        self.window = None;
        self.extent = None;
    }

    pub fn series(&self) -> &[SpeedSample] {
        &self.series
    }

    /// Mark the start of a drag, pinning it to the current track generation.
    pub fn begin_drag(&mut self, model: &SelectionModel) {
        self.drag = DragState::Active { generation: model.generation() };
    }

    /// Mark the end of a drag. Later moves apply against whatever track is loaded then.
    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Apply a brush change over `[x0, x1]`.
    ///
    /// Narrows the zoomed chart, moves the brush control and replaces the model's
    /// selection with every point whose time falls inside the window. A drag that began
    /// before the track was replaced or shrunk is ignored. Returns whether the change was
    /// applied.
    pub fn on_brush_change(&mut self, model: &mut SelectionModel, x0: f64, x1: f64) -> bool {
        if let DragState::Active { generation } = self.drag {
            if generation != model.generation() {
                debug!(
                    "[Brush] Dropping stale drag (generation {} != {})",
                    generation,
                    model.generation()
                );
                return false;
            }
        }
        if !x0.is_finite() || !x1.is_finite() {
            return false;
        }

        let domain = BrushDomain::new(x0, x1);
        self.window = Some(domain);
        self.extent = Some(domain);

        let indexes = model.indexes_in_time_range(domain.x0, domain.x1);
        debug!(
            "[Brush] [{:.0}, {:.0}] covers {} points",
            domain.x0,
            domain.x1,
            indexes.len()
        );
        // indexes come from the model's own track, so this cannot be out of range
        model.set_selection(indexes).is_ok()
    }

    /// Click on the overview without dragging: show the full series again.
    pub fn on_brush_click(&mut self) {
        self.window = None;
    }

    /// "Clear": show the full series and move the brush control back over the full domain.
    pub fn clear(&mut self) {
        self.window = None;
        self.extent = None;
        self.drag = DragState::Idle;
    }

    /// "Reset": put the brush control back at its initial bounds. The zoomed chart and
    /// the selection are left as they are.
    pub fn reset(&mut self) {
        self.extent = None;
        self.drag = DragState::Idle;
    }

    /// First-to-last sample time of the full series.
    pub fn initial_extent(&self) -> Option<BrushDomain> {
        match (self.series.first(), self.series.last()) {
            (Some(first), Some(last)) => Some(BrushDomain::new(first.time, last.time)),
            _ => None,
        }
    }

    /// Samples inside the visible window.
    pub fn visible_samples(&self) -> Vec<SpeedSample> {
        match self.window {
            Some(domain) => self
                .series
                .iter()
                .filter(|s| domain.contains(s.time))
                .copied()
                .collect(),
            None => self.series.clone(),
        }
    }

    /// Chart data, or `None` when there is nothing to draw.
    pub fn view(&self) -> Option<BrushView> {
        let full_domain = self.initial_extent()?;
        let full_pace = pace_extent(&self.series)?;

        let visible = self.visible_samples();
        let visible_domain = BrushDomain::new(visible.first()?.time, visible.last()?.time);
        let visible_pace = pace_extent(&visible)?;

        Some(BrushView {
            visible,
            visible_domain,
            visible_pace,
            full_domain,
            full_pace,
            brush_extent: self.extent.unwrap_or(full_domain),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackPoint;

    fn model_with_times(times: &[i64]) -> SelectionModel {
        let mut model = SelectionModel::new();
        model.load_activity(
            times
                .iter()
                .map(|&t| TrackPoint::new(t, 45.0, 7.0, true))
                .collect(),
        );
        model
    }

    fn series(times: &[f64]) -> Vec<SpeedSample> {
        times
            .iter()
            .enumerate()
            .map(|(i, &time)| SpeedSample { time, speed: 3.0 + i as f64 * 0.5 })
            .collect()
    }

    fn set(items: &[usize]) -> std::collections::BTreeSet<usize> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_brush_selects_inclusive_range() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.set_series(series(&[5.0, 15.0, 25.0, 35.0]));

        assert!(brush.on_brush_change(&mut model, 10.0, 30.0));
        assert_eq!(model.selected_indexes(), &set(&[1, 2, 3]));
    }

    #[test]
    fn test_reversed_edges_normalized() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.on_brush_change(&mut model, 30.0, 10.0);
        assert_eq!(model.selected_indexes(), &set(&[1, 2, 3]));
    }

    #[test]
    fn test_brush_narrows_visible_samples() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.set_series(series(&[5.0, 15.0, 25.0, 35.0]));
        brush.on_brush_change(&mut model, 10.0, 30.0);

        let view = brush.view().unwrap();
        let times: Vec<f64> = view.visible.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![15.0, 25.0]);
        assert_eq!(view.visible_domain, BrushDomain::new(15.0, 25.0));
        assert_eq!(view.visible_pace, (3.5, 4.0));
        assert_eq!(view.full_domain, BrushDomain::new(5.0, 35.0));
        assert_eq!(view.full_pace, (3.0, 4.5));
        assert_eq!(view.brush_extent, BrushDomain::new(10.0, 30.0));
    }

    #[test]
    fn test_clear_restores_full_window_and_extent() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.set_series(series(&[5.0, 15.0, 25.0, 35.0]));
        brush.on_brush_change(&mut model, 10.0, 30.0);

        brush.clear();

        let view = brush.view().unwrap();
        assert_eq!(view.visible.len(), 4);
        assert_eq!(view.brush_extent, view.full_domain);
    }

    #[test]
    fn test_reset_moves_extent_only() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.set_series(series(&[5.0, 15.0, 25.0, 35.0]));
        brush.on_brush_change(&mut model, 10.0, 30.0);

        brush.reset();

        let view = brush.view().unwrap();
        assert_eq!(view.brush_extent, BrushDomain::new(5.0, 35.0));
        assert_eq!(view.visible.len(), 2);
        assert_eq!(model.selected_indexes(), &set(&[1, 2, 3]));
    }

    #[test]
    fn test_click_shows_full_series() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.set_series(series(&[5.0, 15.0, 25.0, 35.0]));
        brush.on_brush_change(&mut model, 10.0, 30.0);
        brush.on_brush_click();
        assert_eq!(brush.visible_samples().len(), 4);
    }

    #[test]
    fn test_stale_drag_ignored() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.begin_drag(&model);

        model.load_activity(vec![TrackPoint::new(0, 45.0, 7.0, true)]);

        assert!(!brush.on_brush_change(&mut model, 0.0, 40.0));
        assert!(model.selected_indexes().is_empty());

        brush.begin_drag(&model);
        assert!(brush.on_brush_change(&mut model, 0.0, 40.0));
        assert_eq!(model.selected_indexes(), &set(&[0]));
    }

    #[test]
    fn test_ended_drag_applies_after_delete() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.begin_drag(&model);
        assert!(brush.on_brush_change(&mut model, 10.0, 10.0));
        assert_eq!(model.delete_selected(), 1);

        // the drag that started before the delete is still stale
        assert!(!brush.on_brush_change(&mut model, 0.0, 40.0));

        brush.end_drag();
        assert!(brush.on_brush_change(&mut model, 0.0, 40.0));
        assert_eq!(model.selected_indexes(), &set(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_empty_series_renders_nothing() {
        let brush = TimeBrush::new();
        assert!(brush.view().is_none());
        assert!(brush.initial_extent().is_none());
    }

    #[test]
    fn test_empty_window_renders_nothing() {
        let mut model = model_with_times(&[0, 10, 20, 30, 40]);
        let mut brush = TimeBrush::new();
        brush.set_series(series(&[5.0, 15.0]));
        brush.on_brush_change(&mut model, 100.0, 200.0);
        assert!(brush.view().is_none());
        assert!(model.selected_indexes().is_empty());
    }
}
