//! Event-driven activity explorer.
//!
//! Ties the selection model, the pace series and both view adapters into one session.
//! Every input goes through [`Explorer::dispatch`], one event at a time, and each handler
//! reads the model as it is at that moment. Brush and lasso both replace the selection
//! outright, so the most recently handled gesture decides what is selected.

use log::{debug, info};
use crate::brush::{BrushView, TimeBrush};
use crate::lasso::{DrawnFeature, Key, KeyOutcome, LassoKeymap, LassoMode, PointStyle, SpatialLasso};
use crate::pace::{derive_pace_series, PaceConfig};
use crate::selection::SelectionModel;
use crate::stats::TripStats;
use crate::{Bounds, SpeedSample, TrackPoint};

/// Input delivered by the host, already converted to domain coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A new activity finished loading
    ActivityLoaded(Vec<TrackPoint>),
    /// Smoothing window changed
    SmoothingChanged(u32),
    /// Pointer went down on the overview brush
    BrushStarted,
    /// Brush edges moved, in time units
    BrushMoved { x0: f64, x1: f64 },
    /// Pointer released after a drag on the overview brush
    BrushEnded,
    /// Click on the overview without dragging
    BrushClicked,
    /// "Clear" button
    BrushCleared,
    /// "Reset" button
    BrushReset,
    /// Editable geometry collection changed on the map
    GeometryEdited(Vec<DrawnFeature>),
    KeyPressed(Key),
    /// Click on an empty area of either view
    EmptyAreaClicked,
}

/// One user session over one activity at a time.
#[derive(Debug)]
pub struct Explorer {
    model: SelectionModel,
    config: PaceConfig,
    brush: TimeBrush,
    lasso: SpatialLasso,
    /// (generation, window) the brush series was derived for
    derived_for: (u64, u32),
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(PaceConfig::default(), LassoKeymap::default())
    }
}

impl Explorer {
    pub fn new(config: PaceConfig, keymap: LassoKeymap) -> Self {
        let model = SelectionModel::new();
        let derived_for = (model.generation(), config.window);
        Self {
            model,
            config,
            brush: TimeBrush::new(),
            lasso: SpatialLasso::with_keymap(keymap),
            derived_for,
        }
    }

    /// Handle one input event to completion.
    pub fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::ActivityLoaded(points) => self.load_activity(points),
            InputEvent::SmoothingChanged(window) => self.set_smoothing(window),
            InputEvent::BrushStarted => self.brush.begin_drag(&self.model),
            InputEvent::BrushMoved { x0, x1 } => {
                self.brush.on_brush_change(&mut self.model, x0, x1);
            }
            InputEvent::BrushEnded => self.brush.end_drag(),
            InputEvent::BrushClicked => self.brush.on_brush_click(),
            InputEvent::BrushCleared => self.brush.clear(),
            InputEvent::BrushReset => self.brush.reset(),
            InputEvent::GeometryEdited(features) => {
                self.lasso.on_edit(&mut self.model, features);
            }
            InputEvent::KeyPressed(key) => {
                let outcome = self.lasso.handle_key(&mut self.model, &key);
                if let KeyOutcome::Deleted(n) = outcome {
                    if n > 0 {
                        self.refresh_series();
                    }
                }
                debug!("[Explorer] {:?} -> {:?}", key, outcome);
            }
            InputEvent::EmptyAreaClicked => self.model.clear_selection(),
        }
    }

    fn load_activity(&mut self, points: Vec<TrackPoint>) {
        self.model.load_activity(points);
        self.lasso.discard_geometry();
        let series = self.derive();
        info!(
            "[Explorer] Activity loaded: {} points, {} pace samples",
            self.model.points().len(),
            series.len()
        );
        self.brush.reset_for_new_track(series);
    }

    fn set_smoothing(&mut self, window: u32) {
        self.config.window = PaceConfig::with_window(window).clamped_window();
        self.refresh_series();
    }

    /// Recompute the pace series if the track or the window changed since the last run.
    fn refresh_series(&mut self) {
        if self.derived_for == (self.model.generation(), self.config.window) {
            return;
        }
        let series = self.derive();
        self.brush.set_series(series);
    }

    fn derive(&mut self) -> Vec<SpeedSample> {
        self.derived_for = (self.model.generation(), self.config.window);
        derive_pace_series(self.model.points(), &self.config)
    }

    pub fn model(&self) -> &SelectionModel {
        &self.model
    }

    pub fn config(&self) -> &PaceConfig {
        &self.config
    }

    pub fn lasso_mode(&self) -> LassoMode {
        LassoMode::of(&self.model)
    }

    pub fn drawn_features(&self) -> &[DrawnFeature] {
        self.lasso.features()
    }

    pub fn pace_series(&self) -> &[SpeedSample] {
        self.brush.series()
    }

    /// Chart data for the pace view, `None` when there is nothing to draw.
    pub fn brush_view(&self) -> Option<BrushView> {
        self.brush.view()
    }

    pub fn styled_points(&self) -> Vec<(TrackPoint, PointStyle)> {
        self.lasso.styled_points(&self.model)
    }

    /// Bounding box of the loaded track, for fitting the map.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.model.points())
    }

    /// Statistics for the whole track.
    pub fn trip_stats(&self) -> TripStats {
        TripStats::from_points(self.model.points())
    }

    /// Statistics for the selected points, `None` when nothing is selected.
    pub fn selection_stats(&self) -> Option<TripStats> {
        if self.model.selected_indexes().is_empty() {
            return None;
        }
        Some(TripStats::from_points(&self.model.selected_points()))
    }
}
