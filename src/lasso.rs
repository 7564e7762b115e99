//! Spatial-lasso view adapter.
//!
//! Turns polygons drawn on the map into selections, and keyboard input into deletion,
//! mode switching and cancellation. Two drawing modes exist, driven by the model's
//! lasso flag:
//!
//! - [`LassoMode::Draw`]: the polygon is built by clicking one vertex at a time
//! - [`LassoMode::DragLasso`]: the polygon is traced in one continuous drag
//!
//! Either way the host reports the whole editable geometry collection after each edit;
//! a selection happens only when the newest feature is a polygon.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use geo::BoundingRect;
use crate::geo_utils::{polygon_contains, polygon_from_rings};
use crate::selection::SelectionModel;
use crate::TrackPoint;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Active drawing interaction on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LassoMode {
    Draw,
    DragLasso,
}

impl LassoMode {
    pub fn of(model: &SelectionModel) -> Self {
        if model.is_lasso_active() {
            LassoMode::DragLasso
        } else {
            LassoMode::Draw
        }
    }
}

/// Geometry drawn by the user, GeoJSON-style `[lng, lat]` positions.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnGeometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    /// Exterior ring first, then holes
    Polygon(Vec<Vec<[f64; 2]>>),
}

/// One entry of the editable geometry collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnFeature {
    pub geometry: DrawnGeometry,
}

impl DrawnFeature {
    pub fn polygon(exterior: Vec<[f64; 2]>) -> Self {
        Self { geometry: DrawnGeometry::Polygon(vec![exterior]) }
    }
}

/// A key press delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Delete,
    Escape,
    Char(char),
    Other(String),
}

impl Key {
    /// Map a DOM-style key name (`"Backspace"`, `"Escape"`, `"x"`) to a key.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "Escape" | "Esc" => Key::Escape,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other(name.to_string()),
                }
            }
        }
    }
}

/// Keys bound to lasso actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LassoKeymap {
    /// Delete the selected points. Default: Backspace
    pub delete: Key,
    /// Switch between draw and drag-lasso mode. Default: `x`
    pub toggle: Key,
    /// Drop the selection and leave drag-lasso mode. Default: Escape
    pub cancel: Key,
}

impl Default for LassoKeymap {
    fn default() -> Self {
        Self {
            delete: Key::Backspace,
            toggle: Key::Char('x'),
            cancel: Key::Escape,
        }
    }
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Deleted(usize),
    Toggled(LassoMode),
    Cancelled,
    Ignored,
}

/// Per-point rendering attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub radius: f32,
    pub fill_color: [u8; 4],
    pub line_color: [u8; 4],
}

impl PointStyle {
    pub const SELECTED: PointStyle = PointStyle {
        radius: 10.0,
        fill_color: [255, 255, 255, 255],
        line_color: [0, 255, 0, 255],
    };

    pub const UNSELECTED: PointStyle = PointStyle {
        radius: 1.0,
        fill_color: [0, 0, 0, 255],
        line_color: [255, 0, 0, 255],
    };
}

/// View-local lasso state: the drawn geometry and the key bindings.
#[derive(Debug, Clone, Default)]
pub struct SpatialLasso {
    features: Vec<DrawnFeature>,
    keymap: LassoKeymap,
}

impl SpatialLasso {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keymap(keymap: LassoKeymap) -> Self {
        Self { features: Vec::new(), keymap }
    }

    pub fn features(&self) -> &[DrawnFeature] {
        &self.features
    }

    pub fn keymap(&self) -> &LassoKeymap {
        &self.keymap
    }

    /// Forget every drawn shape.
    pub fn discard_geometry(&mut self) {
        self.features.clear();
    }

    /// Handle an edit of the geometry collection.
    ///
    /// The collection is stored as-is. When its last feature is a polygon, the model's
    /// selection is replaced with every point inside it, boundary included. Returns the
    /// number of selected points, or `None` if the edit did not complete a polygon.
    pub fn on_edit(
        &mut self,
        model: &mut SelectionModel,
        updated: Vec<DrawnFeature>,
    ) -> Option<usize> {
        self.features = updated;

        let rings = match self.features.last().map(|f| &f.geometry) {
            Some(DrawnGeometry::Polygon(rings)) => rings,
            _ => return None,
        };
        let Some(polygon) = polygon_from_rings(rings) else {
            debug!("[Lasso] Ignoring degenerate polygon");
            return None;
        };
        let rect = polygon.bounding_rect()?;

        let candidates = model.indexes_in_envelope(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        let points = model.points();
        let selected = select_inside(&polygon, points, candidates);
        let count = selected.len();

        debug!("[Lasso] Polygon covers {} of {} points", count, points.len());
        if let Err(e) = model.set_selection(selected) {
            warn!("[Lasso] {}", e);
            return None;
        }
        Some(count)
    }

    /// Handle a key press against the current model state.
    pub fn handle_key(&mut self, model: &mut SelectionModel, key: &Key) -> KeyOutcome {
        if *key == self.keymap.delete {
            let removed = model.delete_selected();
            self.discard_geometry();
            model.set_lasso(false);
            info!("[Lasso] Delete key removed {} points", removed);
            KeyOutcome::Deleted(removed)
        } else if *key == self.keymap.toggle {
            model.toggle_lasso();
            KeyOutcome::Toggled(LassoMode::of(model))
        } else if *key == self.keymap.cancel {
            model.clear_selection();
            model.set_lasso(false);
            KeyOutcome::Cancelled
        } else {
            KeyOutcome::Ignored
        }
    }

    /// Rendering attributes for point `index`.
    pub fn point_style(&self, model: &SelectionModel, index: usize) -> PointStyle {
        if model.is_selected(index) {
            PointStyle::SELECTED
        } else {
            PointStyle::UNSELECTED
        }
    }

    /// Every point paired with its style, in track order.
    pub fn styled_points(&self, model: &SelectionModel) -> Vec<(TrackPoint, PointStyle)> {
        model
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| (*p, self.point_style(model, i)))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn select_inside(
    polygon: &geo::Polygon<f64>,
    points: &[TrackPoint],
    candidates: Vec<usize>,
) -> BTreeSet<usize> {
    candidates
        .into_iter()
        .filter(|&i| polygon_contains(polygon, &points[i]))
        .collect()
}

#[cfg(feature = "parallel")]
fn select_inside(
    polygon: &geo::Polygon<f64>,
    points: &[TrackPoint],
    candidates: Vec<usize>,
) -> BTreeSet<usize> {
    candidates
        .into_par_iter()
        .filter(|&i| polygon_contains(polygon, &points[i]))
        .collect::<Vec<usize>>()
        .into_iter()
        .collect()
}
