//! # Trace Selector
//!
//! Smoothed pace derivation and linked range selection for GPS activity traces.
//!
//! This library provides:
//! - A windowed pace series (min/km) derived from a moving-time track
//! - One shared selection over the track's points
//! - A time brush over the pace chart and a polygon lasso over the map, both writing
//!   that same selection
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate lasso polygons with rayon
//! - **`http`** - Enable the HTTP activity source (activity list and streams)
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trace_selector::{Explorer, InputEvent, TrackPoint};
//!
//! let track: Vec<TrackPoint> = (0..5)
//!     .map(|i| TrackPoint::new(i * 10, 51.50 + i as f64 * 0.001, -0.12, true))
//!     .collect();
//!
//! let mut explorer = Explorer::default();
//! explorer.dispatch(InputEvent::ActivityLoaded(track));
//! explorer.dispatch(InputEvent::BrushMoved { x0: 10.0, x1: 30.0 });
//!
//! let selected: Vec<usize> = explorer.model().selected_indexes().iter().copied().collect();
//! assert_eq!(selected, vec![1, 2, 3]);
//! ```

pub mod activity;
pub mod brush;
pub mod explorer;
pub mod geo_utils;
pub mod lasso;
pub mod pace;
pub mod selection;
pub mod stats;

// HTTP module for activity fetching
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{ActivitySummary, FetchError, StravaClient};

pub use activity::{build_track_points, RawStreams};
pub use brush::{BrushDomain, BrushView, TimeBrush};
pub use explorer::{Explorer, InputEvent};
pub use lasso::{
    DrawnFeature, DrawnGeometry, Key, KeyOutcome, LassoKeymap, LassoMode, PointStyle,
    SpatialLasso,
};
pub use pace::{derive_pace_series, derive_pace_series_unfiltered, PaceConfig};
pub use selection::{SelectionError, SelectionModel, SelectionState};
pub use stats::TripStats;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TraceSelectorRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// One GPS sample of an activity.
///
/// `time` is a moving-time clock in seconds: it does not advance while stopped, and it
/// never decreases along a track.
///
/// # Example
/// ```
/// use trace_selector::TrackPoint;
/// let point = TrackPoint::new(120, 51.5074, -0.1278, true); // London, 2 minutes in
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackPoint {
    pub time: i64,
    pub moving: bool,
    pub latitude: f64,
    pub longitude: f64,
}

impl TrackPoint {
    /// Create a new track point.
    pub fn new(time: i64, latitude: f64, longitude: f64, moving: bool) -> Self {
        Self { time, moving, latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One point of the smoothed pace series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SpeedSample {
    /// Midpoint of the window, in track time
    pub time: f64,
    /// Pace in minutes per kilometer (lower is faster)
    pub speed: f64,
}

/// Bounding box of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from track points.
    pub fn from_points(points: &[TrackPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self { min_lat, max_lat, min_lng, max_lng })
    }

    /// Get the center point of the bounds as `(lat, lng)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// FFI Exports
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{debug, info};
    use std::sync::{Arc, Mutex};

    /// A selection session for one map + pace chart pair.
    ///
    /// All calls are serialized through one lock, so events from the host are handled
    /// one at a time in arrival order.
    #[derive(uniffi::Object)]
    pub struct TraceSession {
        inner: Mutex<Explorer>,
    }

    impl TraceSession {
        fn with<R>(&self, f: impl FnOnce(&mut Explorer) -> R) -> R {
            let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        }

        fn send(&self, event: InputEvent) {
            self.with(|explorer| explorer.dispatch(event));
        }
    }

    #[uniffi::export]
    impl TraceSession {
        #[uniffi::constructor]
        pub fn new(config: PaceConfig) -> Arc<Self> {
            init_logging();
            info!("[TraceSelectorRust] New session (window {})", config.window);
            Arc::new(Self {
                inner: Mutex::new(Explorer::new(config, LassoKeymap::default())),
            })
        }

        /// Load an already-built track.
        pub fn load_activity(&self, points: Vec<TrackPoint>) {
            self.send(InputEvent::ActivityLoaded(points));
        }

        /// Load from raw streams. `latlngs` is flat: [lat1, lng1, lat2, lng2, ...]
        pub fn load_streams(&self, time: Vec<i64>, latlngs: Vec<f64>, moving: Vec<bool>) {
            let streams = RawStreams {
                time,
                latlng: latlngs.chunks_exact(2).map(|c| [c[0], c[1]]).collect(),
                moving,
            };
            self.send(InputEvent::ActivityLoaded(build_track_points(&streams)));
        }

        pub fn set_smoothing(&self, window: u32) {
            self.send(InputEvent::SmoothingChanged(window));
        }

        pub fn brush_started(&self) {
            self.send(InputEvent::BrushStarted);
        }

        pub fn brush_moved(&self, x0: f64, x1: f64) {
            self.send(InputEvent::BrushMoved { x0, x1 });
        }

        pub fn brush_ended(&self) {
            self.send(InputEvent::BrushEnded);
        }

        pub fn brush_clicked(&self) {
            self.send(InputEvent::BrushClicked);
        }

        pub fn brush_cleared(&self) {
            self.send(InputEvent::BrushCleared);
        }

        pub fn brush_reset(&self) {
            self.send(InputEvent::BrushReset);
        }

        /// Append a finished polygon to the drawn geometry.
        /// `exterior` is flat: [lng1, lat1, lng2, lat2, ...]
        pub fn polygon_completed(&self, exterior: Vec<f64>) {
            self.with(|explorer| {
                let mut features = explorer.drawn_features().to_vec();
                features.push(DrawnFeature::polygon(
                    exterior.chunks_exact(2).map(|c| [c[0], c[1]]).collect(),
                ));
                explorer.dispatch(InputEvent::GeometryEdited(features));
            });
        }

        /// DOM-style key name, e.g. "Backspace", "Escape" or "x".
        pub fn key_pressed(&self, key: String) {
            debug!("[TraceSelectorRust] key {}", key);
            self.send(InputEvent::KeyPressed(Key::from_name(&key)));
        }

        pub fn empty_area_clicked(&self) {
            self.send(InputEvent::EmptyAreaClicked);
        }

        pub fn selected_indexes(&self) -> Vec<u64> {
            self.with(|explorer| {
                explorer
                    .model()
                    .selected_indexes()
                    .iter()
                    .map(|&i| i as u64)
                    .collect()
            })
        }

        pub fn is_lasso_active(&self) -> bool {
            self.with(|explorer| explorer.model().is_lasso_active())
        }

        pub fn points(&self) -> Vec<TrackPoint> {
            self.with(|explorer| explorer.model().points().to_vec())
        }

        pub fn pace_series(&self) -> Vec<SpeedSample> {
            self.with(|explorer| explorer.pace_series().to_vec())
        }

        /// Samples currently shown in the zoomed chart.
        pub fn visible_pace_series(&self) -> Vec<SpeedSample> {
            self.with(|explorer| {
                explorer.brush_view().map(|v| v.visible).unwrap_or_default()
            })
        }

        pub fn brush_extent(&self) -> Option<BrushDomain> {
            self.with(|explorer| explorer.brush_view().map(|v| v.brush_extent))
        }

        pub fn bounds(&self) -> Option<Bounds> {
            self.with(|explorer| explorer.bounds())
        }

        pub fn trip_stats(&self) -> TripStats {
            self.with(|explorer| explorer.trip_stats())
        }

        pub fn selection_stats(&self) -> Option<TripStats> {
            self.with(|explorer| explorer.selection_stats())
        }
    }

    /// Get default pace configuration.
    #[uniffi::export]
    pub fn default_pace_config() -> PaceConfig {
        init_logging();
        PaceConfig::default()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_session_reports_selected_indexes() {
            let session = TraceSession::new(default_pace_config());
            session.load_activity(
                (0..5)
                    .map(|i| TrackPoint::new(i * 10, 45.0 + i as f64 * 0.001, 7.0, true))
                    .collect(),
            );

            session.brush_started();
            session.brush_moved(10.0, 30.0);
            session.brush_ended();
            assert_eq!(session.selected_indexes(), vec![1u64, 2, 3]);

            session.key_pressed("Escape".to_string());
            assert!(session.selected_indexes().is_empty());
        }
    }
}
