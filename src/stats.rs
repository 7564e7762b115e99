//! Trip statistics for a whole track or a selected subset.

use crate::geo_utils::polyline_length;
use crate::TrackPoint;

/// Distance, moving time and average pace of a run of points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TripStats {
    /// Polyline length in kilometers
    pub distance_km: f64,
    /// Moving seconds between the first and last point
    pub moving_seconds: i64,
    /// Minutes per kilometer, `None` when no distance was covered
    pub pace_min_per_km: Option<f64>,
}

impl TripStats {
    /// Statistics over `points` in the given order.
    ///
    /// For a non-contiguous selection the distance is measured along the selected points
    /// only, so gaps are bridged by a straight segment.
    pub fn from_points(points: &[TrackPoint]) -> Self {
        let distance_km = polyline_length(points) / 1000.0;
        let moving_seconds = match (points.first(), points.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0,
        };
        let pace_min_per_km = (distance_km > 0.0)
            .then(|| moving_seconds as f64 / 60.0 / distance_km);

        Self { distance_km, moving_seconds, pace_min_per_km }
    }

    /// Distance rounded to one decimal, e.g. `"12.3 KM"`.
    pub fn distance_label(&self) -> String {
        format!("{:.1} KM", self.distance_km)
    }

    /// Whole minutes of moving time, e.g. `"54 minutes"`.
    pub fn duration_label(&self) -> String {
        format!("{} minutes", (self.moving_seconds as f64 / 60.0).round() as i64)
    }

    /// Average pace as `m:ss min/km`, or `None` without distance.
    pub fn pace_label(&self) -> Option<String> {
        self.pace_min_per_km.and_then(format_pace)
    }
}

/// Format a pace in minutes per kilometer as `m:ss min/km`.
///
/// Seconds are rounded, carrying into the minutes when they reach 60. Returns `None`
/// for negative or non-finite input.
///
/// ```rust
/// use trace_selector::stats::format_pace;
///
/// assert_eq!(format_pace(4.5).as_deref(), Some("4:30 min/km"));
/// assert_eq!(format_pace(4.999).as_deref(), Some("5:00 min/km"));
/// ```
pub fn format_pace(pace: f64) -> Option<String> {
    if !pace.is_finite() || pace < 0.0 {
        return None;
    }
    let total_seconds = (pace * 60.0).round() as u64;
    Some(format!("{}:{:02} min/km", total_seconds / 60, total_seconds % 60))
}
