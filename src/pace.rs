//! Smoothed pace derivation.
//!
//! Turns an ordered track into a windowed pace series (minutes per kilometer, lower is
//! faster). Sample `i` pairs point `i` with point `i + window + 1`:
//!
//! - `time` is the midpoint of the two timestamps
//! - `speed` is the elapsed minutes divided by the polyline length (km) of every point
//!   between them, inclusive
//!
//! The series is recomputed wholesale whenever the track or the window changes; there is
//! no incremental update.

use log::debug;
use crate::geo_utils::cumulative_distances;
use crate::{SpeedSample, TrackPoint};

/// Upper bound of the smoothing window exposed to users.
pub const SMOOTHING_MAX: usize = 200;

/// Granularity of the smoothing window exposed to users.
pub const SMOOTHING_STEP: usize = 10;

/// Configuration for pace derivation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PaceConfig {
    /// Number of intermediate points spanned by each sample.
    /// Default: 50
    pub window: u32,

    /// Exclusive lower bound of the plausible pace band (min/km).
    /// Default: 2.5 (faster samples are treated as GPS noise)
    pub min_pace: f64,

    /// Exclusive upper bound of the plausible pace band (min/km).
    /// Default: 7.0 (slower samples are treated as standing still)
    pub max_pace: f64,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            window: 50,
            min_pace: 2.5,
            max_pace: 7.0,
        }
    }
}

impl PaceConfig {
    /// Default band with a custom window.
    pub fn with_window(window: u32) -> Self {
        Self { window, ..Self::default() }
    }

    /// Window snapped onto the user-facing slider: `0..=SMOOTHING_MAX` in steps of
    /// `SMOOTHING_STEP`, rounding to the nearest step.
    pub fn clamped_window(&self) -> u32 {
        let w = (self.window as usize).min(SMOOTHING_MAX);
        let snapped = (w + SMOOTHING_STEP / 2) / SMOOTHING_STEP * SMOOTHING_STEP;
        snapped.min(SMOOTHING_MAX) as u32
    }

    /// Whether a pace value lies strictly inside the plausible band.
    ///
    /// Non-finite values (zero-length windows) are never inside.
    #[inline]
    pub fn in_band(&self, pace: f64) -> bool {
        pace > self.min_pace && pace < self.max_pace
    }
}

/// Derive the raw windowed pace series, before band filtering.
///
/// The result has exactly `max(0, points.len() - window - 1)` samples, ordered by time.
/// A window covering zero distance yields an infinite or NaN pace rather than an error.
///
/// # Example
///
/// ```rust
/// use trace_selector::{TrackPoint, pace};
///
/// let track: Vec<TrackPoint> = (0..10)
///     .map(|i| TrackPoint::new(i * 30, 51.5 + i as f64 * 0.001, -0.12, true))
///     .collect();
///
/// let series = pace::derive_pace_series_unfiltered(&track, 2);
/// assert_eq!(series.len(), 7);
/// assert_eq!(series[0].time, 45.0);
/// ```
pub fn derive_pace_series_unfiltered(points: &[TrackPoint], window: usize) -> Vec<SpeedSample> {
    let Some(span) = window.checked_add(1) else {
        return Vec::new();
    };
    if points.len() <= span {
        return Vec::new();
    }

    let running = cumulative_distances(points);

    (0..points.len() - span)
        .map(|i| {
            let a = &points[i];
            let b = &points[i + span];
            let distance_km = (running[i + span] - running[i]) / 1000.0;
            let elapsed_min = (b.time - a.time) as f64 / 60.0;

            SpeedSample {
                time: (a.time + b.time) as f64 * 0.5,
                speed: elapsed_min / distance_km,
            }
        })
        .collect()
}

/// Derive the smoothed pace series and keep only samples inside the plausible band.
///
/// Filtering can leave gaps on the time axis. Tracks with `len <= window + 1` points
/// produce an empty series.
pub fn derive_pace_series(points: &[TrackPoint], config: &PaceConfig) -> Vec<SpeedSample> {
    let raw = derive_pace_series_unfiltered(points, config.window as usize);
    let raw_len = raw.len();

    let series: Vec<SpeedSample> = raw
        .into_iter()
        .filter(|s| config.in_band(s.speed))
        .collect();

    debug!(
        "[Pace] window={} points={} samples={} kept={}",
        config.window,
        points.len(),
        raw_len,
        series.len()
    );

    series
}

/// Min/max pace over a series, or `None` if it is empty.
pub fn pace_extent(samples: &[SpeedSample]) -> Option<(f64, f64)> {
    samples.iter().fold(None, |acc, s| match acc {
        None => Some((s.speed, s.speed)),
        Some((lo, hi)) => Some((lo.min(s.speed), hi.max(s.speed))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::polyline_length;

    /// Points ~111m apart heading north, one every `step` seconds.
    fn steady_track(n: usize, step: i64) -> Vec<TrackPoint> {
        (0..n)
            .map(|i| TrackPoint::new(i as i64 * step, 45.0 + i as f64 * 0.001, 7.0, true))
            .collect()
    }

    #[test]
    fn test_unfiltered_length_invariant() {
        let track = steady_track(20, 30);
        for window in 0..25 {
            let expected = 20usize.saturating_sub(window + 1);
            assert_eq!(derive_pace_series_unfiltered(&track, window).len(), expected);
        }
    }

    #[test]
    fn test_short_tracks_are_empty() {
        assert!(derive_pace_series_unfiltered(&[], 0).is_empty());
        assert!(derive_pace_series_unfiltered(&steady_track(1, 30), 0).is_empty());
        assert!(derive_pace_series_unfiltered(&steady_track(3, 30), 2).is_empty());
        assert_eq!(derive_pace_series_unfiltered(&steady_track(2, 30), 0).len(), 1);
    }

    #[test]
    fn test_huge_window_is_empty() {
        let track = steady_track(5, 30);
        assert!(derive_pace_series_unfiltered(&track, usize::MAX).is_empty());
        assert!(derive_pace_series_unfiltered(&track, usize::MAX - 1).is_empty());
    }

    #[test]
    fn test_sample_matches_window_definition() {
        let track = steady_track(12, 20);
        let window = 3;
        let series = derive_pace_series_unfiltered(&track, window);

        let i = 4;
        let a = &track[i];
        let b = &track[i + window + 1];
        let km = polyline_length(&track[i..=i + window + 1]) / 1000.0;
        let expected = (b.time - a.time) as f64 / 60.0 / km;

        assert_eq!(series[i].time, (a.time + b.time) as f64 / 2.0);
        assert!((series[i].speed - expected).abs() < 1e-9);
    }

    #[test]
    fn test_series_is_time_ordered() {
        let series = derive_pace_series_unfiltered(&steady_track(30, 25), 5);
        assert!(series.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_deterministic() {
        let track = steady_track(40, 30);
        let config = PaceConfig::with_window(4);
        assert_eq!(derive_pace_series(&track, &config), derive_pace_series(&track, &config));
    }

    #[test]
    fn test_band_filter() {
        // 30s per ~111m is ~4.5 min/km, inside the band
        let mut track = steady_track(30, 30);
        // stationary stretch: zero distance produces infinite pace
        let last = *track.last().unwrap();
        for k in 1..=10 {
            track.push(TrackPoint::new(last.time + k * 30, last.latitude, last.longitude, true));
        }

        let config = PaceConfig::with_window(2);
        let raw = derive_pace_series_unfiltered(&track, 2);
        let kept = derive_pace_series(&track, &config);

        assert!(raw.iter().any(|s| !s.speed.is_finite()));
        assert!(kept.len() < raw.len());
        assert!(!kept.is_empty());
        assert!(kept.iter().all(|s| s.speed > 2.5 && s.speed < 7.0));
    }

    #[test]
    fn test_too_fast_dropped() {
        // 2s per ~111m is ~0.3 min/km
        let track = steady_track(10, 2);
        assert!(derive_pace_series(&track, &PaceConfig::with_window(1)).is_empty());
    }

    #[test]
    fn test_clamped_window() {
        assert_eq!(PaceConfig::with_window(0).clamped_window(), 0);
        assert_eq!(PaceConfig::with_window(44).clamped_window(), 40);
        assert_eq!(PaceConfig::with_window(45).clamped_window(), 50);
        assert_eq!(PaceConfig::with_window(1000).clamped_window(), 200);
    }

    #[test]
    fn test_pace_extent() {
        assert!(pace_extent(&[]).is_none());
        let samples = vec![
            SpeedSample { time: 0.0, speed: 4.0 },
            SpeedSample { time: 1.0, speed: 3.0 },
            SpeedSample { time: 2.0, speed: 6.0 },
        ];
        assert_eq!(pace_extent(&samples), Some((3.0, 6.0)));
    }
}
