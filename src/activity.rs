//! Track construction from raw activity streams.
//!
//! An activity source delivers three parallel streams per activity: wall-clock
//! timestamps, `[lat, lng]` positions and a moving flag. The track used everywhere
//! else carries a *moving-time* clock instead of wall-clock time, so pauses do not
//! stretch the time axis or inflate pace.

use log::warn;
use crate::TrackPoint;

/// Parallel raw streams for one activity, as delivered by the activity source.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "http", derive(serde::Serialize, serde::Deserialize))]
pub struct RawStreams {
    /// Seconds since activity start, wall clock
    pub time: Vec<i64>,
    /// `[latitude, longitude]` pairs
    pub latlng: Vec<[f64; 2]>,
    pub moving: Vec<bool>,
}

impl RawStreams {
    /// Number of samples present in all three streams.
    pub fn sample_count(&self) -> usize {
        self.time.len().min(self.latlng.len()).min(self.moving.len())
    }
}

/// Build the moving-time track from raw streams.
///
/// The clock starts at the first timestamp. Sample 0 only seeds the clock and is not
/// emitted; every later sample `i` is emitted with the current clock, after which the
/// clock advances by `time[i] - time[i - 1]` only if sample `i` is moving.
///
/// Streams of unequal length are truncated to their common prefix. Samples with
/// out-of-range or non-finite coordinates are skipped, but their moving time still counts.
///
/// # Example
///
/// ```rust
/// use trace_selector::activity::{build_track_points, RawStreams};
///
/// let streams = RawStreams {
///     time: vec![100, 110, 130, 160],
///     latlng: vec![[45.0, 7.0], [45.001, 7.0], [45.002, 7.0], [45.003, 7.0]],
///     moving: vec![true, true, false, true],
/// };
///
/// let track = build_track_points(&streams);
/// let times: Vec<i64> = track.iter().map(|p| p.time).collect();
/// assert_eq!(times, vec![100, 110, 110]);
/// ```
pub fn build_track_points(streams: &RawStreams) -> Vec<TrackPoint> {
    let n = streams.sample_count();
    if n != streams.time.len() || n != streams.latlng.len() || n != streams.moving.len() {
        warn!(
            "[ActivitySource] Stream length mismatch (time={}, latlng={}, moving={}), using {}",
            streams.time.len(),
            streams.latlng.len(),
            streams.moving.len(),
            n
        );
    }
    if n < 2 {
        return Vec::new();
    }

    let mut clock = streams.time[0];
    let mut points = Vec::with_capacity(n - 1);
    let mut skipped = 0;

    for i in 1..n {
        let [lat, lng] = streams.latlng[i];
        let moving = streams.moving[i];
        let point = TrackPoint::new(clock, lat, lng, moving);
        if point.is_valid() {
            points.push(point);
        } else {
            skipped += 1;
        }
        if moving {
            clock += streams.time[i] - streams.time[i - 1];
        }
    }

    if skipped > 0 {
        warn!("[ActivitySource] Skipped {} samples with invalid coordinates", skipped);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(time: Vec<i64>, moving: Vec<bool>) -> RawStreams {
        let latlng = (0..time.len()).map(|i| [45.0 + i as f64 * 0.001, 7.0]).collect();
        RawStreams { time, latlng, moving }
    }

    #[test]
    fn test_first_sample_dropped() {
        let track = build_track_points(&streams(vec![0, 5, 10], vec![true, true, true]));
        assert_eq!(track.len(), 2);
        assert!((track[0].latitude - 45.001).abs() < 1e-12);
        assert_eq!(track[0].time, 0);
        assert_eq!(track[1].time, 5);
    }

    #[test]
    fn test_stationary_samples_freeze_clock() {
        let s = streams(vec![0, 10, 20, 30, 40, 50], vec![true, true, false, false, true, true]);
        let times: Vec<i64> = build_track_points(&s).iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0, 10, 10, 10, 20]);
    }

    #[test]
    fn test_clock_is_non_decreasing() {
        let s = streams(
            vec![3, 4, 9, 9, 15, 40, 41],
            vec![false, true, true, false, true, false, true],
        );
        let track = build_track_points(&s);
        assert!(track.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_moving_flag_carried() {
        let track = build_track_points(&streams(vec![0, 1, 2], vec![true, false, true]));
        assert!(!track[0].moving);
        assert!(track[1].moving);
    }

    #[test]
    fn test_short_and_empty_streams() {
        assert!(build_track_points(&RawStreams::default()).is_empty());
        assert!(build_track_points(&streams(vec![0], vec![true])).is_empty());
    }

    #[test]
    fn test_invalid_coordinates_skipped() {
        let mut s = streams(vec![0, 10, 20, 30, 40], vec![true; 5]);
        s.latlng[2] = [f64::NAN, 7.0];
        s.latlng[3] = [95.0, 7.0];

        let track = build_track_points(&s);
        let times: Vec<i64> = track.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0, 30]);
        assert!(track.iter().all(|p| p.is_valid()));
    }

    #[test]
    fn test_mismatched_lengths_truncate() {
        let mut s = streams(vec![0, 10, 20, 30], vec![true, true, true, true]);
        s.moving.truncate(3);
        assert_eq!(s.sample_count(), 3);
        assert_eq!(build_track_points(&s).len(), 2);
    }
}
