//! # Geographic Utilities
//!
//! Geographic primitives shared by the pace deriver, the lasso and the trip statistics.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two track points |
//! | [`polyline_length`] | Total length of a track in meters |
//! | [`cumulative_distances`] | Running distance along a track, one entry per point |
//! | [`polygon_from_rings`] | Build a polygon from GeoJSON-style `[lng, lat]` rings |
//! | [`polygon_contains`] | Boundary-inclusive point-in-polygon test |
//!
//! ## Example
//!
//! ```rust
//! use trace_selector::{TrackPoint, geo_utils};
//!
//! let track = vec![
//!     TrackPoint::new(0, 51.5074, -0.1278, true),
//!     TrackPoint::new(10, 51.5080, -0.1290, true),
//!     TrackPoint::new(20, 51.5090, -0.1300, true),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! println!("Track length: {:.0}m", length);
//!
//! let running = geo_utils::cumulative_distances(&track);
//! assert_eq!(running.len(), track.len());
//! assert!((running[2] - length).abs() < 1e-9);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances use the haversine great-circle formula on a spherical Earth (radius 6,371 km),
//! accurate to within 0.3% for activity-scale tracks.
//!
//! ### Coordinate System
//!
//! Track points carry WGS84 latitude/longitude in degrees. Polygons drawn on the map use
//! GeoJSON ordering, `[longitude, latitude]`, and are tested in that same planar space.

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, Distance, Haversine, LineString, Point, Polygon};
use crate::TrackPoint;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two track points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use trace_selector::{TrackPoint, geo_utils};
///
/// let london = TrackPoint::new(0, 51.5074, -0.1278, true);
/// let paris = TrackPoint::new(0, 48.8566, 2.3522, true);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &TrackPoint, p2: &TrackPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Calculate the total length of a polyline (track) in meters.
///
/// Sums the haversine distance between consecutive points. Empty or single-point
/// tracks return 0.0.
pub fn polyline_length(points: &[TrackPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Running polyline length in meters, one entry per point.
///
/// `result[0]` is always 0.0 and `result[j] - result[i]` is the length of the sub-path
/// `points[i..=j]`. This lets callers measure any contiguous window in O(1).
pub fn cumulative_distances(points: &[TrackPoint]) -> Vec<f64> {
    let mut running = Vec::with_capacity(points.len());
    let mut total = 0.0;

    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(&points[i - 1], p);
        }
        running.push(total);
    }

    running
}

// =============================================================================
// Polygon Functions
// =============================================================================

/// Build a polygon from GeoJSON-style rings of `[lng, lat]` positions.
///
/// The first ring is the exterior, any further rings are holes. Rings do not need to
/// be explicitly closed. Returns `None` when the exterior has fewer than three positions
/// or contains non-finite coordinates.
pub fn polygon_from_rings(rings: &[Vec<[f64; 2]>]) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    if exterior.len() < 3 {
        return None;
    }
    if rings
        .iter()
        .flatten()
        .any(|c| !c[0].is_finite() || !c[1].is_finite())
    {
        return None;
    }

    let to_line = |ring: &Vec<[f64; 2]>| {
        LineString::new(ring.iter().map(|c| Coord { x: c[0], y: c[1] }).collect())
    };

    Some(Polygon::new(
        to_line(exterior),
        holes.iter().map(to_line).collect(),
    ))
}

/// Point-in-polygon test for a track point.
///
/// Points lying exactly on the polygon boundary (edges or vertices) count as inside.
/// Points inside a hole are outside.
///
/// # Example
///
/// ```rust
/// use trace_selector::{TrackPoint, geo_utils};
///
/// let square = geo_utils::polygon_from_rings(&[vec![
///     [0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0],
/// ]]).unwrap();
///
/// assert!(geo_utils::polygon_contains(&square, &TrackPoint::new(0, 1.0, 1.0, true)));
/// assert!(geo_utils::polygon_contains(&square, &TrackPoint::new(0, 0.0, 1.0, true)));
/// assert!(!geo_utils::polygon_contains(&square, &TrackPoint::new(0, 3.0, 1.0, true)));
/// ```
#[inline]
pub fn polygon_contains(polygon: &Polygon<f64>, point: &TrackPoint) -> bool {
    let coord = Coord { x: point.longitude, y: point.latitude };
    matches!(
        polygon.coordinate_position(&coord),
        CoordPos::Inside | CoordPos::OnBoundary
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
