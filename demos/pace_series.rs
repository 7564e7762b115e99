//! Build a track from raw streams and compare smoothing windows.
//!
//! Run with: cargo run --example pace_series

use trace_selector::pace::{derive_pace_series_unfiltered, pace_extent};
use trace_selector::{build_track_points, derive_pace_series, PaceConfig, RawStreams};

fn main() {
    // A run with a two-minute stop in the middle and some interval-like pace changes
    let mut time = Vec::new();
    let mut latlng = Vec::new();
    let mut moving = Vec::new();
    let mut lat = 51.50;
    let mut t = 0;
    for i in 0..400 {
        let stopped = (180..190).contains(&i);
        if !stopped {
            lat += if (i / 50) % 2 == 0 { 0.0010 } else { 0.0006 };
        }
        time.push(t);
        latlng.push([lat, -0.12]);
        moving.push(!stopped);
        t += if stopped { 12 } else { 25 };
    }

    let track = build_track_points(&RawStreams { time, latlng, moving });
    let last = track.last().map(|p| p.time).unwrap_or(0);
    println!("Pace Series Example\n");
    println!("{} points, {} moving seconds (wall clock {}s)\n", track.len(), last, t);

    for window in [0, 10, 50, 100] {
        let config = PaceConfig::with_window(window);
        let raw = derive_pace_series_unfiltered(&track, window as usize);
        let kept = derive_pace_series(&track, &config);
        match pace_extent(&kept) {
            Some((lo, hi)) => println!(
                "window {:>3}: {:>3} samples, {:>3} in band, pace {:.2}..{:.2} min/km",
                window, raw.len(), kept.len(), lo, hi
            ),
            None => println!("window {:>3}: {:>3} samples, none in band", window, raw.len()),
        }
    }
}
