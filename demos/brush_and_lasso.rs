//! Brushing the pace chart, then lassoing on the map, over one synthetic run.
//!
//! Run with: cargo run --example brush_and_lasso

use trace_selector::{DrawnFeature, Explorer, InputEvent, Key, PaceConfig, LassoKeymap, TrackPoint};

fn main() {
    // ~111m north every 30s along a meridian in Paris
    let track: Vec<TrackPoint> = (0..200)
        .map(|i| TrackPoint::new(i * 30, 48.85 + i as f64 * 0.001, 2.30, true))
        .collect();

    let mut explorer = Explorer::new(PaceConfig::with_window(10), LassoKeymap::default());
    explorer.dispatch(InputEvent::ActivityLoaded(track));

    let stats = explorer.trip_stats();
    println!("Trip Explorer Example\n");
    println!("Whole trip: {} | {} | {}",
        stats.distance_label(),
        stats.duration_label(),
        stats.pace_label().unwrap_or_default());
    println!("Pace samples: {}\n", explorer.pace_series().len());

    // 1. Brush the pace chart between minute 20 and minute 40
    explorer.dispatch(InputEvent::BrushStarted);
    explorer.dispatch(InputEvent::BrushMoved { x0: 1200.0, x1: 2400.0 });
    explorer.dispatch(InputEvent::BrushEnded);
    println!("1. Brushed [20min, 40min]: {} points selected", explorer.model().selected_indexes().len());
    if let Some(view) = explorer.brush_view() {
        println!("   Zoomed chart: {} samples, pace {:.2}..{:.2} min/km",
            view.visible.len(), view.visible_pace.0, view.visible_pace.1);
    }
    if let Some(sel) = explorer.selection_stats() {
        println!("   Selection: {} | {}\n", sel.distance_label(), sel.duration_label());
    }

    // 2. Lasso a box around the first kilometer; it replaces the brush selection
    explorer.dispatch(InputEvent::KeyPressed(Key::Char('x')));
    explorer.dispatch(InputEvent::GeometryEdited(vec![DrawnFeature::polygon(vec![
        [2.29, 48.8495],
        [2.31, 48.8495],
        [2.31, 48.8595],
        [2.29, 48.8595],
    ])]));
    println!("2. Lasso ({:?}): {} points selected\n",
        explorer.lasso_mode(), explorer.model().selected_indexes().len());

    // 3. Delete them
    explorer.dispatch(InputEvent::KeyPressed(Key::Backspace));
    println!("3. After delete: {} points, {} pace samples",
        explorer.model().points().len(), explorer.pace_series().len());
}
