//! Fetch an activity from Strava and derive its pace series.
//!
//! Run with: STRAVA_TOKEN=... cargo run --example fetch_activity --features http [activity_id]

use std::env;
use trace_selector::{build_track_points, Explorer, FetchError, InputEvent, StravaClient};

#[tokio::main]
async fn main() {
    let token = match env::var("STRAVA_TOKEN") {
        Ok(t) => t,
        Err(_) => {
            eprintln!("Set STRAVA_TOKEN to an access token with activity:read_all");
            return;
        }
    };

    let client = match StravaClient::new(&token) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let activity_id = match env::args().nth(1).and_then(|a| a.parse::<u64>().ok()) {
        Some(id) => id,
        None => match client.list_activities(1, 30).await {
            Ok(activities) => {
                for a in &activities {
                    println!("  {}", a.label());
                }
                match activities.first() {
                    Some(a) => a.id,
                    None => {
                        println!("No activities");
                        return;
                    }
                }
            }
            Err(FetchError::Unauthorized) => {
                eprintln!("Token rejected, log in again");
                return;
            }
            Err(e) => {
                eprintln!("Listing failed: {}", e);
                return;
            }
        },
    };

    let streams = match client.fetch_streams(activity_id).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Fetching streams failed: {}", e);
            return;
        }
    };

    let mut explorer = Explorer::default();
    explorer.dispatch(InputEvent::ActivityLoaded(build_track_points(&streams)));

    let stats = explorer.trip_stats();
    println!("\nActivity {}", activity_id);
    println!("  {}", stats.distance_label());
    println!("  {}", stats.duration_label());
    println!("  {}", stats.pace_label().unwrap_or_else(|| "-".to_string()));
    println!("  {} pace samples", explorer.pace_series().len());
}
