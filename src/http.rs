//! HTTP activity source for the Strava v3 API.
//!
//! This module fetches what the explorer needs and nothing more:
//! - the athlete's activity list, for picking an activity
//! - the `time`, `latlng` and `moving` streams of one activity
//!
//! The access token is opaque here. Obtaining and refreshing it is the host's job;
//! a 401 surfaces as [`FetchError::Unauthorized`] so the host can re-authenticate.
//! 429 responses and transport errors are retried with exponential backoff.

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::activity::RawStreams;

const DEFAULT_BASE_URL: &str = "https://www.strava.com/api/v3";
const STREAM_KEYS: &str = "time,latlng,moving";
const MAX_RETRIES: u32 = 3;

/// Failure fetching from the activity source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    #[error("access token rejected, re-authentication required")]
    Unauthorized,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("max retries exceeded (429)")]
    RetriesExhausted,
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One entry of the athlete's activity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    /// ISO-8601 start time, e.g. `2024-05-01T07:12:00Z`
    pub start_date: String,
    /// Meters
    pub distance: f64,
}

impl ActivitySummary {
    /// Picker label: name, start date, rounded kilometers and id.
    pub fn label(&self) -> String {
        let date = self.start_date.split('T').next().unwrap_or(&self.start_date);
        format!(
            "{} {} {}km {}",
            self.name,
            date,
            (self.distance / 1000.0).round() as i64,
            self.id
        )
    }
}

/// API response for the streams endpoint with `key_by_type=true`
#[derive(Debug, Deserialize)]
struct StreamSetResponse {
    time: Option<Stream<i64>>,
    latlng: Option<Stream<[f64; 2]>>,
    moving: Option<Stream<bool>>,
}

#[derive(Debug, Deserialize)]
struct Stream<T> {
    data: Vec<T>,
}

impl From<StreamSetResponse> for RawStreams {
    fn from(set: StreamSetResponse) -> Self {
        RawStreams {
            time: set.time.map(|s| s.data).unwrap_or_default(),
            latlng: set.latlng.map(|s| s.data).unwrap_or_default(),
            moving: set.moving.map(|s| s.data).unwrap_or_default(),
        }
    }
}

/// Decode a `key_by_type=true` stream set body.
pub fn parse_stream_set(body: &[u8]) -> Result<RawStreams, FetchError> {
    let set: StreamSetResponse = serde_json::from_slice(body)?;
    Ok(set.into())
}

/// Backoff before retry number `attempt` (1-based): 500ms, 1s, 2s, 4s max.
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * (1 << attempt.saturating_sub(1).min(3)))
}

/// Bearer-token client for the activity source.
pub struct StravaClient {
    client: Client,
    auth_header: String,
    base_url: String,
}

impl StravaClient {
    /// Create a client for the public API with the given access token.
    pub fn new(access_token: &str) -> Result<Self, FetchError> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Create a client against another API root (proxies, test servers).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", access_token),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One page of the logged-in athlete's activities, newest first.
    pub async fn list_activities(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ActivitySummary>, FetchError> {
        let url = format!(
            "{}/athlete/activities?page={}&per_page={}",
            self.base_url, page, per_page
        );
        let body = self.get(&url).await?;
        let activities: Vec<ActivitySummary> = serde_json::from_slice(&body)?;
        info!("[ActivitySource] Listed {} activities (page {})", activities.len(), page);
        Ok(activities)
    }

    /// Raw `time`/`latlng`/`moving` streams of one activity.
    pub async fn fetch_streams(&self, activity_id: u64) -> Result<RawStreams, FetchError> {
        let url = format!(
            "{}/activities/{}/streams?keys={}&key_by_type=true",
            self.base_url, activity_id, STREAM_KEYS
        );
        let start = Instant::now();
        let body = self.get(&url).await?;
        let streams = parse_stream_set(&body)?;
        info!(
            "[ActivitySource] Activity {}: {} samples ({:.1}KB) in {:?}",
            activity_id,
            streams.sample_count(),
            body.len() as f64 / 1024.0,
            start.elapsed()
        );
        Ok(streams)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut retries = 0;

        loop {
            let response = self
                .client
                .get(url)
                .header("Authorization", &self.auth_header)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        retries += 1;
                        if retries > MAX_RETRIES {
                            return Err(FetchError::RetriesExhausted);
                        }
                        let wait = backoff(retries);
                        warn!("[ActivitySource] 429 Too Many Requests, retry {} with {:?} backoff", retries, wait);
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    if status == StatusCode::UNAUTHORIZED {
                        warn!("[ActivitySource] 401 for {}", url);
                        return Err(FetchError::Unauthorized);
                    }
                    if !status.is_success() {
                        return Err(FetchError::Status(status.as_u16()));
                    }

                    let bytes = resp.bytes().await?;
                    debug!("[ActivitySource] {} -> {} bytes", url, bytes.len());
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(FetchError::Request(e));
                    }
                    let wait = backoff(retries);
                    warn!("[ActivitySource] Error: {}, retry {} after {:?}", e, retries, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
