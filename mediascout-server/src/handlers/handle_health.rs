use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::infra::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub directories: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitStatus>,
    /// `up` or `down`; absent when no minidlna status URL is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minidlna: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub window_secs: u64,
    pub in_window: usize,
    pub blocked_for_ms: Option<u128>,
}

pub async fn health_handler(
    State(state): State<AppState>,
) -> Json<HealthResponse> {
    let rate_limit = match &state.limiter {
        Some(limiter) => {
            let snapshot = limiter.snapshot().await;
            Some(RateLimitStatus {
                limit: snapshot.limit,
                window_secs: snapshot.window.as_secs(),
                in_window: snapshot.in_window,
                blocked_for_ms: snapshot.blocked_for.map(|d| d.as_millis()),
            })
        }
        None => None,
    };

    let minidlna = match &state.minidlna {
        Some(client) => client
            .status()
            .await
            .map(|up| if up { "up" } else { "down" }),
        None => None,
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        directories: state.directories.len(),
        rate_limit,
        minidlna,
    })
}
