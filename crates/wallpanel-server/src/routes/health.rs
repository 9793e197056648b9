// wallpanel — turn a spare screen into a presence-aware wall display

//! `GET /health` - liveness plus a snapshot of the core state.

use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use wallpanel_core::ScreenState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub screen: ScreenState,
    pub viewers: usize,
    pub stream_running: bool,
    pub last_brightness: f64,
    pub started_at: DateTime<Utc>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = &state.session;
    Json(HealthResponse {
        status: "ok",
        screen: session.screen_state(),
        viewers: session.viewer_count().await,
        stream_running: session.stream_running().await,
        last_brightness: session.last_brightness(),
        started_at: session.started_at(),
    })
}
