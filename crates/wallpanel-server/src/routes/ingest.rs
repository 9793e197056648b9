// wallpanel — turn a spare screen into a presence-aware wall display

//! Sensor ingest endpoints for the out-of-process camera and proximity
//! collaborators.

use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use wallpanel_core::{Frame, ProximitySample};

#[derive(Debug, Deserialize)]
pub struct RawFrameParams {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct FrameResponse {
    /// False when the analyzer's cadence skipped this frame.
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<f64>,
}

/// `POST /frames/raw?width=W&height=H` - raw luminance buffer from the
/// camera collaborator.
pub async fn ingest_raw_frame(
    State(state): State<AppState>,
    Query(params): Query<RawFrameParams>,
    body: Bytes,
) -> Json<FrameResponse> {
    let frame = Frame {
        data: body,
        width: params.width,
        height: params.height,
    };
    match state.session.analyze_frame(frame).await {
        Some(analysis) => Json(FrameResponse {
            processed: true,
            brightness: Some(analysis.brightness),
            motion: Some(analysis.motion),
        }),
        None => Json(FrameResponse {
            processed: false,
            brightness: None,
            motion: None,
        }),
    }
}

/// `POST /frames/jpeg` - pre-encoded JPEG, forwarded unchanged to stream
/// viewers.
pub async fn ingest_jpeg_frame(State(state): State<AppState>, body: Bytes) -> StatusCode {
    if body.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    state.session.publish_frame(body).await;
    StatusCode::NO_CONTENT
}

/// `POST /proximity` - raw sample from the proximity sensor collaborator.
pub async fn ingest_proximity(
    State(state): State<AppState>,
    Json(sample): Json<ProximitySample>,
) -> StatusCode {
    state.session.handle_proximity(sample).await;
    StatusCode::NO_CONTENT
}

/// `POST /activity` - qualifying activity (UI interaction, page-load
/// completion) that rearms the inactivity timer.
pub async fn ingest_activity(State(state): State<AppState>) -> StatusCode {
    state.session.notify_activity().await;
    StatusCode::NO_CONTENT
}
