// wallpanel — turn a spare screen into a presence-aware wall display

//! Settings endpoints: read, persist, and the explicit reload signal.

use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use wallpanel_core::Settings;

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.session.settings().await)
}

/// `PUT /settings` - persist a full settings record and apply it.
pub async fn put_settings(
    State(state): State<AppState>,
    Json(new): Json<Settings>,
) -> Result<Json<Settings>, (StatusCode, String)> {
    match state.session.update_settings(new).await {
        Ok(()) => Ok(Json(state.session.settings().await)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))),
    }
}

/// `POST /settings/reload` - re-read the settings file and apply it.
pub async fn reload_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.session.reload_settings().await)
}
