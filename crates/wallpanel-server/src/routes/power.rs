// wallpanel — turn a spare screen into a presence-aware wall display

//! Display power endpoints.
//!
//! `GET  /power` - current screen state and the active configuration.
//! `POST /power` - explicit on/off request from the browser shell.

use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use wallpanel_core::{ScreenState, Settings};

#[derive(Debug, Serialize)]
pub struct PowerStatus {
    pub screen: ScreenState,
    pub settings: Settings,
}

pub async fn get_power(State(state): State<AppState>) -> Json<PowerStatus> {
    Json(PowerStatus {
        screen: state.session.screen_state(),
        settings: state.session.settings().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct SetScreenRequest {
    pub on: bool,
}

pub async fn set_power(
    State(state): State<AppState>,
    Json(body): Json<SetScreenRequest>,
) -> Json<PowerStatus> {
    state.session.set_screen(body.on).await;
    Json(PowerStatus {
        screen: state.session.screen_state(),
        settings: state.session.settings().await,
    })
}
