// wallpanel — turn a spare screen into a presence-aware wall display

//! HTTP control and ingest surface.
//!
//! The out-of-process collaborators (camera, proximity sensor, browser
//! shell, settings UI) reach the core through this router.

use crate::routes;
use crate::session::Session;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
}

pub fn build_router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/power",
            get(routes::power::get_power).post(routes::power::set_power),
        )
        .route("/frames/raw", post(routes::ingest::ingest_raw_frame))
        .route("/frames/jpeg", post(routes::ingest::ingest_jpeg_frame))
        .route("/proximity", post(routes::ingest::ingest_proximity))
        .route("/activity", post(routes::ingest::ingest_activity))
        .route(
            "/settings",
            get(routes::settings::get_settings).put(routes::settings::put_settings),
        )
        .route("/settings/reload", post(routes::settings::reload_settings))
        .with_state(AppState { session })
}

/// Serve the control API until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    session: Arc<Session>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control port {}", addr))?;
    info!("control api listening on http://{}", addr);

    axum::serve(listener, build_router(session))
        .with_graceful_shutdown(shutdown)
        .await
        .context("control api server terminated")
}
