use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::chart::{self, ChartSpec};
use crate::config::Config;
use crate::error::{AppError, ChartError};
use crate::loader::TickSource;
use crate::stream;

/// Everything the handlers need, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppState {
    pub source: TickSource,
    pub pacing: Duration,
    pub chart: ChartSpec,
    pub allowed_origin: HeaderValue,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let allowed_origin = HeaderValue::from_str(config.server.allowed_origin.trim())
            .map_err(|_| AppError::Origin(config.server.allowed_origin.clone()))?;
        Ok(Self {
            source: config.data.tick_source(),
            pacing: config.stream.pacing(),
            chart: ChartSpec::tick_chart(),
            allowed_origin,
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(state: AppState) -> Router {
    // Credentials rule out wildcards, so methods and headers mirror the request.
    // A list (not an exact origin) leaves the header off for foreign origins.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([state.allowed_origin.clone()]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/ws/ticks", get(ws_ticks))
        .route("/bokeh-embed", get(bokeh_embed))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        csv_path = %state.source.path.display(),
        allowed_origin = %config.server.allowed_origin,
        pacing_ms = config.stream.pacing_ms,
        "Starting tick-embed"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

async fn ws_ticks(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| async move {
        tracing::info!(path = "/ws/ticks", "WebSocket connected");
        // Outcome is logged inside; the socket is closed either way.
        let _ = stream::run_tick_stream(socket, state.source.clone(), state.pacing).await;
    })
}

async fn bokeh_embed(State(state): State<Arc<AppState>>) -> Response {
    let render_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        chart::embed_tick_chart(&render_state.source, &render_state.chart)
    })
    .await;

    match result {
        Ok(Ok(artifact)) => {
            tracing::info!(path = "/bokeh-embed", element_id = %artifact.element_id, "Chart embed served");
            (StatusCode::OK, Json(artifact)).into_response()
        }
        Ok(Err(e)) => chart_error_response(e),
        Err(e) => {
            tracing::error!(path = "/bokeh-embed", error = %e, "Chart render task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "chart render task failed".to_string())
        }
    }
}

fn chart_error_response(err: ChartError) -> Response {
    if err.is_client_error() {
        tracing::warn!(path = "/bokeh-embed", error = %err, "Chart embed rejected");
        error_response(StatusCode::BAD_REQUEST, err.to_string())
    } else {
        tracing::error!(path = "/bokeh-embed", error = %err, "Chart embed failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}
