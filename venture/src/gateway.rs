//! HTTP surface of the simulator.
//!
//! - POST /api/simulate: validate a startup configuration, then stream the
//!   trajectory frames as they are produced
//! - GET /health: liveness plus the active provider and model

use std::any::Any;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::unfold;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{ConfigError, GatewayConfig};
use crate::error::GenerationError;
use crate::llm::{create_client, GenerationClient};
use crate::trajectory::{DriverSettings, RunOutcome, TrajectoryDriver};
use crate::validation::validate_body;

pub const SIMULATE_PATH: &str = "/api/simulate";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("generation client unavailable: {0}")]
    Client(#[from] GenerationError),
    #[error("invalid bind address '{0}'")]
    BindAddr(String),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state of the gateway.
#[derive(Clone)]
pub struct GatewayState {
    client: Arc<dyn GenerationClient>,
    settings: DriverSettings,
    channel_capacity: usize,
}

impl GatewayState {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        settings: DriverSettings,
        channel_capacity: usize,
    ) -> Self {
        Self {
            client,
            settings,
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = create_client(&config.llm, config.allow_stub_provider)?;
        Ok(Self::new(
            client,
            DriverSettings::from_config(config),
            config.simulation.channel_capacity,
        ))
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(
            SIMULATE_PATH,
            post(handle_simulate).fallback(handle_method_not_allowed),
        )
        .route(HEALTH_PATH, get(handle_health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until Ctrl+C.
pub async fn serve(config: GatewayConfig) -> Result<(), GatewayError> {
    let state = GatewayState::from_config(&config)?;
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|_| GatewayError::BindAddr(config.bind_addr.clone()))?;

    let listener = TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        provider = %state.client.info().provider,
        model = %state.client.info().model,
        "Starting venture gateway"
    );

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Venture gateway stopped");
    Ok(())
}

/// Serve on an already bound listener, without a shutdown signal.
pub async fn serve_listener(listener: TcpListener, state: GatewayState) -> std::io::Result<()> {
    axum::serve(listener, router(state).into_make_service()).await
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Ctrl+C received, shutting down");
}

async fn handle_health(State(state): State<GatewayState>) -> impl IntoResponse {
    let info = state.client.info();
    Json(json!({
        "status": "ok",
        "provider": info.provider,
        "model": info.model,
    }))
}

async fn handle_simulate(State(state): State<GatewayState>, body: Bytes) -> Response {
    let config = match validate_body(&body) {
        Ok(config) => config,
        Err(details) => {
            warn!(errors = details.len(), "Rejected simulation request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Invalid input data",
                    "details": details,
                })),
            )
                .into_response();
        }
    };

    let driver = TrajectoryDriver::new(state.client.clone(), state.settings.clone());
    info!(
        run_id = %driver.run_id(),
        sector = %config.sector,
        nation = %config.nation,
        "Starting simulation"
    );
    let (rx, handle) = driver.spawn(config, state.channel_capacity);

    tokio::spawn(async move {
        match handle.await {
            Ok(RunOutcome::Completed { years }) => info!(years, "Simulation completed"),
            Ok(RunOutcome::Failed { year, message }) => {
                warn!(year, error = %message, "Simulation ended with an error frame")
            }
            Ok(RunOutcome::Abandoned { year }) => info!(year, "Simulation abandoned by client"),
            Err(e) => error!(error = %e, "Simulation task aborted"),
        }
    });

    let frames = unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|frame| (Ok::<_, Infallible>(frame), rx))
    });

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

async fn handle_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "success": false, "error": "Method not allowed" })),
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(%detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Internal server error" })),
    )
        .into_response()
}
