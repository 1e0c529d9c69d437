//! HTTP adapter over the fragmentation and valuation engines.
//!
//! Handlers only shape requests and responses; all computation lives in the
//! library crates.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Json, Router,
};
use chrono::Utc;
use market_core::MarketError;
use market_orchestrator::{EngineConfig, FragmentationEngine};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod fragmentation_routes;
mod priors_routes;
mod request_id;
mod valuation_routes;
#[cfg(test)]
mod route_tests;

pub use request_id::RequestId;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FragmentationEngine>,
    pub config: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(engine: FragmentationEngine, config: EngineConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Market(MarketError),
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Market(e) => match e {
                MarketError::MissingInput(_) | MarketError::InvalidData(_) | MarketError::Csv(_) => {
                    StatusCode::BAD_REQUEST
                }
                MarketError::InsufficientData { .. } => StatusCode::NOT_FOUND,
                MarketError::SourceUnavailable(_) | MarketError::SourceFailed { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                MarketError::CalculationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Market(e) => write!(f, "{e}"),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => write!(f, "{msg}"),
            AppError::Internal(e) => write!(f, "{e:#}"),
        }
    }
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        AppError::Market(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        // internal details stay in the log
        let message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    provider: String,
    industries: usize,
    monte_carlo_runs: usize,
}

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "ok",
        provider: state.engine.provider_name().to_string(),
        industries: state.engine.priors().keys().count(),
        monte_carlo_runs: state.config.monte_carlo_runs,
    }))
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ApiResponse<()>>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ApiResponse::failure("Request timed out")),
        )
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure("Internal server error")),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(fragmentation_routes::fragmentation_routes())
        .merge(valuation_routes::valuation_routes())
        .merge(priors_routes::priors_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id::request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(request_id::make_request_span))
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(REQUEST_TIMEOUT),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    tracing::info!(
        "Starting market engine with {} simulated sources, {} Monte Carlo runs",
        config.simulated_sources,
        config.monte_carlo_runs
    );
    let engine = FragmentationEngine::simulated(&config, Utc::now());
    let app = build_router(AppState::new(engine, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
