use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use market_core::BusinessSignals;
use serde::Deserialize;
use valuation_engine::{process_csv, BatchReport, BusinessValuation};

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ValuationRequest {
    #[serde(flatten)]
    pub signals: BusinessSignals,
    /// Overrides the configured Monte Carlo seed
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub seed: Option<u64>,
}

pub fn valuation_routes() -> Router<AppState> {
    Router::new()
        .route("/api/valuation", post(valuate_business))
        .route("/api/valuation/batch", post(valuate_batch))
}

/// Monte Carlo runs are CPU-bound, so they run off the async workers.
async fn valuate_business(
    State(state): State<AppState>,
    Json(req): Json<ValuationRequest>,
) -> Result<Json<ApiResponse<BusinessValuation>>, AppError> {
    let engine = state.engine.clone();
    let valuation = tokio::task::spawn_blocking(move || engine.valuate_business(&req.signals, req.seed))
        .await
        .map_err(|e| anyhow::anyhow!("Valuation task failed: {}", e))??;
    Ok(Json(ApiResponse::success(valuation)))
}

async fn valuate_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    body: String,
) -> Result<Json<ApiResponse<BatchReport>>, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("CSV body is empty".to_string()));
    }
    let base_seed = query.seed.unwrap_or(state.config.monte_carlo_seed);
    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || {
        process_csv(body.as_bytes(), engine.valuation_service(), base_seed)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Batch task failed: {}", e))??;

    tracing::info!(
        "Batch valuation: {} rows, {} failed",
        report.summary.processed,
        report.summary.failed
    );
    Ok(Json(ApiResponse::success(report)))
}
