use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use market_core::CategoryPrior;

use crate::{ApiResponse, AppError, AppState};

pub fn priors_routes() -> Router<AppState> {
    Router::new()
        .route("/api/priors", get(list_priors))
        .route("/api/priors/:industry", get(get_prior))
}

async fn list_priors(State(state): State<AppState>) -> Json<ApiResponse<Vec<CategoryPrior>>> {
    Json(ApiResponse::success(state.engine.priors().iter().cloned().collect()))
}

/// Exact lookup only; unlike valuation, unknown industries are a 404 here.
async fn get_prior(
    State(state): State<AppState>,
    Path(industry): Path<String>,
) -> Result<Json<ApiResponse<CategoryPrior>>, AppError> {
    let prior = state
        .engine
        .priors()
        .lookup(&industry)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No prior for industry '{industry}'")))?;
    Ok(Json(ApiResponse::success(prior)))
}
