use axum::{extract::State, routing::post, Json, Router};
use market_analysis::MomPopPolicy;
use market_orchestrator::{AnalysisOptions, FragmentationAnalysis};
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

const MAX_BUSINESSES_LIMIT: usize = 500;
const MAX_TOP_TARGETS: usize = 100;

/// Unset options fall back to the engine configuration.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub zip_code: String,
    pub industry: String,
    pub include_entropy: Option<bool>,
    pub include_nlp_analysis: Option<bool>,
    pub max_businesses: Option<usize>,
    pub top_targets: Option<usize>,
    pub mom_pop_policy: Option<MomPopPolicy>,
}

pub fn fragmentation_routes() -> Router<AppState> {
    Router::new().route("/api/fragmentation/analyze", post(analyze_fragmentation))
}

fn resolve_options(req: &AnalyzeRequest, defaults: AnalysisOptions) -> Result<AnalysisOptions, AppError> {
    let max_businesses = req.max_businesses.unwrap_or(defaults.max_businesses);
    if !(1..=MAX_BUSINESSES_LIMIT).contains(&max_businesses) {
        return Err(AppError::BadRequest(format!(
            "max_businesses must be between 1 and {MAX_BUSINESSES_LIMIT}"
        )));
    }
    let top_targets = req.top_targets.unwrap_or(defaults.top_targets);
    if !(1..=MAX_TOP_TARGETS).contains(&top_targets) {
        return Err(AppError::BadRequest(format!(
            "top_targets must be between 1 and {MAX_TOP_TARGETS}"
        )));
    }
    Ok(AnalysisOptions {
        include_entropy: req.include_entropy.unwrap_or(defaults.include_entropy),
        include_nlp_analysis: req.include_nlp_analysis.unwrap_or(defaults.include_nlp_analysis),
        max_businesses,
        top_targets,
        mom_pop_policy: req.mom_pop_policy.unwrap_or(defaults.mom_pop_policy),
    })
}

async fn analyze_fragmentation(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<FragmentationAnalysis>>, AppError> {
    let options = resolve_options(&req, AnalysisOptions::from_config(&state.config))?;
    let analysis = state
        .engine
        .analyze_fragmentation(&req.zip_code, &req.industry, &options)
        .await?;
    Ok(Json(ApiResponse::success(analysis)))
}
