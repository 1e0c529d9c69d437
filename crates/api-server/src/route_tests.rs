use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use data_sources::StaticProvider;
use market_core::CategoryPriorTable;
use market_orchestrator::{EngineConfig, FragmentationEngine};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{build_router, AppState};

fn test_config() -> EngineConfig {
    EngineConfig {
        monte_carlo_runs: 100,
        ..EngineConfig::default()
    }
}

/// Helper: router over the seeded simulated sources.
fn simulated_app() -> Router {
    let config = test_config();
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let engine = FragmentationEngine::simulated(&config, as_of);
    build_router(AppState::new(engine, config))
}

/// Helper: router whose only source knows no businesses.
fn empty_app() -> Router {
    let config = test_config();
    let engine = FragmentationEngine::new(
        Arc::new(StaticProvider::new("empty", Vec::new())),
        Arc::new(CategoryPriorTable::builtin()),
        config.monte_carlo(),
    );
    build_router(AppState::new(engine, config))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_ok_with_request_id() {
    let response = simulated_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let upstream = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = simulated_app().oneshot(upstream).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn analyze_returns_wrapped_analysis() {
    let (status, body) = send(
        simulated_app(),
        post_json(
            "/api/fragmentation/analyze",
            json!({ "zip_code": "94107", "industry": "hvac", "top_targets": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());
    assert_eq!(body["data"]["targets"].as_array().map(Vec::len), Some(3));
    assert!(body["data"]["hhi"].as_f64().is_some());
}

#[tokio::test]
async fn blank_zip_is_bad_request() {
    let (status, body) = send(
        simulated_app(),
        post_json("/api/fragmentation/analyze", json!({ "zip_code": "", "industry": "hvac" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("zip"));
}

#[tokio::test]
async fn out_of_range_options_are_rejected() {
    let (status, _) = send(
        simulated_app(),
        post_json(
            "/api/fragmentation/analyze",
            json!({ "zip_code": "94107", "industry": "hvac", "max_businesses": 0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_market_is_not_found() {
    let (status, body) = send(
        empty_app(),
        post_json("/api/fragmentation/analyze", json!({ "zip_code": "10001", "industry": "hvac" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no businesses found"));
}

#[tokio::test]
async fn valuation_accepts_flat_signals() {
    let request = json!({
        "business_name": "Corner Bakery",
        "industry": "bakery",
        "zip_code": "60614",
        "seed": 5,
        "operational": {
            "average_rating": 4.6,
            "review_count": 180,
            "reviews_last_12m": 60,
            "business_age_years": 7.0
        },
        "popularity_index": 55.0
    });
    let (status, body) = send(simulated_app(), post_json("/api/valuation", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valuation"]["seed"], 5);
    assert_eq!(body["data"]["valuation"]["runs"], 100);
}

#[tokio::test]
async fn valuation_with_bad_rating_is_bad_request() {
    let request = json!({
        "business_name": "Nope",
        "industry": "bakery",
        "operational": { "average_rating": 6.5, "review_count": 1, "reviews_last_12m": 1, "business_age_years": 1.0 }
    });
    let (status, _) = send(simulated_app(), post_json("/api/valuation", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_reports_row_errors() {
    let csv = "business_name,industry,average_rating,review_count,reviews_last_12m\n\
        Good Co,hvac,4.5,120,40\n\
        Bad Co,hvac,,10,5\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/valuation/batch?seed=11")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();
    let (status, body) = send(simulated_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["succeeded"], 1);
    assert_eq!(body["data"]["errors"][0]["row"], 2);

    let empty = Request::builder()
        .method(Method::POST)
        .uri("/api/valuation/batch")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(simulated_app(), empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn priors_list_and_lookup() {
    let (status, body) = send(simulated_app(), get("/api/priors")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().is_some_and(|p| p.len() > 1));

    let (status, body) = send(simulated_app(), get("/api/priors/Restaurant")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["key"], "restaurant");

    let (status, _) = send(simulated_app(), get("/api/priors/spaceflight")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
