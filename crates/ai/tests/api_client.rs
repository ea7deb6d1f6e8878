//! Integration tests for `BannerApiClient` against a local mock backend.
//!
//! Each test binds an axum router on `127.0.0.1:0` that mimics the banner
//! backend's JSON contract and points the client at it.

use std::collections::HashMap;

use assert_matches::assert_matches;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use banner_ai::{AiClientError, BannerApiClient};
use banner_core::ai::{AiImageRequest, AiService, AiTextRequest};
use banner_core::config::{BannerConfig, ConfigPatch};
use banner_core::error::CoreError;
use banner_core::export::{ExportFormat, ExportRequest, ExportService};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

async fn optimize_text(Json(body): Json<Value>) -> Json<Value> {
    let original = body["originalText"].as_str().unwrap_or_default().to_uppercase();
    Json(json!({
        "optimizedText": format!("{original}!"),
        "suggestions": [format!("tone={}", body["style"].as_str().unwrap_or("none"))]
    }))
}

async fn generate_image(Json(body): Json<Value>) -> Json<Value> {
    let width = body["dimensions"]["width"].as_u64().unwrap_or_default();
    Json(json!({
        "imageUrl": format!("https://cdn.test/{width}.png"),
        "prompt": body["prompt"],
    }))
}

async fn export_banner(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(tree): Json<Value>,
) -> Json<Value> {
    let format = params.get("format").cloned().unwrap_or_default();
    let width = tree["width_px"].as_u64().unwrap_or_default();
    Json(json!({ "downloadUrl": format!("https://cdn.test/{id}-{width}.{format}") }))
}

async fn list_templates() -> Json<Value> {
    let template = BannerConfig::seeded(ConfigPatch {
        id: Some("tpl-1".to_string()),
        columns: Some(2),
        ..Default::default()
    });
    Json(json!([template]))
}

async fn failing() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "model overloaded")
}

async fn spawn_backend(router: Router) -> BannerApiClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    BannerApiClient::new(format!("http://{addr}/api"))
}

fn healthy_backend() -> Router {
    Router::new()
        .route("/api/ai/optimize-text", post(optimize_text))
        .route("/api/ai/generate-image", post(generate_image))
        .route("/api/banners/{id}/export", post(export_banner))
        .route("/api/templates", get(list_templates))
}

fn failing_backend() -> Router {
    Router::new()
        .route("/api/ai/optimize-text", post(failing))
        .route("/api/ai/generate-image", post(failing))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optimize_text_round_trip() {
    let client = spawn_backend(healthy_backend()).await;
    let response = AiService::optimize_text(&client, &AiTextRequest::new("big sale", "summer"))
        .await
        .unwrap();
    assert_eq!(response.optimized_text, "BIG SALE!");
    assert_eq!(response.suggestions, vec!["tone=marketing".to_string()]);
}

#[tokio::test]
async fn generate_image_sends_default_dimensions() {
    let client = spawn_backend(healthy_backend()).await;
    let response = AiService::generate_image(&client, &AiImageRequest::new("red shoe"))
        .await
        .unwrap();
    assert_eq!(response.image_url, "https://cdn.test/512.png");
    assert_eq!(response.prompt, "red shoe");
}

#[tokio::test]
async fn export_posts_render_tree_with_format() {
    let client = spawn_backend(healthy_backend()).await;
    let config = BannerConfig::seeded(ConfigPatch::id("b1"));
    let request = ExportRequest::for_config(&config, ExportFormat::Jpg);

    let result = client.export(&request).await.unwrap();
    assert_eq!(result.download_url, "https://cdn.test/b1-800.jpg");
}

#[tokio::test]
async fn export_requires_saved_banner() {
    let client = BannerApiClient::new("http://127.0.0.1:9/api");
    let request = ExportRequest::for_config(&BannerConfig::seeded(ConfigPatch::default()), ExportFormat::Png);
    assert_matches!(client.export(&request).await, Err(CoreError::Validation(_)));
}

#[tokio::test]
async fn templates_decode_as_banner_configs() {
    let client = spawn_backend(healthy_backend()).await;
    let templates = client.list_templates().await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].id, "tpl-1");
    assert_eq!(templates[0].columns, 2);
}

#[tokio::test]
async fn non_success_status_carries_status_and_body() {
    let client = spawn_backend(failing_backend()).await;
    let err = client
        .optimize_text(&AiTextRequest::new("big sale", ""))
        .await
        .unwrap_err();
    assert_matches!(err, AiClientError::Api { status: 503, body } if body == "model overloaded");
}

#[tokio::test]
async fn service_failure_maps_to_core_service_error() {
    let client = spawn_backend(failing_backend()).await;
    let err = AiService::generate_image(&client, &AiImageRequest::new("red shoe"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Service(msg) if msg.contains("503"));
}

#[tokio::test]
async fn invalid_request_never_reaches_backend() {
    // Nothing listens on the discard port; validation must fail first.
    let client = BannerApiClient::new("http://127.0.0.1:9/api");
    let err = AiService::optimize_text(&client, &AiTextRequest::new("   ", ""))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}
