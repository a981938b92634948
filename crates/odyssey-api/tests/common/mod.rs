//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use odyssey_core::backend::GenerationBackend;
use odyssey_core::wire::WireFormat;
use odyssey_generation::application::command_handlers::GenerationSettings;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use odyssey_api::state::AppState;

/// API token accepted by apps built here.
pub const TEST_TOKEN: &str = "integration-token";

/// Build the full app router around `backend`, with default generation
/// settings and `Spaced` responses. Uses the same route structure as
/// `main.rs`.
pub fn build_test_app(backend: Arc<dyn GenerationBackend>) -> Router {
    build_test_app_with(backend, GenerationSettings::default(), WireFormat::Spaced)
}

/// Build the full app router with explicit settings and response format.
pub fn build_test_app_with(
    backend: Arc<dyn GenerationBackend>,
    settings: GenerationSettings,
    response_format: WireFormat,
) -> Router {
    let app_state = AppState::new(
        backend,
        settings,
        response_format,
        HashSet::from([TEST_TOKEN.to_owned()]),
        CancellationToken::new(),
    );
    odyssey_api::build_router(app_state)
}

/// Send an authenticated POST request with a JSON body and return the
/// response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Token {TEST_TOKEN}"))
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
