//! Client tests against a local stand-in for the prediction API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use inkforge_core::prediction::{PredictionOutcome, PredictionStatus};
use inkforge_replicate::{CreatePrediction, ReplicateApi, ReplicateConfig, ReplicateError};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Captured {
    auth: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<Value>>>,
}

async fn create(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *captured.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *captured.body.lock().unwrap() = Some(body);
    (
        StatusCode::CREATED,
        Json(json!({"id": "abc123", "status": "starting", "output": null})),
    )
}

async fn fetch(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})));
    }
    (
        StatusCode::OK,
        Json(json!({"id": id, "status": "succeeded", "output": ["https://cdn/img.png"]})),
    )
}

async fn spawn_provider() -> (SocketAddr, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v1/predictions", post(create))
        .route("/v1/predictions/{id}", get(fetch))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

fn client(addr: SocketAddr) -> ReplicateApi {
    ReplicateApi::new(ReplicateConfig {
        api_url: format!("http://{addr}/v1/"),
        api_token: "r8_test".into(),
        model_version: "v1-hash".into(),
    })
}

#[tokio::test]
async fn create_prediction_sends_authenticated_body() {
    let (addr, captured) = spawn_provider().await;

    let prediction = client(addr)
        .create_prediction(&CreatePrediction {
            prompt: "Create a Blackwork tattoo".into(),
            negative_prompt: String::new(),
            image: Some("https://cdn/ref.png".into()),
            webhook: Some("https://hooks.example.com/api/v1/webhooks/replicate".into()),
        })
        .await
        .unwrap();

    assert_eq!(prediction.id, "abc123");
    assert_eq!(prediction.status, PredictionStatus::Starting);
    assert_eq!(prediction.outcome(), PredictionOutcome::InProgress);

    assert_eq!(
        captured.auth.lock().unwrap().as_deref(),
        Some("Bearer r8_test")
    );
    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["version"], "v1-hash");
    assert_eq!(body["input"]["image"], "https://cdn/ref.png");
    assert_eq!(body["webhook_events_filter"], json!(["completed"]));
}

#[tokio::test]
async fn get_prediction_returns_output() {
    let (addr, _) = spawn_provider().await;

    let prediction = client(addr).get_prediction("abc123").await.unwrap();
    assert_eq!(
        prediction.outcome(),
        PredictionOutcome::Succeeded {
            output_url: "https://cdn/img.png".into()
        }
    );
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let (addr, _) = spawn_provider().await;

    let err = client(addr).get_prediction("missing").await.unwrap_err();
    match err {
        ReplicateError::ApiError { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not found"));
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}
