//! HTTP tests for the design request and generation routes, run against the
//! in-memory store and a scripted provider.

mod common;

use axum::http::StatusCode;
use common::{body_json, payload, TestApp, PNG_1X1};
use inkforge_core::design_request::DesignRequestStatus;
use inkforge_pipeline::DesignRequestStore;
use serde_json::json;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_pending_request() {
    let app = TestApp::new();

    let response = app.post_json("/api/v1/design-requests", &payload()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["style"], "Blackwork");
    assert!(json["data"]["external_job_id"].is_null());
    assert!(app.provider.calls().is_empty());
}

#[tokio::test]
async fn create_with_missing_fields_lists_each_field() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/v1/design-requests",
            &json!({ "style": "Blackwork", "modifier": "symmetrical" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Please enter a design description");
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["description", "bodyPlacement", "detailLevel"]);
    assert!(app.store.all().is_empty());
}

#[tokio::test]
async fn create_uploads_reference_image() {
    let app = TestApp::new();
    let mut body = payload();
    body["referenceImage"] = json!(format!("data:image/png;base64,{PNG_1X1}"));

    let response = app.post_json("/api/v1/design-requests", &body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let url = json["data"]["reference_image_url"].as_str().unwrap();
    assert!(url.starts_with("https://artifacts.test/public/reference-"));
    assert_eq!(app.artifacts.objects().len(), 1);
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_returns_generating_request() {
    let app = TestApp::new();
    app.provider.accept_next("abc123");

    let response = app
        .post_json("/api/v1/design-requests/submit", &payload())
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "generating");
    assert_eq!(json["data"]["external_job_id"], "abc123");

    let calls = app.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].webhook.as_deref(),
        Some("https://hooks.example.com/api/v1/webhooks/replicate")
    );
}

#[tokio::test]
async fn submit_provider_failure_is_generic_and_marks_failed() {
    let app = TestApp::new();
    app.provider.reject_next(422, "invalid version: secret detail");

    let response = app
        .post_json("/api/v1/design-requests/submit", &payload())
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "GENERATION_FAILED");
    assert!(!json.to_string().contains("secret detail"));

    let rows = app.store.all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, DesignRequestStatus::Failed);
    assert!(rows[0].external_job_id.is_none());
}

#[tokio::test]
async fn store_outage_returns_generic_500() {
    let app = TestApp::new();
    app.store.set_unavailable(true);

    let response = app
        .post_json("/api/v1/design-requests/submit", &payload())
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_view_reflects_store() {
    let app = TestApp::new();
    let created = body_json(app.post_json("/api/v1/design-requests", &payload()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .get(&format!("/api/v1/design-requests/{id}/status"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["data"],
        json!({ "id": id, "status": "pending", "generated_image_url": null })
    );
}

#[tokio::test]
async fn unknown_request_returns_404() {
    let app = TestApp::new();

    let response = app.get("/api/v1/design-requests/999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "DesignRequest with id 999 not found");
}

#[tokio::test]
async fn list_returns_newest_first_with_limit() {
    let app = TestApp::new();
    for _ in 0..3 {
        app.post_json("/api/v1/design-requests", &payload()).await;
    }

    let response = app.get("/api/v1/design-requests?limit=2").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] > ids[1]);
}

#[tokio::test]
async fn wait_returns_completed_status() {
    let app = TestApp::new();
    app.provider.accept_next("abc123");
    let submitted = body_json(
        app.post_json("/api/v1/design-requests/submit", &payload())
            .await,
    )
    .await;
    let id = submitted["data"]["id"].as_i64().unwrap();

    app.store
        .complete_by_job_id("abc123", "https://cdn.test/out.png")
        .await
        .unwrap();

    let response = app
        .get(&format!("/api/v1/design-requests/{id}/wait?timeout_secs=1"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["generated_image_url"], "https://cdn.test/out.png");
}

#[tokio::test]
async fn wait_gives_up_with_latest_status() {
    let app = TestApp::new();
    let created = body_json(app.post_json("/api/v1/design-requests", &payload()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .get(&format!("/api/v1/design-requests/{id}/wait?timeout_secs=0"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
}

// ---------------------------------------------------------------------------
// POST /generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_returns_prediction() {
    let app = TestApp::new();
    let created = body_json(app.post_json("/api/v1/design-requests", &payload()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();
    app.provider.accept_next("abc123");

    let mut body = payload();
    body["id"] = json!(id);
    let response = app.post_json("/api/v1/generate", &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["prediction"]["id"], "abc123");
    assert_eq!(
        app.store.get(id).unwrap().status,
        DesignRequestStatus::Generating
    );
}

#[tokio::test]
async fn generate_twice_is_rejected() {
    let app = TestApp::new();
    let created = body_json(app.post_json("/api/v1/design-requests", &payload()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();
    let mut body = payload();
    body["id"] = json!(id);

    app.post_json("/api/v1/generate", &body).await;
    let response = app.post_json("/api/v1/generate", &body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(app.provider.calls().len(), 1);
}

#[tokio::test]
async fn generate_failure_hides_provider_detail() {
    let app = TestApp::new();
    let created = body_json(app.post_json("/api/v1/design-requests", &payload()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();
    app.provider.reject_next(500, "upstream stack trace");

    let mut body = payload();
    body["id"] = json!(id);
    let response = app.post_json("/api/v1/generate", &body).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({ "success": false, "error": "Failed to start image generation" })
    );
    assert_eq!(app.store.get(id).unwrap().status, DesignRequestStatus::Failed);
}

#[tokio::test]
async fn generate_without_id_is_bad_request() {
    let app = TestApp::new();

    let response = app.post_json("/api/v1/generate", &payload()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
}
