//! HTTP tests for projects and saved designs.
//!
//! These hit PostgreSQL through `#[sqlx::test]`, which creates a fresh
//! database per test from `DATABASE_URL`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, payload, TestApp};
use serde_json::json;
use sqlx::PgPool;

async fn create_project(app: &TestApp, name: &str) -> i64 {
    let response = app
        .post_json("/api/v1/projects", &json!({ "name": name }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

fn saved_design() -> serde_json::Value {
    json!({
        "image_url": "https://cdn.test/wolf.png",
        "style": "Blackwork",
        "body_placement": "forearm",
        "detail_level": "high",
        "modifier": "symmetrical",
        "description": "a wolf howling",
    })
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn project_crud_round_trip(pool: PgPool) {
    let app = TestApp::with_pool(pool);
    let id = create_project(&app, "  Sleeve ideas ").await;

    let json = body_json(app.get(&format!("/api/v1/projects/{id}")).await).await;
    assert_eq!(json["data"]["name"], "Sleeve ideas");

    let response = app
        .send(
            Request::put(format!("/api/v1/projects/{id}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "name": "Back piece" }).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Back piece");

    let list = body_json(app.get("/api/v1/projects").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let response = app
        .send(
            Request::delete(format!("/api/v1/projects/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/v1/projects/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn blank_project_name_is_rejected(pool: PgPool) {
    let app = TestApp::with_pool(pool);

    let response = app
        .post_json("/api/v1/projects", &json!({ "name": "   " }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Saved designs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn save_list_and_remove_design(pool: PgPool) {
    let app = TestApp::with_pool(pool);
    let project_id = create_project(&app, "Flash sheet").await;
    let uri = format!("/api/v1/projects/{project_id}/designs");

    let response = app.post_json(&uri, &saved_design()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let design = body_json(response).await;
    assert_eq!(design["data"]["negative_prompt"], "");
    let design_id = design["data"]["id"].as_i64().unwrap();

    let list = body_json(app.get(&uri).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let response = app
        .send(
            Request::delete(format!("{uri}/{design_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let list = body_json(app.get(&uri).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn designs_of_missing_project_are_404(pool: PgPool) {
    let app = TestApp::with_pool(pool);

    let response = app.get("/api/v1/projects/404/designs").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_json("/api/v1/projects/404/designs", &saved_design())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn saving_an_unfinished_request_conflicts(pool: PgPool) {
    let app = TestApp::with_pool(pool);
    let project_id = create_project(&app, "Flash sheet").await;
    let created = body_json(app.post_json("/api/v1/design-requests", &payload()).await).await;
    let request_id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .post_json(
            &format!("/api/v1/projects/{project_id}/designs"),
            &json!({ "design_request_id": request_id }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn incomplete_design_is_rejected(pool: PgPool) {
    let app = TestApp::with_pool(pool);
    let project_id = create_project(&app, "Flash sheet").await;

    let response = app
        .post_json(
            &format!("/api/v1/projects/{project_id}/designs"),
            &json!({ "style": "Blackwork" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "image_url is required");
}
