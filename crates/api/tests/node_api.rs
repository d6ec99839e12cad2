//! HTTP-level integration tests for the node catalog endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, put_json, ALICE};
use serde_json::json;

fn names(page: &serde_json::Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn list_defaults_to_newest_first() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let page = body_json(get(&app, "/api/nodes", &token).await).await;

    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 1);
    assert_eq!(page["page_size"], 9);
    assert_eq!(names(&page), vec!["scheduler", "billing api", "warehouse"]);
}

#[tokio::test]
async fn list_filters_sorts_and_paginates() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let page = body_json(get(&app, "/api/nodes?type=postgres", &token).await).await;
    assert_eq!(names(&page), vec!["warehouse"]);

    let page = body_json(get(&app, "/api/nodes?q=BILL", &token).await).await;
    assert_eq!(names(&page), vec!["billing api"]);

    let page = body_json(
        get(&app, "/api/nodes?sort=name&order=asc&page=2&page_size=2", &token).await,
    )
    .await;
    assert_eq!(page["total"], 3);
    assert_eq!(names(&page), vec!["warehouse"]);
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let response = get(&app, "/api/nodes?page_size=101", &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_node_and_reject_duplicate_name() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);
    let body = json!({
        "name": "lake",
        "type": "postgres",
        "connection_string": "postgresql://localhost/lake"
    });

    let response = post_json(&app, "/api/nodes", &token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "unknown");
    assert_eq!(json["type"], "postgres");

    let response = post_json(&app, "/api/nodes", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Name already exists");
}

#[tokio::test]
async fn tables_of_postgres_node() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let json = body_json(get(&app, "/api/nodes/pg/tables", &token).await).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["tables"].as_array().unwrap().len(), 3);

    let json = body_json(get(&app, "/api/nodes/pg/tables?schema=staging", &token).await).await;
    assert_eq!(json["tables"], json!([{ "schema": "staging", "name": "raw_orders" }]));
}

#[tokio::test]
async fn resource_listings_check_node_type() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let response = get(&app, "/api/nodes/af/tables", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Node type must be postgres");

    let response = get(&app, "/api/nodes/pg/dags", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(&app, "/api/nodes/af/dags", &token).await).await;
    assert_eq!(json["dags"][0]["dag_id"], "nightly_load");
}

#[tokio::test]
async fn unknown_node_returns_404() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let response = get(&app, "/api/nodes/nope/tables", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Node not found");
}

#[tokio::test]
async fn update_node_changes_only_given_fields() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let response = put_json(
        &app,
        "/api/nodes/pg",
        &token,
        json!({ "name": "warehouse", "connection_string": "postgresql://replica/dw" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], "pg");
    assert_eq!(json["name"], "warehouse");
    assert_eq!(json["type"], "postgres");
    assert_eq!(json["connection_string"], "postgresql://replica/dw");
    assert!(json["updated_at"].is_string());

    let tables = body_json(get(&app, "/api/nodes/pg/tables", &token).await).await;
    assert_eq!(tables["tables"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn update_node_rejects_taken_name_unknown_id_and_bad_type() {
    let app = common::build_seeded_app().await;
    let token = app.token(ALICE);

    let taken = put_json(&app, "/api/nodes/pg", &token, json!({ "name": "scheduler" })).await;
    assert_eq!(taken.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(taken).await["error"], "Name already exists");

    let missing = put_json(&app, "/api/nodes/nope", &token, json!({ "name": "x" })).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error"], "Node not found");

    let bad_type = put_json(&app, "/api/nodes/pg", &token, json!({ "type": "spark" })).await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_node_requires_auth() {
    let app = common::build_seeded_app().await;

    let response = common::send(
        &app,
        axum::http::Method::PUT,
        "/api/nodes/pg",
        None,
        Some(json!({ "name": "x" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
