//! HTTP API integration tests
//!
//! Exercises the axum router end to end against a running engine using
//! in-process requests.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use helpers::{eventually, start_engine};
use http_body_util::BodyExt;
use onair_engine::api::{create_router, AppContext};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> (onair_engine::store::MemoryDocumentStore, Router) {
    let (store, shared, engine) = start_engine().await;
    let app = create_router(AppContext { shared, engine });
    (store, app)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_health_endpoint() {
    let (_store, app) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "onair_engine");
}

#[tokio::test(start_paused = true)]
async fn test_toggle_and_state_roundtrip() {
    let (store, app) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/onair/field/logo", json!({ "visible": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let store_probe = store.clone();
    eventually(|| {
        let store = store_probe.clone();
        async move {
            store
                .document(helpers::DOC_PATH)
                .field(onair_common::FieldName::Logo)
                .visible
        }
    })
    .await;

    let response = app.oneshot(get("/onair/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["logo"]["visible"], json!(true));
    assert_eq!(body["session"]["phase"], "normal");
}

#[tokio::test(start_paused = true)]
async fn test_gated_toggle_maps_to_unprocessable_entity() {
    let (_store, app) = test_app().await;

    let response = app
        .oneshot(post_json("/onair/field/guest", json!({ "visible": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_field_maps_to_bad_request() {
    let (_store, app) = test_app().await;

    let response = app
        .oneshot(post_json("/onair/field/weather", json!({ "visible": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_busy_toggle_maps_to_conflict() {
    let (_store, app) = test_app().await;

    let first = app
        .clone()
        .oneshot(post_json("/onair/field/logo", json!({ "visible": true })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/onair/field/logo", json!({ "visible": false })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn test_airing_start_and_cancel_endpoints() {
    let (_store, app) = test_app().await;

    // Cancel with nothing running is a conflict
    let response = app
        .clone()
        .oneshot(post_json("/onair/airing/cancel", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(post_json(
            "/onair/airing/start",
            json!({ "field": "guest", "content": { "name": "Ana" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/onair/state"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["session"]["phase"], "countdown");
    assert_eq!(body["session"]["field"], "guest");

    let response = app
        .oneshot(post_json("/onair/airing/cancel", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_event_stream_delivers_toggle_events() {
    let (_store, app) = test_app().await;

    // Connect before toggling so the frame is not missed
    let response = app.clone().oneshot(get("/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let toggled = app
        .oneshot(post_json("/onair/field/logo", json!({ "visible": true })))
        .await
        .unwrap();
    assert_eq!(toggled.status(), StatusCode::OK);

    let mut body = response.into_body();
    let mut collected = String::new();
    tokio::time::timeout(std::time::Duration::from_secs(60), async {
        while let Some(frame) = body.frame().await {
            let frame = frame.unwrap();
            if let Some(data) = frame.data_ref() {
                collected.push_str(std::str::from_utf8(data).unwrap());
                if collected.contains("event: FieldVisibilityChanged") {
                    return;
                }
            }
        }
        panic!("SSE stream ended without the toggle event");
    })
    .await
    .expect("SSE frame not received before timeout");

    assert!(collected.contains("\"field\":\"logo\""));
    assert!(collected.contains("\"visible\":true"));
}

#[tokio::test(start_paused = true)]
async fn test_airing_start_without_content_maps_to_unprocessable_entity() {
    let (_store, app) = test_app().await;

    let response = app
        .oneshot(post_json("/onair/airing/start", json!({ "field": "guest" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
