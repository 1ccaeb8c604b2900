//! End-to-end tests for the gcalc HTTP API.
//!
//! Each test builds a fresh router over an in-process recording compiler and
//! drives it with `tower::ServiceExt::oneshot`; no network server is started.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use gcalc_server::config::ServerConfig;
use gcalc_server::router::build_router;
use gcalc_server::state::AppState;
use gcalc_session::testing::{CompilerCall, RecordingCompiler};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn test_app() -> (Router, RecordingCompiler) {
    let compiler = RecordingCompiler::new();
    let state = AppState::start(compiler.clone(), &ServerConfig::default())
        .expect("failed to start app state");
    (build_router(state), compiler)
}

async fn send(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(json!(null));
    (status, json)
}

async fn create(app: &Router) -> u64 {
    let (status, body) = send(app, "POST", "/equations", None).await;
    assert_eq!(status, StatusCode::OK, "create failed: {:?}", body);
    body["id"].as_u64().unwrap()
}

async fn edit(app: &Router, id: u64, text: &str) -> Value {
    let (status, body) = send(
        app,
        "PUT",
        &format!("/equations/{}", id),
        Some(json!({ "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "edit failed: {:?}", body);
    body
}

/// Polls `/frame` until `done` holds for the latest frame.
async fn wait_for_frame(app: &Router, done: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..200 {
        let (status, body) = send(app, "GET", "/frame", None).await;
        if status == StatusCode::OK && done(&body) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no matching frame was presented");
}

// ---------------------------------------------------------------------------
// Equations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_edit_and_list() {
    let (app, compiler) = test_app();
    let id = create(&app).await;

    let body = edit(&app, id, "y=x").await;
    assert_eq!(body["origin"]["outcome"], "compiled");
    assert_eq!(body["equation"]["kind"], "implicit");
    assert_eq!(body["equation"]["renderable"], true);
    assert_eq!(compiler.calls(), vec![CompilerCall::Relation("y=x".to_string())]);

    let (status, list) = send(&app, "GET", "/equations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["equations"].as_array().unwrap().len(), 1);
    assert_eq!(list["functions"], json!([]));
}

#[tokio::test]
async fn edit_reports_cascade() {
    let (app, _) = test_app();
    let a = create(&app).await;
    let plot = create(&app).await;

    let body = edit(&app, plot, "y=ax").await;
    assert_eq!(body["origin"]["outcome"], "unresolved");
    assert_eq!(body["origin"]["undefined"], json!(["a"]));
    assert_eq!(body["equation"]["has_error"], false);

    let body = edit(&app, a, "a=2").await;
    assert_eq!(body["origin"]["outcome"], "evaluated");
    assert_eq!(body["origin"]["value"], 2.0);
    assert_eq!(body["equation"]["result_display"], "2");
    assert_eq!(body["cascade"][0]["id"], plot);
    assert_eq!(body["cascade"][0]["outcome"], "compiled");

    let (_, list) = send(&app, "GET", "/equations", None).await;
    assert_eq!(list["variables"], json!(["a"]));
}

#[tokio::test]
async fn validation_failure_is_equation_state_not_http_error() {
    let (app, _) = test_app();
    let f = create(&app).await;
    let clash = create(&app).await;
    edit(&app, f, "f(x)=x").await;

    let body = edit(&app, clash, "f=2").await;
    assert_eq!(body["origin"]["outcome"], "validation");
    assert_eq!(body["equation"]["has_error"], true);
    assert!(body["origin"]["error"]
        .as_str()
        .unwrap()
        .contains("already defined as a function"));
}

#[tokio::test]
async fn delete_releases_name_and_cascades() {
    let (app, compiler) = test_app();
    let a = create(&app).await;
    let plot = create(&app).await;
    edit(&app, a, "a=3").await;
    edit(&app, plot, "y=ax").await;

    let (status, body) = send(&app, "DELETE", &format!("/equations/{}", a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], json!({ "name": "a", "namespace": "variable" }));
    assert_eq!(body["cascade"][0]["outcome"], "unresolved");
    assert!(compiler
        .calls()
        .contains(&CompilerCall::DeleteVariable(gcalc_core::Symbol('a'))));

    let (status, _) = send(&app, "GET", &format!("/equations/{}", a), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_equation_is_not_found() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "PUT", "/equations/42", Some(json!({ "text": "y=x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    insta::assert_json_snapshot!(body, @r###"
    {
      "error": {
        "code": "NOT_FOUND",
        "message": "equation not found: EquationId(42)"
      },
      "success": false
    }
    "###);
}

#[tokio::test]
async fn visibility_toggle_and_refresh() {
    let (app, compiler) = test_app();
    let id = create(&app).await;
    edit(&app, id, "y=x").await;

    let (status, body) = send(&app, "POST", &format!("/equations/{}/visibility", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visible"], false);
    assert_eq!(compiler.compile_count(), 1);

    let (status, body) = send(&app, "POST", &format!("/equations/{}/refresh", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"]["outcome"], "compiled");
    assert_eq!(compiler.compile_count(), 2);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn viewport_actions() {
    let (app, _) = test_app();

    let (status, body) = send(&app, "GET", "/viewport", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["viewport"]["mantissa"], 1);
    assert_eq!(body["viewport"]["footprint"], 50);

    let (_, body) = send(&app, "PUT", "/viewport", Some(json!({ "action": "zoom_out" }))).await;
    assert_eq!(body["viewport"]["mantissa"], 2);

    let (_, body) = send(
        &app,
        "PUT",
        "/viewport",
        Some(json!({ "action": "pan", "dx": 10, "dy": -4 })),
    )
    .await;
    assert_eq!(body["viewport"]["origin"], json!([10, -4]));

    let (status, body) = send(
        &app,
        "PUT",
        "/viewport",
        Some(json!({
            "action": "set",
            "viewport": { "origin": [0, 0], "mantissa": 3, "exponent": 0, "footprint": 50 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, body) = send(&app, "PUT", "/viewport", Some(json!({ "action": "home" }))).await;
    assert_eq!(body["viewport"]["origin"], json!([0, 0]));
    assert_eq!(body["viewport"]["mantissa"], 1);
}

#[tokio::test]
async fn frame_follows_edits() {
    let (app, _) = test_app();
    let id = create(&app).await;

    let frame = wait_for_frame(&app, |_| true).await;
    assert_eq!(frame["slots"], json!([]));
    assert_eq!(frame["texture"]["height"], 1);

    edit(&app, id, "y=x").await;
    let frame = wait_for_frame(&app, |f| f["slots"].as_array().map_or(false, |s| s.len() == 1)).await;
    assert_eq!(frame["slots"][0]["id"], id);
    // StExpr(0), Push(1), Store, End
    assert_eq!(frame["instructions"], json!([[0, 0.0], [1, 1.0], [6, 0.0], [7, 0.0]]));
    assert!(frame["eval_source"].as_str().unwrap().contains("return y=x;"));
}

#[tokio::test]
async fn scan_classifies_without_a_session() {
    let (app, compiler) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/scan",
        Some(json!({ "text": "f\\left(x\\right)=a\\sin x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["normalized"], "f(x)=a\\sin x");
    assert_eq!(body["references"], json!(["a"]));
    assert_eq!(body["binding"], json!({ "kind": "function", "name": "f", "argument": "x" }));
    assert_eq!(body["free_symbols"], json!(["f", "x", "a"]));
    assert!(compiler.calls().is_empty());
}
