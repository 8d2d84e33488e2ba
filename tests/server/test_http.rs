// HTTP API routes, sharing one engine across requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use ripple_impact::engine::ImpactEngine;
use ripple_server::http::router;

use super::common;

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_impact_builds_on_miss_then_hits() {
    let dir = common::scenario_project();
    let path = dir.path().display().to_string();
    let engine = Arc::new(ImpactEngine::new(4));

    let resp = router(Arc::clone(&engine))
        .oneshot(post(
            "/impact",
            serde_json::json!({ "repo_path": path, "commit_id": "c1", "changed_files": ["mod.py"] }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tests = body_json(resp).await;
    assert_eq!(tests[0]["test_id"], "test_mod.py::test_add");

    let resp = router(engine)
        .oneshot(post("/build", serde_json::json!({ "repo_path": path, "commit_id": "c1" })))
        .await
        .unwrap();
    let report = body_json(resp).await;
    assert_eq!(report["cache_hit"], true);
}

#[tokio::test]
async fn test_concurrent_queries_share_one_snapshot() {
    let dir = common::scenario_project();
    let path = dir.path().display().to_string();
    let engine = Arc::new(ImpactEngine::new(4));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = router(Arc::clone(&engine));
        let body = serde_json::json!({
            "repo_path": path,
            "commit_id": "c1",
            "changed_files": ["mod.py"],
        });
        handles.push(tokio::spawn(async move {
            let resp = app.oneshot(post("/impact", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            body_json(resp).await
        }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_run_endpoint_with_stand_in_runner() {
    let dir = common::scenario_project();
    let mut config = ripple_core::config::RippleConfig::default();
    config.runner.command = common::grep_runner("a + b", "mod.py");
    config.save(&dir.path().join(ripple_core::config::RIPPLE_DIR)).unwrap();

    let resp = router(Arc::new(ImpactEngine::new(4)))
        .oneshot(post(
            "/run",
            serde_json::json!({
                "repo_path": dir.path().display().to_string(),
                "test_ids": ["test_mod.py::test_add"],
                "timeout_s": 30
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome = body_json(resp).await;
    assert_eq!(outcome["passed"][0], "test_mod.py::test_add");
    assert_eq!(outcome["failed"].as_array().unwrap().len(), 0);
}
