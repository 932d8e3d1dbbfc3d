//! Router tests with a scripted sampler and vision model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use vidscope_api::{create_router, ApiConfig, AppState};
use vidscope_models::{Job, JobId};
use vidscope_store::{JobStore, MemoryJobStore, StoreError, StoreResult};
use vidscope_worker::testing::{ScriptedSampler, ScriptedVision};
use vidscope_worker::{JobExecutor, WorkerConfig};

// base64("fake mp4 bytes")
const VIDEO_B64: &str = "ZmFrZSBtcDQgYnl0ZXM=";

fn test_router(root: &TempDir, sampler: ScriptedSampler) -> Router {
    let executor = JobExecutor::new(
        WorkerConfig::with_work_dir(root.path()),
        Arc::new(sampler),
        Arc::new(ScriptedVision::new()),
        Arc::new(MemoryJobStore::new()),
    );
    let state = AppState::with_executor(ApiConfig::default(), Arc::new(executor));
    create_router(state, None)
}

/// Store whose every call fails.
struct BrokenStore;

#[async_trait]
impl JobStore for BrokenStore {
    async fn get(&self, _id: &JobId) -> StoreResult<Option<Job>> {
        Err(StoreError::config("connection refused at 10.0.0.7:6379"))
    }

    async fn set(&self, _id: &JobId, _job: &Job, _ttl: Duration) -> StoreResult<()> {
        Err(StoreError::config("connection refused at 10.0.0.7:6379"))
    }

    async fn delete(&self, _id: &JobId) -> StoreResult<()> {
        Err(StoreError::config("connection refused at 10.0.0.7:6379"))
    }
}

fn broken_store_router(environment: &str) -> Router {
    let config = ApiConfig {
        environment: environment.to_string(),
        ..ApiConfig::default()
    };
    let state = AppState::misconfigured(config, Arc::new(BrokenStore), "store down");
    create_router(state, None)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/video-analysis")
        .body(body.into())
        .unwrap()
}

async fn submit(app: &Router) -> String {
    let (status, body) = send(app, post(VIDEO_B64)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["jobId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_empty_post_rejected() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    let (status, body) = send(&app, post(Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No video data provided"}));
}

#[tokio::test]
async fn test_invalid_base64_rejected() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    let (status, body) = send(&app, post("%%% not base64 %%%")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid video data encoding"}));
}

#[tokio::test]
async fn test_unknown_job_not_found() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    let (status, body) = send(&app, get("/video-analysis/progress?jobId=nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Job not found"}));

    let (status, _) = send(&app, get("/video-analysis?jobId=nope&type=results")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_job_id() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    for uri in ["/video-analysis/progress", "/video-analysis?type=results"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Job ID is required"}));
    }
}

#[tokio::test]
async fn test_submit_and_poll_to_completion() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(5));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/video-analysis")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"videoData": format!("data:video/mp4;base64,{VIDEO_B64}")}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let mut last_progress = 0;
    let mut finished = false;
    for _ in 0..200 {
        let (status, body) = send(&app, get(&format!("/video-analysis?jobId={job_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let progress = body["progress"].as_u64().unwrap();
        assert!(progress >= last_progress, "progress went backwards");
        last_progress = progress;
        if body["status"] == "done" {
            finished = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(finished, "job did not finish");
    assert_eq!(last_progress, 100);

    let (status, body) = send(
        &app,
        get(&format!("/video-analysis/results?jobId={job_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let frames = body["result"]["frames"].as_array().unwrap();
    let timestamps: Vec<u64> = frames
        .iter()
        .map(|f| f["timestamp"].as_u64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![1, 2, 3, 4, 5]);
    assert!(frames[0]["imageData"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));
    assert!(!body["result"]["summary"].as_str().unwrap().is_empty());

    let (_, again) = send(
        &app,
        get(&format!("/video-analysis?jobId={job_id}&type=results")),
    )
    .await;
    assert_eq!(again, body);
}

#[tokio::test]
async fn test_results_pending_while_running() {
    let root = TempDir::new().unwrap();
    let app = test_router(
        &root,
        ScriptedSampler::new(3).with_delay(Duration::from_secs(5)),
    );

    let job_id = submit(&app).await;
    let (status, body) = send(
        &app,
        get(&format!("/video-analysis/results?jobId={job_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Analysis not complete yet");
    assert!(body["status"] == "queued" || body["status"] == "processing");
}

#[tokio::test]
async fn test_options_answers_empty_ok() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    for uri in ["/video-analysis", "/anything/else"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }
}

#[tokio::test]
async fn test_unsupported_method() {
    let root = TempDir::new().unwrap();
    let app = test_router(&root, ScriptedSampler::new(1));

    for (method, uri) in [
        (Method::PUT, "/video-analysis"),
        (Method::DELETE, "/video-analysis"),
        (Method::POST, "/video-analysis/progress"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}

#[tokio::test]
async fn test_misconfigured_server() {
    let state = AppState::misconfigured(
        ApiConfig::default(),
        Arc::new(MemoryJobStore::new()),
        "GEMINI_API_KEY is not set",
    );
    let app = create_router(state, None);

    let (status, body) = send(&app, post(VIDEO_B64)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Server misconfiguration: GEMINI_API_KEY is not set"})
    );

    // Polling still works.
    let (status, _) = send(&app, get("/video-analysis/progress?jobId=nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["vision"]["status"], "error");
}

#[tokio::test]
async fn test_store_errors_redacted_in_production() {
    let app = broken_store_router("production");

    let (status, body) = send(&app, get("/video-analysis/progress?jobId=abc")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "An internal error occurred"}));

    // Misconfiguration messages are meant for the operator and stay visible.
    let (status, body) = send(&app, post(VIDEO_B64)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Server misconfiguration: store down"}));
}

#[tokio::test]
async fn test_store_errors_detailed_in_development() {
    let app = broken_store_router("development");

    let (status, body) = send(&app, get("/video-analysis/results?jobId=abc")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Store error:"), "{error}");
    assert!(error.contains("connection refused"), "{error}");
}
