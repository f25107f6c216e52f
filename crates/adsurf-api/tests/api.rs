//! HTTP surface tests over the in-memory video backend.

use std::path::PathBuf;
use std::sync::Arc;

use adsurf_api::{create_router, ApiConfig, AppState};
use adsurf_media::MemoryBackend;
use adsurf_models::{Outcome, PhaseState, PipelineStatus, TuningConfig};
use adsurf_pipeline::{messages, PipelineConfig};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _tmp: TempDir,
    state: AppState,
    video: PathBuf,
    logo: PathBuf,
}

impl TestApp {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = PipelineConfig::with_work_dir(tmp.path());
        std::fs::create_dir_all(&pipeline.input_dir).unwrap();

        let video = pipeline.input_dir.join("clip.mp4");
        let logo = pipeline.input_dir.join("logo.png");
        RgbaImage::from_pixel(40, 20, Rgba([220, 20, 30, 255]))
            .save(&logo)
            .unwrap();

        let frames = (0..60u64)
            .map(|_| {
                let mut frame = RgbImage::from_pixel(200, 150, Rgb([0, 0, 0]));
                draw_filled_rect_mut(&mut frame, Rect::at(50, 40).of_size(100, 70), Rgb([230, 230, 230]));
                frame
            })
            .collect();
        let backend = MemoryBackend::new();
        backend.insert_video(&video, 30.0, frames, true);

        let state = AppState::with_backend(ApiConfig::default(), pipeline, Arc::new(backend));
        Self {
            _tmp: tmp,
            state,
            video,
            logo,
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone(), None)
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn scan_body(&self) -> Value {
        json!({
            "video": self.video.to_string_lossy(),
            "logo": self.logo.to_string_lossy(),
        })
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_conf_defaults_and_update() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/conf", None).await;
    assert_eq!(status, StatusCode::OK);
    let conf: TuningConfig = serde_json::from_value(body).unwrap();
    assert_eq!(conf, TuningConfig::default());

    let (status, body) = app
        .send(Method::PUT, "/api/conf", Some(json!({"window": 21, "dst_threshold": 8.0})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"], 21);

    let (_, body) = app.send(Method::GET, "/api/conf", None).await;
    let conf: TuningConfig = serde_json::from_value(body).unwrap();
    assert_eq!(conf.window, 21);
    assert_eq!(conf.dst_threshold, 8.0);
    assert_eq!(conf.kernel, 5);
}

#[tokio::test]
async fn test_conf_rejects_invalid_update() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::PUT, "/api/conf", Some(json!({"window": 4}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (_, body) = app.send(Method::GET, "/api/conf", None).await;
    assert_eq!(body["window"], 15);
}

#[tokio::test]
async fn test_insert_without_scan_conflicts() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/processing", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], messages::RUN_SCAN_FIRST);
}

#[tokio::test]
async fn test_scan_rejects_missing_paths() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::POST, "/api/processing", Some(json!({"video": "", "logo": "logo.png"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains(messages::BAD_INPUT));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/processing",
            Some(json!({"video": "missing.mp4", "logo": app.logo.to_string_lossy()})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_then_insert() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::POST, "/api/processing", Some(app.scan_body())).await;
    assert_eq!(status, StatusCode::OK);
    let scanned: PipelineStatus = serde_json::from_value(body).unwrap();
    assert_eq!(scanned.outcome, Outcome::Ready);
    assert_eq!(scanned.state, PhaseState::WaitingForReview);
    assert_eq!(scanned.instances.len(), 1);
    assert!(app.state.session.read().await.is_some());

    let (status, body) = app.send(Method::GET, "/api/processing?keep=0", None).await;
    assert_eq!(status, StatusCode::OK);
    let inserted: PipelineStatus = serde_json::from_value(body).unwrap();
    assert_eq!(inserted.outcome, Outcome::Completed);
    assert_eq!(inserted.message, messages::COMPLETED);
    assert!(inserted.output.unwrap().exists());
    assert!(app.state.session.read().await.is_none());
}

#[tokio::test]
async fn test_overlapping_run_conflicts() {
    let app = TestApp::new();
    let _running = app.state.pipeline.lock().await;
    let (status, _) = app.send(Method::POST, "/api/processing", Some(app.scan_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_keep_is_bad_request() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::GET, "/api/processing?keep=0,abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_is_accepted() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::DELETE, "/api/processing", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}
