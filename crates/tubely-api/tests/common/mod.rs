//! Shared fixtures for API and pipeline tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;
use tubely_api::{create_router, ApiConfig, AppState, InMemoryVideoRepository, UploadPipeline};
use tubely_media::{MediaConfig, RecordingExecutor, ScriptedOutcome};
use tubely_storage::InMemoryObjectStore;
use uuid::Uuid;

pub const BUCKET: &str = "tubely-videos";
pub const JWT_SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "tubely-test-boundary";

pub const LANDSCAPE_PROBE: &str = r#"{"streams": [
    {"index": 0, "codec_type": "video", "width": 1920, "height": 1080},
    {"index": 1, "codec_type": "audio"}
]}"#;

pub const PORTRAIT_PROBE: &str = r#"{"streams": [{"codec_type": "video", "width": 1080, "height": 1920}]}"#;

pub const REMUXED_BYTES: &[u8] = b"ftyp....moov....mdat....";

/// Probe then remux succeed with the given probe output.
pub fn scripted_success(probe: &str) -> RecordingExecutor {
    RecordingExecutor::new()
        .with_outcome(ScriptedOutcome::Stdout(probe.as_bytes().to_vec()))
        .with_outcome(ScriptedOutcome::WriteOutput(REMUXED_BYTES.to_vec()))
}

/// Every probe and remux succeeds, in any interleaving.
pub fn standing_success(probe: &str) -> RecordingExecutor {
    RecordingExecutor::new()
        .with_program_outcome("ffprobe", ScriptedOutcome::Stdout(probe.as_bytes().to_vec()))
        .with_program_outcome("ffmpeg", ScriptedOutcome::WriteOutput(REMUXED_BYTES.to_vec()))
}

pub fn memory_store() -> Arc<InMemoryObjectStore> {
    Arc::new(InMemoryObjectStore::new(BUCKET, b"store-signing-key".to_vec()))
}

pub fn pipeline(executor: Arc<RecordingExecutor>, store: Arc<InMemoryObjectStore>, dir: &Path) -> UploadPipeline {
    UploadPipeline::with_executor(executor, &MediaConfig::default(), store, dir)
}

/// Number of entries left in a staging directory.
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub executor: Arc<RecordingExecutor>,
    pub store: Arc<InMemoryObjectStore>,
    pub videos: Arc<InMemoryVideoRepository>,
    pub staging: TempDir,
}

impl TestApp {
    pub fn new(executor: RecordingExecutor) -> Self {
        Self::with_store(executor, memory_store())
    }

    pub fn with_store(executor: RecordingExecutor, store: Arc<InMemoryObjectStore>) -> Self {
        let staging = TempDir::new().unwrap();
        let executor = Arc::new(executor);
        let videos = Arc::new(InMemoryVideoRepository::new());

        let config = ApiConfig {
            upload_tmp_dir: staging.path().to_path_buf(),
            ..ApiConfig::with_secret(JWT_SECRET)
        };
        let state = AppState::from_parts(
            config,
            MediaConfig::default(),
            executor.clone(),
            store.clone(),
            videos.clone(),
        );

        Self {
            router: create_router(state.clone(), None),
            state,
            executor,
            store,
            videos,
            staging,
        }
    }

    pub fn token(&self, user_id: Uuid) -> String {
        self.state.auth.issue(user_id, Duration::from_secs(3600)).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn staged_entries(&self) -> usize {
        entries(self.staging.path())
    }
}

/// A multipart body with one file field.
pub fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"; filename=\"upload.bin\"\r\n", field).as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(video_id: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/video_upload/{}", video_id))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
