//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video record and upload endpoints
//! - The upload pipeline from multipart body to stored object
//! - HS256 bearer token verification
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AuthUser, TokenAuthority};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{InMemoryVideoRepository, VideoRepository};
pub use routes::create_router;
pub use services::{BodyReadError, PipelineError, UploadPipeline};
pub use state::AppState;
