//! Application state.

use std::sync::Arc;

use tubely_media::{CommandExecutor, MediaConfig, ProcessExecutor};
use tubely_storage::{ObjectStore, PlaybackUrlSigner, S3Client};

use crate::auth::TokenAuthority;
use crate::config::ApiConfig;
use crate::repository::{InMemoryVideoRepository, VideoRepository};
use crate::services::UploadPipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub media: MediaConfig,
    pub auth: Arc<TokenAuthority>,
    pub store: Arc<dyn ObjectStore>,
    pub signer: PlaybackUrlSigner,
    pub pipeline: UploadPipeline,
    pub videos: Arc<dyn VideoRepository>,
}

impl AppState {
    /// Create application state from the environment: real ffprobe/ffmpeg,
    /// S3, and an in-memory video repository.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let media = MediaConfig::from_env();
        let executor: Arc<dyn CommandExecutor> =
            Arc::new(ProcessExecutor::new().with_timeout(media.subprocess_timeout));
        let store: Arc<dyn ObjectStore> = Arc::new(S3Client::from_env().await?);

        Ok(Self::from_parts(
            config,
            media,
            executor,
            store,
            Arc::new(InMemoryVideoRepository::new()),
        ))
    }

    /// Assemble state from explicit collaborators.
    pub fn from_parts(
        config: ApiConfig,
        media: MediaConfig,
        executor: Arc<dyn CommandExecutor>,
        store: Arc<dyn ObjectStore>,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        let pipeline = UploadPipeline::with_executor(executor, &media, store.clone(), &config.upload_tmp_dir);

        Self {
            auth: Arc::new(TokenAuthority::new(&config.jwt_secret)),
            signer: PlaybackUrlSigner::new(store.clone()),
            config,
            media,
            store,
            pipeline,
            videos,
        }
    }
}
