//! Video record persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tubely_models::{Video, VideoId};
use uuid::Uuid;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Video not found: {0}")]
    NotFound(VideoId),

    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Where video records live between requests.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, video: &Video) -> RepositoryResult<()>;

    async fn get(&self, id: &VideoId) -> RepositoryResult<Option<Video>>;

    /// Replace an existing record. Fails with `NotFound` if it was never created.
    async fn update(&self, video: &Video) -> RepositoryResult<()>;

    /// The user's videos, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Video>>;
}

/// Process-local repository.
#[derive(Debug, Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<VideoId, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(&self, video: &Video) -> RepositoryResult<()> {
        self.videos.write().await.insert(video.id, video.clone());
        Ok(())
    }

    async fn get(&self, id: &VideoId) -> RepositoryResult<Option<Video>> {
        Ok(self.videos.read().await.get(id).cloned())
    }

    async fn update(&self, video: &Video) -> RepositoryResult<()> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(video.id)),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.is_owned_by(user_id))
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}
