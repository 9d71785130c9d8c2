//! Video record handlers.

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use tubely_models::{CreateVideoRequest, Video, VideoId};
use tubely_storage::PlaybackUrlSigner;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Replace a record's stored coordinates with a fresh playback URL.
///
/// Records without an uploaded video are returned unchanged.
pub async fn sign_video(signer: &PlaybackUrlSigner, mut video: Video) -> ApiResult<Video> {
    let Some(stored) = video.video_url.as_deref() else {
        return Ok(video);
    };

    let playback = signer.resolve_stored(stored).await?;
    video.video_url = Some(playback.url);
    video.video_url_expires_at = Some(playback.expires_at);
    Ok(video)
}

/// The `:video_id` path segment, parsed. Rejects with 400 before any
/// later extractor (including authentication) runs.
#[derive(Debug, Clone, Copy)]
pub struct VideoIdPath(pub VideoId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for VideoIdPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        raw.parse()
            .map(Self)
            .map_err(|_| ApiError::bad_request(format!("Invalid video ID: {}", raw)))
    }
}

/// Load a video and check the caller owns it.
pub async fn load_owned_video(state: &AppState, user: &AuthUser, video_id: &VideoId) -> ApiResult<Video> {
    let video = state
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Couldn't find video"))?;

    if !video.is_owned_by(user.user_id) {
        return Err(ApiError::forbidden("Not authorized to access this video"));
    }

    Ok(video)
}

/// Create a draft video owned by the caller.
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateVideoRequest>,
) -> ApiResult<(StatusCode, Json<Video>)> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let video = Video::new(user.user_id, request.title, request.description);
    state.videos.create(&video).await?;

    info!(video_id = %video.id, user_id = %user.user_id, "Created video");

    Ok((StatusCode::CREATED, Json(video)))
}

/// List the caller's videos with playback URLs.
pub async fn list_videos(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<Video>>> {
    let videos = state.videos.list_by_user(user.user_id).await?;

    let mut signed = Vec::with_capacity(videos.len());
    for video in videos {
        signed.push(sign_video(&state.signer, video).await?);
    }

    Ok(Json(signed))
}

/// Get one video with a playback URL.
pub async fn get_video(
    State(state): State<AppState>,
    VideoIdPath(video_id): VideoIdPath,
    user: AuthUser,
) -> ApiResult<Json<Video>> {
    let video = load_owned_video(&state, &user, &video_id).await?;

    Ok(Json(sign_video(&state.signer, video).await?))
}
