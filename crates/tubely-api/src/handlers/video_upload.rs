//! Video upload handler.

use std::io;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use futures_util::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::info;
use tubely_models::Video;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::{load_owned_video, sign_video, VideoIdPath};
use crate::services::{BodyReadError, UploadPipeline};
use crate::state::AppState;

/// Multipart field carrying the video body.
pub const VIDEO_FIELD: &str = "video";

/// Upload the video body for an existing record.
///
/// The record must belong to the caller. The body is validated, staged,
/// inspected, remuxed and stored; the record's `video_url` is then set to
/// the stored coordinates and the response carries a playback URL.
pub async fn upload_video(
    State(state): State<AppState>,
    VideoIdPath(video_id): VideoIdPath,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<Video>> {
    let mut video = load_owned_video(&state, &user, &video_id).await?;

    info!(video_id = %video_id, user_id = %user.user_id, "Uploading video");

    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(form_error)?
        {
            Some(field) if field.name() == Some(VIDEO_FIELD) => break field,
            Some(_) => continue,
            None => return Err(ApiError::bad_request("Missing 'video' form field")),
        }
    };

    // Rejected before anything touches disk or runs a tool.
    let content_type = UploadPipeline::validate(field.content_type())?;

    let body = StreamReader::new(field.map_err(body_read_error));
    tokio::pin!(body);

    let location = state.pipeline.ingest(&content_type, &mut body).await?;

    video.video_url = Some(location.to_stored());
    video.updated_at = Utc::now();
    state.videos.update(&video).await?;

    info!(video_id = %video_id, location = %location, "Video uploaded");

    Ok(Json(sign_video(&state.signer, video).await?))
}

/// Tag a multipart read failure so the pipeline reports it as a client fault.
fn body_read_error(err: MultipartError) -> io::Error {
    let too_large = err.status() == StatusCode::PAYLOAD_TOO_LARGE;
    BodyReadError::new(err.body_text(), too_large).into_io()
}

fn form_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::bad_request(format!("Unable to parse form: {}", err.body_text()))
    }
}
