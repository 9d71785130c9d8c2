//! The upload pipeline: stage, inspect, remux, key, upload.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{info, warn};
use tubely_media::{AspectInspector, CommandExecutor, FaststartRemuxer, MediaConfig, MediaError, StagedFile};
use tubely_models::{ContentType, MediaKind, ObjectLocation, ValidationError};
use tubely_storage::{derive_key, ObjectStore, StorageError};

use crate::metrics;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unable to read upload body: {0}")]
    Body(BodyReadError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Body(_) => "body",
            PipelineError::Media(MediaError::Probe(_)) => "probe",
            PipelineError::Media(MediaError::Parse(_)) => "parse",
            PipelineError::Media(MediaError::Remux(_)) => "remux",
            PipelineError::Media(e) if e.is_subprocess_failure() => "subprocess",
            PipelineError::Media(_) => "staging",
            PipelineError::Storage(StorageError::SigningFailed(_)) => "signing",
            PipelineError::Storage(_) => "storage",
        }
    }

    /// Lift a client body failure out of a staging error; anything else stays a media error.
    fn from_staging(err: MediaError) -> Self {
        if let MediaError::Io(io_err) = &err {
            if let Some(body) = BodyReadError::find(io_err) {
                return PipelineError::Body(body.clone());
            }
        }
        PipelineError::Media(err)
    }
}

/// The client's upload body could not be read.
///
/// Travels through the staging copy inside an `io::Error`, so it can be told
/// apart from local disk failures.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BodyReadError {
    pub message: String,
    pub too_large: bool,
}

impl BodyReadError {
    pub fn new(message: impl Into<String>, too_large: bool) -> Self {
        Self {
            message: message.into(),
            too_large,
        }
    }

    pub fn into_io(self) -> io::Error {
        io::Error::other(self)
    }

    fn find(err: &io::Error) -> Option<&BodyReadError> {
        err.get_ref()?.downcast_ref::<BodyReadError>()
    }
}

/// Runs one upload from body stream to stored object.
///
/// Stages run strictly in order. Both temp files are released on every exit
/// path: the staged file when `ingest` returns, the remuxed file as soon as
/// the upload finishes. Dropping an in-flight `ingest` releases them too.
#[derive(Clone)]
pub struct UploadPipeline {
    inspector: AspectInspector,
    remuxer: FaststartRemuxer,
    store: Arc<dyn ObjectStore>,
    staging_dir: PathBuf,
}

impl UploadPipeline {
    pub fn new(
        inspector: AspectInspector,
        remuxer: FaststartRemuxer,
        store: Arc<dyn ObjectStore>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inspector,
            remuxer,
            store,
            staging_dir: staging_dir.into(),
        }
    }

    /// Build the inspector and remuxer on one executor.
    pub fn with_executor(
        executor: Arc<dyn CommandExecutor>,
        media: &MediaConfig,
        store: Arc<dyn ObjectStore>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            AspectInspector::new(executor.clone(), &media.ffprobe_path),
            FaststartRemuxer::new(executor, &media.ffmpeg_path),
            store,
            staging_dir,
        )
    }

    /// Check a declared content type against the video allow-list.
    pub fn validate(declared: Option<&str>) -> PipelineResult<ContentType> {
        Ok(MediaKind::Video.validate(declared)?)
    }

    /// Validate, then ingest. A rejected type reads nothing and writes nothing.
    pub async fn run<R>(&self, declared: Option<&str>, body: &mut R) -> PipelineResult<ObjectLocation>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let content_type = Self::validate(declared)?;
        self.ingest(&content_type, body).await
    }

    /// Ingest a body whose content type has already been validated.
    pub async fn ingest<R>(&self, content_type: &ContentType, body: &mut R) -> PipelineResult<ObjectLocation>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let started = Instant::now();
        let result = self.ingest_stages(content_type, body).await;

        match &result {
            Ok(location) => {
                metrics::record_pipeline_run("success", started.elapsed().as_secs_f64());
                info!(location = %location, duration_ms = %started.elapsed().as_millis(), "Upload ingested");
            }
            Err(e) => {
                metrics::record_pipeline_run(e.kind(), started.elapsed().as_secs_f64());
                warn!(error = %e, kind = e.kind(), "Upload pipeline failed");
            }
        }

        result
    }

    async fn ingest_stages<R>(&self, content_type: &ContentType, body: &mut R) -> PipelineResult<ObjectLocation>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let stage = Instant::now();
        let staged = StagedFile::from_reader(&self.staging_dir, content_type.extension(), body)
            .await
            .map_err(PipelineError::from_staging)?;
        metrics::record_stage_duration("stage", stage.elapsed().as_secs_f64());

        let stage = Instant::now();
        let aspect = self.inspector.inspect(staged.path()).await?;
        metrics::record_stage_duration("inspect", stage.elapsed().as_secs_f64());

        let stage = Instant::now();
        let remuxed = self.remuxer.remux(staged.path()).await?;
        metrics::record_stage_duration("remux", stage.elapsed().as_secs_f64());

        let key = derive_key(aspect, content_type)?;

        let stage = Instant::now();
        self.store.put_object(&key, remuxed.path(), content_type).await?;
        metrics::record_stage_duration("upload", stage.elapsed().as_secs_f64());

        info!(
            aspect = %aspect,
            key = %key,
            staged_bytes = staged.size(),
            remuxed_bytes = remuxed.size(),
            "Stored remuxed upload"
        );

        Ok(ObjectLocation::new(self.store.bucket(), key))
    }
}
