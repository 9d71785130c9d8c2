//! Faststart remuxing.
//!
//! Object-store-hosted MP4s must have their `moov` index ahead of the media
//! data, or a player has to fetch the whole object before playback starts.
//! The remux copies every stream unchanged and only rewrites the container.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempPath;
use tracing::{debug, info};

use crate::command::{CommandExecutor, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// Suffix appended to the input path to name the remux output.
pub const PROCESSING_SUFFIX: &str = ".processing";

/// Remux output path for `input`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

/// A remuxed file on disk, removed when dropped.
#[derive(Debug)]
pub struct RemuxedFile {
    path: TempPath,
    size: u64,
}

impl RemuxedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Rewrites MP4 containers for progressive playback via ffmpeg.
#[derive(Clone)]
pub struct FaststartRemuxer {
    executor: Arc<dyn CommandExecutor>,
    program: String,
}

impl FaststartRemuxer {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    pub fn command(input: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .stream_copy()
            .faststart()
            .format("mp4")
    }

    /// Remux `input` to `<input>.processing`.
    ///
    /// The input is left in place. The output is owned by the returned
    /// [`RemuxedFile`]; on failure any partial output is removed before
    /// returning.
    pub async fn remux(&self, input: &Path) -> MediaResult<RemuxedFile> {
        // Guard the output path before ffmpeg can create it.
        let output = TempPath::from_path(output_path_for(input));

        let invocation = Self::command(input, &output).to_invocation(&self.program);
        debug!(input = %input.display(), "Remuxing for faststart");

        self.executor
            .execute(&invocation)
            .await
            .map_err(MediaError::remux)?;

        let size = tokio::fs::metadata(&output)
            .await
            .map_err(|e| MediaError::remux(MediaError::Io(e)))?
            .len();

        info!(output = %output.display(), size, "Remuxed for faststart");

        Ok(RemuxedFile { path: output, size })
    }
}
