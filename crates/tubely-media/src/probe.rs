//! FFprobe aspect inspection.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use tubely_models::AspectClass;

use crate::command::{CommandExecutor, Invocation};
use crate::error::{MediaError, MediaResult};

/// Frame size of the inspected stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl VideoDimensions {
    pub fn aspect_class(&self) -> AspectClass {
        AspectClass::from_dimensions(self.width, self.height)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Classifies a file's video stream via ffprobe.
#[derive(Clone)]
pub struct AspectInspector {
    executor: Arc<dyn CommandExecutor>,
    program: String,
}

impl AspectInspector {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    /// The ffprobe invocation for `path`.
    pub fn invocation(&self, path: &Path) -> Invocation {
        Invocation::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path.to_string_lossy())
    }

    /// Probe `path` and return its video stream's frame size.
    pub async fn dimensions(&self, path: &Path) -> MediaResult<VideoDimensions> {
        let output = self
            .executor
            .execute(&self.invocation(path))
            .await
            .map_err(MediaError::probe)?;

        parse_stream_dimensions(&output.stdout)
    }

    /// Probe `path` and classify its aspect ratio.
    pub async fn inspect(&self, path: &Path) -> MediaResult<AspectClass> {
        let dims = self.dimensions(path).await?;
        let class = dims.aspect_class();

        debug!(
            path = %path.display(),
            width = dims.width,
            height = dims.height,
            aspect = %class,
            "Inspected video"
        );

        Ok(class)
    }
}

/// Extract the frame size from ffprobe `-show_streams` JSON.
///
/// The first stream tagged `codec_type: video` is used; when no stream is
/// tagged, the first stream is. Empty stream lists and missing dimensions
/// are parse errors.
pub fn parse_stream_dimensions(stdout: &[u8]) -> MediaResult<VideoDimensions> {
    let probe: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| MediaError::parse(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .or_else(|| probe.streams.first())
        .ok_or_else(|| MediaError::parse("no streams in probe output"))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(VideoDimensions { width, height }),
        _ => Err(MediaError::parse("stream has no width/height")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{RecordingExecutor, ScriptedOutcome};

    const LANDSCAPE_PROBE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080},
            {"index": 1, "codec_name": "aac", "codec_type": "audio"}
        ]
    }"#;

    #[test]
    fn test_parse_video_stream() {
        let dims = parse_stream_dimensions(LANDSCAPE_PROBE.as_bytes()).unwrap();
        assert_eq!(dims, VideoDimensions { width: 1920, height: 1080 });
    }

    #[test]
    fn test_parse_skips_leading_audio_stream() {
        let json = r#"{"streams": [
            {"codec_type": "audio"},
            {"codec_type": "video", "width": 1080, "height": 1920}
        ]}"#;
        let dims = parse_stream_dimensions(json.as_bytes()).unwrap();
        assert_eq!(dims.aspect_class(), AspectClass::Portrait);
    }

    #[test]
    fn test_parse_untagged_uses_first_stream() {
        let json = r#"{"streams": [{"width": 1000, "height": 1000}, {"width": 1920, "height": 1080}]}"#;
        let dims = parse_stream_dimensions(json.as_bytes()).unwrap();
        assert_eq!(dims, VideoDimensions { width: 1000, height: 1000 });
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "",
            "not json",
            "{}",
            r#"{"streams": []}"#,
            r#"{"streams": [{"codec_type": "audio"}]}"#,
            r#"{"streams": [{"codec_type": "video", "width": -1, "height": 10}]}"#,
        ] {
            let err = parse_stream_dimensions(bad.as_bytes()).unwrap_err();
            assert!(matches!(err, MediaError::Parse(_)), "{bad:?} gave {err:?}");
        }
    }

    #[tokio::test]
    async fn test_inspect_invokes_ffprobe() {
        let executor = Arc::new(
            RecordingExecutor::new().with_outcome(ScriptedOutcome::Stdout(LANDSCAPE_PROBE.as_bytes().to_vec())),
        );
        let inspector = AspectInspector::new(executor.clone(), "ffprobe");

        let class = inspector.inspect(Path::new("/tmp/upload.mp4")).await.unwrap();
        assert_eq!(class, AspectClass::Landscape);

        let calls = executor.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].command_line(),
            "ffprobe -v error -print_format json -show_streams /tmp/upload.mp4"
        );
    }

    #[tokio::test]
    async fn test_inspect_is_repeatable() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_outcome(ScriptedOutcome::Stdout(LANDSCAPE_PROBE.as_bytes().to_vec()))
                .with_outcome(ScriptedOutcome::Stdout(LANDSCAPE_PROBE.as_bytes().to_vec())),
        );
        let inspector = AspectInspector::new(executor, "ffprobe");
        let path = Path::new("/tmp/upload.mp4");

        assert_eq!(inspector.inspect(path).await.unwrap(), inspector.inspect(path).await.unwrap());
    }

    #[tokio::test]
    async fn test_subprocess_failure_is_probe_error() {
        let executor = Arc::new(RecordingExecutor::new().with_outcome(ScriptedOutcome::Exit {
            exit_code: 1,
            stderr: "Invalid data found when processing input".to_string(),
        }));
        let inspector = AspectInspector::new(executor, "ffprobe");

        let err = inspector.inspect(Path::new("/tmp/upload.mp4")).await.unwrap_err();
        assert!(matches!(err, MediaError::Probe(_)));
    }
}
