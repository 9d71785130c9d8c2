//! FFprobe/FFmpeg wrapper for the video ingest pipeline.
//!
//! This crate provides:
//! - A command executor seam with a real-process backend and a recording fake
//! - Aspect inspection via `ffprobe` JSON stream metadata
//! - Faststart remuxing via `ffmpeg` stream copy
//! - Scoped temporary files that are removed on drop

pub mod command;
pub mod config;
pub mod error;
pub mod faststart;
pub mod probe;
pub mod recording;
pub mod staging;

pub use command::{check_tool, CommandExecutor, CommandOutput, FfmpegCommand, Invocation, ProcessExecutor};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use faststart::{FaststartRemuxer, RemuxedFile};
pub use probe::{parse_stream_dimensions, AspectInspector, VideoDimensions};
pub use recording::{RecordingExecutor, ScriptedOutcome};
pub use staging::StagedFile;
