//! Business logic services.

pub mod upload_pipeline;

pub use upload_pipeline::{BodyReadError, PipelineError, PipelineResult, UploadPipeline};
