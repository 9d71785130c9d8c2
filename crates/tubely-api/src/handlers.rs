//! Request handlers.

pub mod health;
pub mod video_upload;
pub mod videos;

pub use health::*;
pub use video_upload::*;
pub use videos::*;
