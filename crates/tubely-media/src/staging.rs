//! Scoped staging of upload streams on local disk.

use std::path::Path;

use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

use crate::error::MediaResult;

/// Filename prefix of staged uploads.
pub const STAGED_PREFIX: &str = "tubely-upload-";

/// A raw upload copied to a temporary file, removed when dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    /// Copy `reader` to a new file in `dir` named `tubely-upload-<random>.<extension>`.
    ///
    /// The file is registered for removal before the first byte is written,
    /// so a failed copy leaves nothing behind.
    pub async fn from_reader<R>(dir: &Path, extension: &str, reader: &mut R) -> MediaResult<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let suffix = format!(".{}", extension);
        let (file, path) = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)?
            .into_parts();

        let mut file = tokio::fs::File::from_std(file);
        let size = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        drop(file);

        debug!(path = %path.display(), size, "Staged upload");

        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_and_release() {
        let dir = TempDir::new().unwrap();
        let mut body: &[u8] = b"video bytes";

        let staged = StagedFile::from_reader(dir.path(), "mp4", &mut body).await.unwrap();
        let path = staged.path().to_path_buf();
        assert_eq!(staged.size(), 11);
        assert_eq!(std::fs::read(&path).unwrap(), b"video bytes");

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(STAGED_PREFIX));
        assert!(name.ends_with(".mp4"));

        drop(staged);
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    /// Reader that yields some bytes then fails.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")))
            } else {
                self.sent = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let mut reader = BrokenReader { sent: false };

        let result = StagedFile::from_reader(dir.path(), "mp4", &mut reader).await;
        assert!(result.is_err());
        assert_eq!(entries(dir.path()), 0);
    }
}
