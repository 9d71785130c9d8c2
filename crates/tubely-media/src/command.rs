//! Subprocess execution for media tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Maximum stderr bytes kept on a failed invocation.
const MAX_STDERR_LEN: usize = 4096;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs media tools to completion.
///
/// Implementations must return `Err` when the program cannot be started,
/// exits non-zero or exceeds its time bound. There is no retry.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> MediaResult<CommandOutput>;
}

/// Executor backed by real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each invocation. The child is killed when the bound is hit.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> MediaResult<CommandOutput> {
        let program = &invocation.program;
        check_tool(program)?;

        debug!("Running: {}", invocation.command_line());

        let child = Command::new(program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::subprocess(program, e))?;

        // Dropping the future on timeout drops the child, which kills it.
        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(program = %program, "Subprocess timed out after {:?}, killing process", limit);
                    return Err(MediaError::Timeout {
                        program: program.clone(),
                        timeout: limit,
                    });
                }
            },
            None => wait.await,
        }
        .map_err(|e| MediaError::subprocess(program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            warn!(
                program = %program,
                exit_code = ?output.status.code(),
                "Subprocess failed: {}",
                truncate(stderr, 512)
            );
            return Err(MediaError::ProcessFailed {
                program: program.clone(),
                exit_code: output.status.code(),
                stderr: (!stderr.is_empty()).then(|| truncate(stderr, MAX_STDERR_LEN).to_string()),
            });
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add output arguments (after -i).
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_args(["-c", "copy"])
    }

    /// Move the container index to the front of the file.
    pub fn faststart(self) -> Self {
        self.output_args(["-movflags", "faststart"])
    }

    /// Force the output container format.
    pub fn format(self, format: &str) -> Self {
        self.output_args(["-f", format])
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        // Output file last; the recording executor relies on this.
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Turn into an invocation of `program`.
    pub fn to_invocation(&self, program: &str) -> Invocation {
        Invocation::new(program).args(self.build_args())
    }
}

/// Check that a tool resolves to an executable.
pub fn check_tool(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::ToolNotFound(program.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faststart_command_args() {
        let cmd = FfmpegCommand::new("/tmp/in.mp4", "/tmp/in.mp4.processing")
            .stream_copy()
            .faststart()
            .format("mp4");

        assert_eq!(
            cmd.build_args(),
            vec![
                "-y", "-v", "error", "-i", "/tmp/in.mp4", "-c", "copy", "-movflags", "faststart",
                "-f", "mp4", "/tmp/in.mp4.processing",
            ]
        );
    }

    #[test]
    fn test_command_line() {
        let inv = Invocation::new("ffprobe").args(["-v", "error"]).arg("a.mp4");
        assert_eq!(inv.command_line(), "ffprobe -v error a.mp4");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("definitely-not-a-real-tool-tubely").unwrap_err();
        assert!(matches!(err, MediaError::ToolNotFound(_)));
        assert!(err.is_subprocess_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_executor_captures_stdout() {
        let output = ProcessExecutor::new()
            .execute(&Invocation::new("sh").args(["-c", "printf hello"]))
            .await
            .unwrap();
        assert_eq!(output.stdout, b"hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_executor_non_zero_exit() {
        let err = ProcessExecutor::new()
            .execute(&Invocation::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .await
            .unwrap_err();

        match err {
            MediaError::ProcessFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.as_deref(), Some("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_executor_timeout() {
        let err = ProcessExecutor::new()
            .with_timeout(Some(Duration::from_millis(100)))
            .execute(&Invocation::new("sh").args(["-c", "sleep 5"]))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Timeout { .. }));
        assert!(err.is_subprocess_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_bounds_each_invocation() {
        let executor = ProcessExecutor::new().with_timeout(Some(Duration::from_millis(1500)));
        let nap = Invocation::new("sh").args(["-c", "sleep 1"]);

        // Together these exceed the bound; each alone does not
        executor.execute(&nap).await.unwrap();
        executor.execute(&nap).await.unwrap();
    }
}
