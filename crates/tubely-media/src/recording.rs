//! Recording executor for exercising pipelines without media tools.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{CommandExecutor, CommandOutput, Invocation};
use crate::error::{MediaError, MediaResult};

/// What the next recorded invocation does.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Succeed with the given stdout.
    Stdout(Vec<u8>),
    /// Write the bytes to the invocation's last argument (the output path) and succeed.
    WriteOutput(Vec<u8>),
    /// Write the bytes to the output path, then exit with the given code.
    WriteOutputThenExit { bytes: Vec<u8>, exit_code: i32 },
    /// Exit with the given code and stderr.
    Exit { exit_code: i32, stderr: String },
    /// Report a timeout.
    TimedOut,
}

/// Executor that records every invocation and replays scripted outcomes in order.
///
/// Invocations beyond the script use the program's standing outcome if one is
/// set, and otherwise succeed with empty output.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    invocations: Mutex<Vec<Invocation>>,
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    standing: Mutex<HashMap<String, ScriptedOutcome>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next unscripted invocation.
    pub fn with_outcome(self, outcome: ScriptedOutcome) -> Self {
        self.push(outcome);
        self
    }

    pub fn push(&self, outcome: ScriptedOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Repeat `outcome` for every unscripted invocation of `program`.
    ///
    /// Unlike the ordered script, this holds up when invocations interleave.
    pub fn with_program_outcome(self, program: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.standing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(program.into(), outcome);
        self
    }

    /// Invocations seen so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, invocation: &Invocation) -> MediaResult<CommandOutput> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation.clone());

        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .or_else(|| {
                self.standing
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .get(&invocation.program)
                    .cloned()
            });

        let program = invocation.program.clone();
        match outcome {
            None => Ok(CommandOutput::default()),
            Some(ScriptedOutcome::Stdout(stdout)) => Ok(CommandOutput {
                stdout,
                stderr: Vec::new(),
            }),
            Some(ScriptedOutcome::WriteOutput(bytes)) => {
                write_output(invocation, &bytes).await?;
                Ok(CommandOutput::default())
            }
            Some(ScriptedOutcome::WriteOutputThenExit { bytes, exit_code }) => {
                write_output(invocation, &bytes).await?;
                Err(MediaError::ProcessFailed {
                    program,
                    exit_code: Some(exit_code),
                    stderr: None,
                })
            }
            Some(ScriptedOutcome::Exit { exit_code, stderr }) => Err(MediaError::ProcessFailed {
                program,
                exit_code: Some(exit_code),
                stderr: Some(stderr),
            }),
            Some(ScriptedOutcome::TimedOut) => Err(MediaError::Timeout {
                program,
                timeout: Duration::ZERO,
            }),
        }
    }
}

async fn write_output(invocation: &Invocation, bytes: &[u8]) -> MediaResult<()> {
    let path = invocation
        .args
        .last()
        .ok_or_else(|| MediaError::subprocess(&invocation.program, "no output path argument"))?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_outcomes_in_order() {
        let executor = RecordingExecutor::new()
            .with_outcome(ScriptedOutcome::Stdout(b"{}".to_vec()))
            .with_outcome(ScriptedOutcome::Exit {
                exit_code: 1,
                stderr: "bad".to_string(),
            });

        let first = executor.execute(&Invocation::new("ffprobe")).await.unwrap();
        assert_eq!(first.stdout, b"{}");

        let second = executor.execute(&Invocation::new("ffmpeg")).await;
        assert!(matches!(second, Err(MediaError::ProcessFailed { exit_code: Some(1), .. })));

        // Unscripted calls succeed
        assert!(executor.execute(&Invocation::new("ffmpeg")).await.is_ok());

        let programs: Vec<_> = executor.invocations().into_iter().map(|i| i.program).collect();
        assert_eq!(programs, vec!["ffprobe", "ffmpeg", "ffmpeg"]);
    }

    #[tokio::test]
    async fn test_write_output_uses_last_argument() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.mp4");

        let executor = RecordingExecutor::new().with_outcome(ScriptedOutcome::WriteOutput(b"moov".to_vec()));
        executor
            .execute(&Invocation::new("ffmpeg").args(["-i", "in.mp4"]).arg(out.to_string_lossy()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"moov");
    }

    #[tokio::test]
    async fn test_standing_outcome_repeats_per_program() {
        let executor = RecordingExecutor::new()
            .with_outcome(ScriptedOutcome::Stdout(b"first".to_vec()))
            .with_program_outcome("ffprobe", ScriptedOutcome::Stdout(b"standing".to_vec()));

        // Ordered script wins while it lasts
        let first = executor.execute(&Invocation::new("ffprobe")).await.unwrap();
        assert_eq!(first.stdout, b"first");

        for _ in 0..2 {
            let out = executor.execute(&Invocation::new("ffprobe")).await.unwrap();
            assert_eq!(out.stdout, b"standing");
        }

        let other = executor.execute(&Invocation::new("ffmpeg")).await.unwrap();
        assert!(other.stdout.is_empty());
    }
}
