//! # Tool Execution Module / 工具执行模块
//!
//! This module launches an external tool with positional arguments, captures
//! its standard output and standard error, and waits for it to exit. A run can
//! be bounded by a timeout and stopped through a cancellation token; in both
//! cases the child process is killed.
//!
//! 此模块使用位置参数启动外部工具，捕获其标准输出和标准错误，并等待其退出。
//! 运行可以受超时限制，也可以通过取消令牌停止；这两种情况下子进程都会被终止。

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::core::models::RunOutput;
use crate::infra::command;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Errors that prevent a run from producing any output to classify.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Nothing exists at the resolved path. Raised before spawning.
    #[error("{} not found", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("Failed to start {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} did not finish within {}s", path.display(), timeout.as_secs())]
    TimedOut { path: PathBuf, timeout: Duration },

    #[error("{} was stopped before it finished", path.display())]
    Cancelled { path: PathBuf },
}

/// Launches external tools and captures their output.
/// 启动外部工具并捕获其输出。
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds every run; the child is killed once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses `token` to stop a run from outside, e.g. on Ctrl-C.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs `executable` with `args` and returns both output streams and the exit code.
    ///
    /// The executable must exist; otherwise [`RunError::ExecutableNotFound`] is
    /// returned and nothing is spawned. Arguments are passed as discrete argv
    /// elements, never through a shell.
    ///
    /// 使用 `args` 运行 `executable`，返回两个输出流和退出码。
    /// 可执行文件必须存在，否则返回 [`RunError::ExecutableNotFound`] 且不会派生任何进程。
    pub async fn run<S: AsRef<OsStr>>(
        &self,
        executable: &Path,
        args: &[S],
    ) -> Result<RunOutput, RunError> {
        if !executable.is_file() {
            return Err(RunError::ExecutableNotFound {
                path: executable.to_path_buf(),
            });
        }

        let mut cmd = Command::new(executable);
        cmd.args(args).kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let capture = command::spawn_and_capture(cmd);
        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, capture).await.map_err(|_| {
                    RunError::TimedOut {
                        path: executable.to_path_buf(),
                        timeout: limit,
                    }
                }),
                None => Ok(capture.await),
            }
        };

        // Dropping the capture future drops the child, which kills it.
        let (status, captured) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(RunError::Cancelled { path: executable.to_path_buf() });
            }
            result = bounded => result?,
        };

        let status = status.map_err(|source| RunError::Spawn {
            path: executable.to_path_buf(),
            source,
        })?;

        Ok(RunOutput {
            stdout: captured.stdout,
            stderr: captured.stderr,
            exit_code: status.code(),
        })
    }
}
