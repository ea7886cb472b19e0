//! # Command Execution Module / 命令执行模块
//!
//! Spawns a child process with both output streams piped and collects each
//! stream into its own buffer, line by line, while waiting for the process to exit.
//!
//! 派生一个两个输出流都被管道化的子进程，在等待进程退出的同时，
//! 将每个流逐行收集到各自的缓冲区中。

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;

/// The lines a child process wrote to its two output streams.
/// 子进程写入其两个输出流的行。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Spawns a command and captures its stdout and stderr separately.
/// Both streams are read concurrently with the wait, so a chatty child never
/// blocks on a full pipe.
///
/// Empty lines are dropped and line endings (`\n` or `\r\n`) are stripped.
/// Bytes that are not valid UTF-8 are replaced rather than aborting the capture.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The captured lines of both streams.
///
/// 派生一个命令，分别捕获其 stdout 和 stderr。
/// 两个流与等待进程退出同时读取，因此输出较多的子进程不会因管道已满而阻塞。
pub async fn spawn_and_capture(mut cmd: Command) -> (io::Result<ExitStatus>, CapturedOutput) {
    let mut child = match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), CapturedOutput::default()),
    };

    let Some(stdout) = child.stdout.take() else {
        return (
            Err(io::Error::other("failed to capture stdout")),
            CapturedOutput::default(),
        );
    };
    let Some(stderr) = child.stderr.take() else {
        return (
            Err(io::Error::other("failed to capture stderr")),
            CapturedOutput::default(),
        );
    };

    let (status, stdout, stderr) =
        tokio::join!(child.wait(), collect_lines(stdout), collect_lines(stderr));

    (status, CapturedOutput { stdout, stderr })
}

async fn collect_lines<R>(reader: R) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    SplitStream::new(BufReader::new(reader).split(b'\n'))
        .take_while(Result::is_ok)
        .filter_map(Result::ok)
        .map(|segment| {
            let line = String::from_utf8_lossy(&segment);
            let line: &str = &line;
            line.strip_suffix('\r').unwrap_or(line).to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
        .await
}

/// Renders a program and its arguments as one shell-quoted line, for logs and console output.
pub fn format_command_line<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> String {
    let parts: Vec<String> = std::iter::once(program)
        .chain(args.iter().map(AsRef::as_ref))
        .map(|part| part.to_string_lossy().into_owned())
        .collect();

    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}
