//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared by the configuration store,
//! the process runner and the run coordinator: tool kinds, run requests,
//! captured run output, outcomes, run state and status messages.
//!
//! 此模块定义了配置存储、进程运行器和运行协调器共享的数据结构：
//! 工具种类、运行请求、捕获的运行输出、运行结果、运行状态和状态消息。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::settings::ToolSpec;

/// The external tools the verifier knows how to launch.
/// 验证器能够启动的外部工具。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// The STD rule (violation) check. Does not consult the configuration fields.
    /// STD 规则（违规）检查。不使用配置字段。
    Violations,
    /// The VSTS bug automation. Requires and persists the configuration fields.
    /// VSTS 缺陷自动化。需要并持久化配置字段。
    Automation,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::Violations, ToolKind::Automation];

    /// Whether a run of this tool requires the three text fields and writes them to `config.json`.
    pub fn uses_config(self) -> bool {
        matches!(self, ToolKind::Automation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Violations => "violations",
            ToolKind::Automation => "automation",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished run is judged.
/// 如何判定一次已完成的运行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Failed if and only if anything was written to standard error. The exit code is ignored.
    /// 当且仅当有内容写入标准错误时判定为失败。忽略退出码。
    #[default]
    StderrOnly,
    /// Failed if anything was written to standard error or the exit code is not zero.
    /// 有内容写入标准错误或退出码非零时判定为失败。
    Strict,
}

/// The three text fields a run may need: test-suite name, iteration path and version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    pub std_name: String,
    pub iteration_path: String,
    pub current_version: String,
}

impl FieldValues {
    pub fn new(
        std_name: impl Into<String>,
        iteration_path: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            std_name: std_name.into(),
            iteration_path: iteration_path.into(),
            current_version: current_version.into(),
        }
    }

    /// Returns `true` if any field is empty or whitespace only.
    pub fn any_blank(&self) -> bool {
        [&self.std_name, &self.iteration_path, &self.current_version]
            .iter()
            .any(|value| value.trim().is_empty())
    }

    /// Trims every field and writes the version with dots instead of commas (`1,2` -> `1.2`).
    pub fn normalized(&self) -> Self {
        Self {
            std_name: self.std_name.trim().to_string(),
            iteration_path: self.iteration_path.trim().to_string(),
            current_version: self.current_version.trim().replace(',', "."),
        }
    }
}

/// Everything needed for one tool invocation. Lives only for the duration of the run.
/// 一次工具调用所需的全部信息。仅在运行期间存在。
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Which tool is being run / 正在运行的工具
    pub kind: ToolKind,
    /// Executable name, resolved against the application directory / 可执行文件名，相对于应用目录解析
    pub executable: String,
    /// Status shown when the run is classified as a success / 运行被判定为成功时显示的状态
    pub success_message: String,
    /// Whether the text fields are required and written to the configuration / 是否需要文本字段并写入配置
    pub use_config: bool,
    /// The selected workbook / 所选工作簿
    pub workbook: Option<PathBuf>,
    /// Current values of the text fields / 文本字段的当前值
    pub fields: FieldValues,
}

impl RunRequest {
    /// Builds a request for `kind` using the executable and message configured in `tool`.
    pub fn for_tool(
        kind: ToolKind,
        tool: &ToolSpec,
        workbook: Option<PathBuf>,
        fields: FieldValues,
    ) -> Self {
        Self {
            kind,
            executable: tool.executable.clone(),
            success_message: tool.success_message.clone(),
            use_config: kind.uses_config(),
            workbook,
            fields,
        }
    }
}

/// Why a finished run was classified as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The tool wrote to standard error.
    StderrNotEmpty,
    /// The tool exited with a non-zero code. Only reported under [`ClassificationPolicy::Strict`].
    NonZeroExit,
}

/// The captured result of a finished child process.
/// 已结束子进程的捕获结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Standard output lines, in arrival order / 标准输出行，按到达顺序
    pub stdout: Vec<String>,
    /// Standard error lines, in arrival order / 标准错误行，按到达顺序
    pub stderr: Vec<String>,
    /// Exit code, `None` when the process was terminated by a signal / 退出码，被信号终止时为 `None`
    pub exit_code: Option<i32>,
}

impl RunOutput {
    /// Standard output as text, one `\n`-terminated line per captured line.
    pub fn stdout_text(&self) -> String {
        join_lines(&self.stdout)
    }

    /// Standard error as text, one `\n`-terminated line per captured line.
    pub fn stderr_text(&self) -> String {
        join_lines(&self.stderr)
    }

    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }

    /// Judges the run under `policy`. `None` means the run succeeded.
    pub fn classify(&self, policy: ClassificationPolicy) -> Option<FailureReason> {
        if self.has_stderr() {
            return Some(FailureReason::StderrNotEmpty);
        }
        match policy {
            ClassificationPolicy::StderrOnly => None,
            ClassificationPolicy::Strict if self.exit_code == Some(0) => None,
            ClassificationPolicy::Strict => Some(FailureReason::NonZeroExit),
        }
    }
}

fn join_lines(lines: &[String]) -> String {
    lines.iter().fold(String::new(), |mut text, line| {
        text.push_str(line);
        text.push('\n');
        text
    })
}

/// The final result of a run that reached the external tool.
/// 到达外部工具的一次运行的最终结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run was classified as a success.
    /// 运行被判定为成功。
    Succeeded {
        /// The success status that was published / 已发布的成功状态
        message: String,
        /// The captured output / 捕获的输出
        output: RunOutput,
    },
    /// The run was classified as a failure.
    /// 运行被判定为失败。
    Failed {
        /// Why it failed / 失败原因
        reason: FailureReason,
        /// The captured output / 捕获的输出
        output: RunOutput,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }

    pub fn output(&self) -> &RunOutput {
        match self {
            RunOutcome::Succeeded { output, .. } | RunOutcome::Failed { output, .. } => output,
        }
    }
}

/// The state of one tool: idle, or running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running { kind: ToolKind },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}

/// The run state of every tool, as published by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStates {
    pub violations: RunState,
    pub automation: RunState,
}

impl RunStates {
    pub fn get(&self, kind: ToolKind) -> RunState {
        match kind {
            ToolKind::Violations => self.violations,
            ToolKind::Automation => self.automation,
        }
    }

    pub fn set(&mut self, kind: ToolKind, state: RunState) {
        match kind {
            ToolKind::Violations => self.violations = state,
            ToolKind::Automation => self.automation = state,
        }
    }

    /// Returns `true` when no tool is running.
    pub fn all_idle(&self) -> bool {
        ToolKind::ALL.iter().all(|kind| !self.get(*kind).is_running())
    }
}

/// A user-visible status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
