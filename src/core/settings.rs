//! # Settings Module / 设置模块
//!
//! Optional `verifier.toml` placed next to the tool executables. It names the two
//! tools and their success messages, picks the classification policy, an
//! optional timeout and the output language. Every field has a default, so
//! the file may be missing or partial.
//!
//! 放置在工具可执行文件旁边的可选 `verifier.toml`。它指定两个工具及其成功消息、
//! 判定策略、可选超时以及输出语言。每个字段都有默认值，因此该文件可以缺失或不完整。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::models::{ClassificationPolicy, ToolKind};
use crate::infra::t;

/// File name of the settings file in the application directory.
pub const SETTINGS_FILE_NAME: &str = "verifier.toml";

/// One external tool: its executable name and the status shown on success.
/// 一个外部工具：其可执行文件名以及成功时显示的状态。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolSpec {
    /// Executable name, resolved relative to the application directory.
    /// 可执行文件名，相对于应用目录解析。
    pub executable: String,
    /// Status shown when a run is classified as a success.
    /// 运行被判定为成功时显示的状态。
    pub success_message: String,
}

impl ToolSpec {
    pub fn default_for(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Violations => Self {
                executable: "test_excel_violations.exe".to_string(),
                success_message: "Violation check completed successfully!".to_string(),
            },
            ToolKind::Automation => Self {
                executable: "test_bugs_std_validation.exe".to_string(),
                success_message: "Automation completed successfully!".to_string(),
            },
        }
    }
}

fn default_violations() -> ToolSpec {
    ToolSpec::default_for(ToolKind::Violations)
}

fn default_automation() -> ToolSpec {
    ToolSpec::default_for(ToolKind::Automation)
}

/// The `[tools]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolTable {
    #[serde(default = "default_violations")]
    pub violations: ToolSpec,
    #[serde(default = "default_automation")]
    pub automation: ToolSpec,
}

impl Default for ToolTable {
    fn default() -> Self {
        Self {
            violations: default_violations(),
            automation: default_automation(),
        }
    }
}

/// Represents the settings file.
/// 代表设置文件。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// The language for output messages (e.g., "en", "zh-CN"). System language when unset.
    /// 输出消息的语言（例如 "en", "zh-CN"）。未设置时使用系统语言。
    #[serde(default)]
    pub language: Option<String>,

    /// Also fail runs that exit with a non-zero code.
    /// 同时将以非零退出码退出的运行判定为失败。
    #[serde(default)]
    pub strict_exit_code: bool,

    /// Stop a tool that runs longer than this many seconds. No limit when unset.
    /// 工具运行超过该秒数时将其停止。未设置时不限制。
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub tools: ToolTable,
}

impl Settings {
    pub fn tool(&self, kind: ToolKind) -> &ToolSpec {
        match kind {
            ToolKind::Violations => &self.tools.violations,
            ToolKind::Automation => &self.tools.automation,
        }
    }

    pub fn policy(&self) -> ClassificationPolicy {
        if self.strict_exit_code {
            ClassificationPolicy::Strict
        } else {
            ClassificationPolicy::StderrOnly
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Loads and parses a settings file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| t!("settings.read_failed", path = path.display()).to_string())?;
    toml::from_str(&content)
        .with_context(|| t!("settings.parse_failed", path = path.display()).to_string())
}

/// Loads `verifier.toml` from `app_dir`, or the built-in defaults when there is none.
pub fn load_or_default(app_dir: &Path) -> Result<Settings> {
    let path = app_dir.join(SETTINGS_FILE_NAME);
    if path.is_file() {
        load_settings(&path)
    } else {
        Ok(Settings::default())
    }
}
