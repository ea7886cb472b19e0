//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints status lines, the captured output of a tool run, a short
//! run summary and the stored configuration, with colors and i18n support.
//!
//! 此模块打印状态行、工具运行的捕获输出、简短的运行摘要以及已存储的配置，
//! 支持彩色输出和国际化。

use colored::*;
use serde_json::Value;
use std::path::Path;

use crate::core::config::ConfigDocument;
use crate::core::models::{FailureReason, RunOutcome, RunOutput, Status, ToolKind};
use crate::infra::t;

/// Prints a status line: bold, and red when it reports an error.
pub fn print_status(status: &Status) {
    if status.is_error {
        println!("{}", status.message.red().bold());
    } else {
        println!("{}", status.message.bold());
    }
}

/// Prints what the tool wrote. Standard error lines follow the standard output lines.
pub fn print_run_output(output: &RunOutput) {
    if !output.stdout.is_empty() {
        println!("\n{}", t!("run.output_banner").bold());
        for line in &output.stdout {
            println!("{line}");
        }
    }

    if output.has_stderr() {
        println!("\n{}", t!("run.errors_banner").yellow().bold());
        for line in &output.stderr {
            println!("{}", line.yellow());
        }
    }
}

/// Prints a summary of a classified run.
///
/// # Output Format / 输出格式
/// ```text
/// --- Run Summary ---
///   - Tool             | automation
///   - Exit code        | 0
///   - Output lines     | 12
///   - Error lines      | 0
///   - Log file         | C:\tools\app.log
///   - Result           | Passed
/// ```
pub fn print_run_summary(kind: ToolKind, outcome: &RunOutcome, log_path: &Path) {
    let output = outcome.output();
    let exit_code = output
        .exit_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| t!("run.terminated_by_signal").to_string());

    println!("\n{}", t!("run.summary_banner").bold());
    print_row(&t!("run.tool"), kind.as_str().cyan());
    print_row(&t!("run.exit_code"), exit_code.normal());
    print_row(&t!("run.stdout_lines"), output.stdout.len().to_string().normal());
    print_row(&t!("run.stderr_lines"), output.stderr.len().to_string().normal());
    print_row(&t!("run.log_file"), log_path.display().to_string().dimmed());

    let result = match outcome {
        RunOutcome::Succeeded { .. } => t!("run.result_passed").green(),
        RunOutcome::Failed { reason, .. } => {
            let why = match reason {
                FailureReason::StderrNotEmpty => t!("run.reason_stderr"),
                FailureReason::NonZeroExit => t!("run.reason_exit_code"),
            };
            format!("{} ({})", t!("run.result_failed"), why).red()
        }
    };
    print_row(&t!("run.result"), result);
}

fn print_row(label: &str, value: ColoredString) {
    println!("  - {:<16} | {}", label, value);
}

/// Prints every stored key, recognized or not, in file order.
pub fn print_config(document: &ConfigDocument, path: &Path) {
    println!("{}", t!("show.config_path", path = path.display()).bold());

    if document.is_empty() {
        println!("  {}", t!("show.empty").dimmed());
        return;
    }

    for (key, value) in document.iter() {
        let rendered = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        println!("  - {:<16} | {}", key.cyan(), rendered);
    }
}
