//! # Baseline Verifier Library / Baseline Verifier 库
//!
//! This library provides the core functionality for the Baseline Verifier tool,
//! which keeps the settings of an Excel STD workbook in a per-user `config.json`
//! and launches the external STD validation tools against it.
//!
//! 此库为 Baseline Verifier 工具提供核心功能，
//! 它将 Excel STD 工作簿的设置保存在每用户的 `config.json` 中，
//! 并针对该工作簿启动外部 STD 验证工具。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration store, workbook selection, tool execution and run coordination
//! - `infra` - Infrastructure services like process capture, file system helpers and the run log
//! - `reporting` - Console output of statuses, tool output and stored configuration
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置存储、工作簿选择、工具执行和运行协调
//! - `infra` - 基础设施服务，如进程输出捕获、文件系统辅助和运行日志
//! - `reporting` - 状态、工具输出和已存储配置的控制台输出
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::coordinator;
pub use core::execution;
pub use core::models;
pub use core::selection;
pub use core::settings;

/// Picks the language used for messages, based on the system locale.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the language
/// code (e.g., "en"), and finally falls back to the default language ("en").
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    resolve_locale(&locale)
}

/// Maps a requested locale onto one of the bundled translations.
pub fn resolve_locale(requested: &str) -> String {
    let available_locales = rust_i18n::available_locales!();

    if available_locales.iter().any(|available| *available == requested) {
        return requested.to_string();
    }

    requested
        .split(['-', '_'])
        .next()
        .and_then(|lang_code| {
            available_locales
                .iter()
                .find(|available| available.split('-').next() == Some(lang_code))
        })
        .map(|lang| lang.to_string())
        .unwrap_or_else(|| "en".to_string())
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
