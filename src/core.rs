//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Baseline Verifier,
//! including the configuration store, workbook selection, tool execution
//! and the run coordinator.
//!
//! 此模块包含 Baseline Verifier 的核心功能，
//! 包括配置存储、工作簿选择、工具执行和运行协调器。

pub mod config;
pub mod coordinator;
pub mod execution;
pub mod models;
pub mod selection;
pub mod settings;

// Re-exports
pub use config::{ConfigKey, ConfigStore};
pub use coordinator::Coordinator;
pub use execution::ProcessRunner;
pub use models::{RunOutcome, RunOutput};
