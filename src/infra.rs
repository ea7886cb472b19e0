//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Baseline Verifier,
//! including process output capture, file system helpers, the run log and i18n support.
//!
//! 此模块为 Baseline Verifier 提供基础设施服务，
//! 包括进程输出捕获、文件系统辅助、运行日志和国际化支持。

pub mod command;
pub mod fs;
pub mod log;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
