//! # Reporting Module / 报告模块
//!
//! This module handles everything the tool prints to the console: status lines,
//! the captured output of a tool run, a run summary and the stored configuration.
//!
//! 此模块处理工具打印到控制台的所有内容：状态行、
//! 工具运行的捕获输出、运行摘要以及已存储的配置。

pub mod console;

// Re-export common reporting functions
pub use console::{print_config, print_run_output, print_run_summary, print_status};
