//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations,
//! such as atomic file replacement and locating the application and profile directories.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如原子文件替换以及定位应用目录和用户配置目录。

use anyhow::{Context, Result, bail};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::infra::t;

/// Replaces the content of `path` in one step.
///
/// The new content is written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a partially written file.
///
/// # Arguments
/// * `path` - File to replace
/// * `contents` - The complete new content
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(".baseline_verifier_")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(contents)?;
    // The temporary file is created owner-only; the replaced file keeps its mode.
    if let Ok(existing) = std::fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Expands `~` and environment variables in a user supplied path.
///
/// # Arguments
/// * `raw` - The path as typed by the user
///
/// # Returns
/// The expanded path, or an error naming the variable that could not be resolved
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Gets the absolute path from a potentially relative path.
/// Unlike `canonicalize`, the path does not need to exist.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// The directory holding the running executable.
pub fn executable_dir() -> Result<PathBuf> {
    let exe = env::current_exe().with_context(|| t!("settings.app_dir_failed").to_string())?;
    match exe.parent() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => bail!(t!("settings.app_dir_failed").to_string()),
    }
}

/// The per-user application data directory.
///
/// `%APPDATA%` on Windows; `$XDG_CONFIG_HOME`, then `~/.config` elsewhere.
pub fn application_data_dir() -> Result<PathBuf> {
    let var = if cfg!(windows) { "APPDATA" } else { "XDG_CONFIG_HOME" };
    if let Some(dir) = env::var_os(var).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let fallback = shellexpand::tilde("~/.config");
    if fallback.starts_with('~') {
        bail!(t!("settings.profile_dir_failed").to_string());
    }
    Ok(PathBuf::from(fallback.as_ref()))
}
