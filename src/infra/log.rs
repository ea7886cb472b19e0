//! # Run Log Module / 运行日志模块
//!
//! `app.log` is a plain-text, append-only file. Every run is framed by a
//! delimiter line, and errors are appended with a local timestamp.
//!
//! `app.log` 是一个纯文本、仅追加的文件。每次运行前后各写入一条分隔线，
//! 错误附带本地时间戳追加写入。

use chrono::Local;
use colored::*;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::infra::t;

/// File name of the run log in the application directory.
pub const LOG_FILE_NAME: &str = "app.log";

/// Written before and after every run.
pub const DELIMITER: &str = "======================================================";

/// Append-only run log.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) {
        self.write(&format!("{DELIMITER}\n"));
    }

    /// Appends `text` as an error entry: `[ERROR <timestamp>] <text>`.
    pub fn error(&self, text: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.write(&format!("\n[ERROR {stamp}] {}\n", text.trim_end()));
    }

    // A log that cannot be written must not abort the run it describes.
    fn write(&self, entry: &str) {
        if let Err(e) = self.append(entry) {
            eprintln!(
                "{} {}: {}",
                t!("log.write_failed").yellow(),
                self.path.display(),
                e
            );
        }
    }

    fn append(&self, entry: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}
