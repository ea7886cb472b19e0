//! # Workbook Selection / 工作簿选择
//!
//! Accepts a workbook chosen by the user (picked or dropped), records its path in
//! the configuration and, when no test-suite name is stored yet, fills one in
//! from the workbook's file name.
//!
//! 接受用户选择（挑选或拖入）的工作簿，将其路径记录到配置中；
//! 如果尚未存储测试套件名称，则根据工作簿文件名填入一个。

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::core::config::{ConfigDocument, ConfigError, ConfigKey, ConfigStore};

/// Extensions accepted as Excel workbooks, compared case-insensitively.
pub const EXCEL_EXTENSIONS: [&str; 2] = ["xls", "xlsx"];

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// Nothing was offered.
    #[error("no file was given")]
    Empty,
    /// The file is not an `.xls`/`.xlsx` workbook. Nothing was changed.
    #[error("{} is not an Excel workbook", path.display())]
    InvalidFormat { path: PathBuf },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The result of an accepted selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The path stored under `excel_path`.
    pub path: PathBuf,
    /// The test-suite name stored after the selection.
    pub std_name: String,
    /// `true` when `std_name` was empty and has just been derived from the file name.
    pub std_name_filled: bool,
    /// The configuration as written.
    pub document: ConfigDocument,
}

/// Returns `true` for `.xls` and `.xlsx` files, ignoring case.
pub fn is_excel_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| EXCEL_EXTENSIONS.iter().any(|accepted| ext.eq_ignore_ascii_case(accepted)))
}

/// The default test-suite name for a workbook: its file name without extension.
pub fn suggested_std_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Records `path` as the selected workbook.
///
/// Rejects anything that is not an Excel workbook with
/// [`SelectionError::InvalidFormat`] before touching the configuration.
///
/// 将 `path` 记录为所选工作簿。
/// 在修改配置之前，拒绝任何不是 Excel 工作簿的文件并返回 [`SelectionError::InvalidFormat`]。
pub fn select_workbook(store: &ConfigStore, path: &Path) -> Result<Selection, SelectionError> {
    if !is_excel_file(path) {
        return Err(SelectionError::InvalidFormat {
            path: path.to_path_buf(),
        });
    }

    let excel_path = path.to_string_lossy().into_owned();
    let suggested = suggested_std_name(path);
    let mut std_name_filled = false;

    let document = store.update(|document| {
        document.set(ConfigKey::ExcelPath, excel_path.as_str());
        let has_name = document
            .get(ConfigKey::StdName)
            .is_some_and(|name| !name.trim().is_empty());
        if !has_name {
            document.set(ConfigKey::StdName, suggested.as_str());
            std_name_filled = true;
        }
    })?;

    let std_name = document
        .get(ConfigKey::StdName)
        .unwrap_or_default()
        .to_string();

    Ok(Selection {
        path: path.to_path_buf(),
        std_name,
        std_name_filled,
        document,
    })
}

/// Handles a drop of one or more files: only the first one is considered.
pub fn select_dropped(store: &ConfigStore, paths: &[PathBuf]) -> Result<Selection, SelectionError> {
    let first = paths.first().ok_or(SelectionError::Empty)?;
    select_workbook(store, first)
}
