//! # Select Command Module / 选择命令模块
//!
//! Implements `select`, the command-line counterpart of picking or dropping a workbook.
//!
//! 实现 `select` 命令，对应于挑选或拖入工作簿的操作。

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::{
    cli::context::AppContext,
    core::{
        models::Status,
        selection::{SelectionError, select_dropped},
    },
    infra::{fs::absolute_path, t},
    reporting::console::print_status,
};

/// Records the first of `files` as the selected workbook.
pub fn execute(ctx: &AppContext, files: &[PathBuf]) -> Result<()> {
    let files = files
        .iter()
        .map(|file| absolute_path(file))
        .collect::<Result<Vec<_>>>()?;

    match select_dropped(&ctx.store, &files) {
        Ok(selection) => {
            print_status(&Status::info(t!(
                "status.excel_path_updated",
                path = selection.path.display()
            )));
            if selection.std_name_filled {
                println!("{}", t!("select.std_name_filled", name = selection.std_name));
            } else {
                println!("{}", t!("select.std_name_kept", name = selection.std_name));
            }
            Ok(())
        }
        Err(SelectionError::InvalidFormat { path }) => {
            // Shown as a plain notice, like a rejected drop.
            print_status(&Status::info(t!("status.invalid_format")));
            bail!(t!("select.rejected", path = path.display()).to_string())
        }
        Err(err) => {
            print_status(&Status::error(t!(
                "status.config_update_failed",
                error = err.to_string()
            )));
            Err(err.into())
        }
    }
}
