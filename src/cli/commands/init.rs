//! # Configuration Initialization Module / 配置初始化模块
//!
//! This module creates the per-user `config.json` from the bundled default and,
//! through an interactive command-line wizard, fills in the test-suite name,
//! iteration path and version that the automation run needs.
//!
//! 此模块从随附的默认文件创建每用户的 `config.json`，
//! 并通过交互式命令行向导填写自动化运行所需的测试套件名称、迭代路径和版本。
//!
//! ## Features / 功能特性
//!
//! - **First-run bootstrap**: Copies the default configuration when none exists yet
//! - **Prefilled answers**: Stored values are offered as defaults
//! - **Normalization**: Answers are trimmed and the version is written with dots
//!
//! - **首次运行引导**: 尚无配置时复制默认配置
//! - **预填答案**: 已存储的值作为默认值提供
//! - **规范化**: 答案会去除首尾空白，版本号使用点号

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Input, theme::ColorfulTheme};

use crate::{
    cli::context::AppContext,
    core::{
        config::{ConfigDocument, ConfigKey},
        models::FieldValues,
    },
    infra::t,
};

/// Runs the wizard. With `non_interactive`, only makes sure the configuration exists.
///
/// 运行向导。使用 `non_interactive` 时，仅确保配置存在。
pub fn execute(ctx: &AppContext, non_interactive: bool) -> Result<()> {
    let path = ctx
        .store
        .ensure()
        .with_context(|| t!("show.load_failed").to_string())?;

    if non_interactive {
        println!(
            "{} {}",
            "✔".green(),
            t!("init.ready", path = path.display()).bold()
        );
        return Ok(());
    }

    let theme = ColorfulTheme::default();
    println!("\n{}", t!("init.welcome").cyan().bold());
    println!("{}", t!("init.description"));

    let stored = ctx
        .store
        .load()
        .with_context(|| t!("show.load_failed").to_string())?;

    let fields = FieldValues::new(
        prompt(&theme, &t!("init.std_name_prompt"), &stored, ConfigKey::StdName)?,
        prompt(
            &theme,
            &t!("init.iteration_path_prompt"),
            &stored,
            ConfigKey::IterationPath,
        )?,
        prompt(&theme, &t!("init.version_prompt"), &stored, ConfigKey::CurrentVersion)?,
    )
    .normalized();

    ctx.store.upsert_many(&[
        (ConfigKey::StdName, fields.std_name.as_str()),
        (ConfigKey::IterationPath, fields.iteration_path.as_str()),
        (ConfigKey::CurrentVersion, fields.current_version.as_str()),
    ])?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.saved", path = path.display()).bold()
    );
    Ok(())
}

/// Asks for one field, offering the stored value as the default.
fn prompt(
    theme: &ColorfulTheme,
    label: &str,
    stored: &ConfigDocument,
    key: ConfigKey,
) -> Result<String> {
    let mut input = Input::<String>::with_theme(theme).with_prompt(label);
    if let Some(current) = stored.get(key).filter(|value| !value.trim().is_empty()) {
        input = input.default(current.to_string());
    }
    input
        .interact_text()
        .with_context(|| t!("init.prompt_failed").to_string())
}
