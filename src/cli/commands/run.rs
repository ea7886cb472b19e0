//! # Run Command Module / 运行命令模块
//!
//! This module implements the `validate` and `automation` commands, which launch
//! one of the external STD tools against the selected workbook.
//!
//! 此模块实现了 `validate` 和 `automation` 命令，
//! 针对所选工作簿启动其中一个外部 STD 工具。

use anyhow::{Result, bail};
use colored::*;
use std::ffi::OsStr;
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    cli::context::AppContext,
    core::{
        config::{ConfigDocument, ConfigError, ConfigKey},
        coordinator::Coordinator,
        execution::ProcessRunner,
        models::{FieldValues, RunRequest, Status, ToolKind},
        selection::is_excel_file,
    },
    infra::{command::format_command_line, fs::absolute_path, t},
    reporting::console::{print_run_output, print_run_summary, print_status},
};

/// Values given on the command line. Missing ones fall back to the stored configuration.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub file: Option<PathBuf>,
    pub std_name: Option<String>,
    pub iteration_path: Option<String>,
    pub version: Option<String>,
}

/// Executes one tool run.
///
/// # Arguments
/// * `ctx` - Resolved directories, settings and stores
/// * `kind` - Which tool to launch
/// * `args` - Values given on the command line
///
/// # Returns
/// `Ok` when the run was classified as a success, an error otherwise
pub async fn execute(ctx: &AppContext, kind: ToolKind, args: RunArgs) -> Result<()> {
    if let Some(file) = &args.file {
        if !is_excel_file(file) {
            print_status(&Status::error(t!("status.invalid_format")));
            bail!(t!("select.rejected", path = file.display()).to_string());
        }
    }

    let stored = match ctx.store.load() {
        Ok(document) => document,
        // A validation run with an explicit workbook needs nothing from the configuration.
        Err(ConfigError::NotFound { .. }) if args.file.is_some() && !kind.uses_config() => {
            ConfigDocument::default()
        }
        Err(err) => {
            ctx.log.error(&err.to_string());
            print_status(&Status::error(t!(
                "status.config_load_failed",
                error = err.to_string()
            )));
            return Err(anyhow::Error::new(err).context(t!("run.failed", tool = kind).to_string()));
        }
    };

    let workbook = args
        .file
        .clone()
        .or_else(|| {
            stored
                .get(ConfigKey::ExcelPath)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
        })
        .map(|path| absolute_path(&path))
        .transpose()?;
    let fields = FieldValues::new(
        pick(args.std_name, &stored, ConfigKey::StdName),
        pick(args.iteration_path, &stored, ConfigKey::IterationPath),
        pick(args.version, &stored, ConfigKey::CurrentVersion),
    );
    let request = RunRequest::for_tool(kind, ctx.settings.tool(kind), workbook, fields);

    if let Some(workbook) = &request.workbook {
        let executable = ctx.app_dir.join(&request.executable);
        let args = [workbook.as_os_str(), OsStr::new(&request.fields.std_name)];
        println!(
            "{} {}",
            t!("run.command_prefix").blue(),
            format_command_line(executable.as_os_str(), &args)
        );
    }

    let token = setup_signal_handler();
    let runner = ProcessRunner::new()
        .with_timeout(ctx.settings.timeout())
        .with_cancellation(token);

    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<Status>();
    let printer = tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            print_status(&status);
        }
    });

    let coordinator = Coordinator::new(ctx.store.clone(), runner, ctx.log.clone(), &ctx.app_dir)
        .with_policy(ctx.settings.policy())
        .with_status_sender(status_tx);

    let result = coordinator.run(request).await;

    // Closing the channel lets the printer drain and finish.
    drop(coordinator);
    if let Err(e) = printer.await {
        eprintln!("Failed to join status printer task: {}", e);
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            return Err(anyhow::Error::new(err).context(t!("run.failed", tool = kind).to_string()));
        }
    };

    print_run_output(outcome.output());
    print_run_summary(kind, &outcome, ctx.log.path());

    if outcome.is_success() {
        Ok(())
    } else {
        bail!(t!("run.failed", tool = kind).to_string())
    }
}

fn pick(flag: Option<String>, stored: &ConfigDocument, key: ConfigKey) -> String {
    flag.unwrap_or_else(|| stored.get(key).unwrap_or_default().to_string())
}

/// Sets up a Ctrl-C handler that stops the running tool.
fn setup_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("run.shutdown_signal").yellow());
            token_clone.cancel();
        }
    });

    token
}
