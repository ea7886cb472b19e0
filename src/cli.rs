// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::models::ToolKind;
use crate::infra::{fs::expand_path, t};

pub mod commands;
pub mod context;

use context::{AppContext, GlobalOptions};

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang="))
        .map(str::to_string)
}

fn file_arg(name: &'static str, help: String) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name("FILE")
        .action(ArgAction::Set)
}

fn text_arg(name: &'static str, value_name: &'static str, help: String) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name(value_name)
        .action(ArgAction::Set)
}

fn build_cli(locale: &str) -> Command {
    Command::new("baseline-verifier")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("app-dir")
                .long("app-dir")
                .help(t!("arg_app_dir", locale = locale).to_string())
                .value_name("APP_DIR")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("profile-dir")
                .long("profile-dir")
                .help(t!("arg_profile_dir", locale = locale).to_string())
                .value_name("PROFILE_DIR")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help(t!("arg_log_file", locale = locale).to_string())
                .value_name("LOG_FILE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("strict-exit-code")
                .long("strict-exit-code")
                .help(t!("arg_strict_exit_code", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help(t!("arg_timeout", locale = locale).to_string())
                .value_name("SECS")
                .value_parser(clap::value_parser!(u64))
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("select")
                .about(t!("cmd_select_about", locale = locale).to_string())
                .arg(
                    Arg::new("files")
                        .help(t!("arg_files", locale = locale).to_string())
                        .value_name("FILE")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about(t!("cmd_validate_about", locale = locale).to_string())
                .arg(file_arg("file", t!("arg_file", locale = locale).to_string()))
                .arg(text_arg(
                    "std-name",
                    "STD_NAME",
                    t!("arg_std_name", locale = locale).to_string(),
                )),
        )
        .subcommand(
            Command::new("automation")
                .about(t!("cmd_automation_about", locale = locale).to_string())
                .arg(file_arg("file", t!("arg_file", locale = locale).to_string()))
                .arg(text_arg(
                    "std-name",
                    "STD_NAME",
                    t!("arg_std_name", locale = locale).to_string(),
                ))
                .arg(text_arg(
                    "iteration-path",
                    "ITERATION_PATH",
                    t!("arg_iteration_path", locale = locale).to_string(),
                ))
                .arg(text_arg(
                    "version",
                    "VERSION",
                    t!("arg_version", locale = locale).to_string(),
                )),
        )
        .subcommand(Command::new("show").about(t!("cmd_show_about", locale = locale).to_string()))
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn path_value(matches: &ArgMatches, id: &str) -> Result<Option<PathBuf>> {
    matches
        .get_one::<String>(id)
        .map(|raw| expand_path(raw))
        .transpose()
}

fn global_options(matches: &ArgMatches) -> Result<GlobalOptions> {
    Ok(GlobalOptions {
        app_dir: path_value(matches, "app-dir")?,
        profile_dir: path_value(matches, "profile-dir")?,
        log_file: path_value(matches, "log-file")?,
        strict_exit_code: matches.get_flag("strict-exit-code"),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
    })
}

fn run_args(matches: &ArgMatches) -> Result<commands::run::RunArgs> {
    let text = |id: &str| -> Option<String> {
        // `validate` does not define every field.
        matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .cloned()
    };

    Ok(commands::run::RunArgs {
        file: path_value(matches, "file")?,
        std_name: text("std-name"),
        iteration_path: text("iteration-path"),
        version: text("version"),
    })
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language();
    let language = explicit_language
        .as_deref()
        .map(crate::resolve_locale)
        .unwrap_or_else(crate::detect_locale);
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();
    let ctx = AppContext::load(global_options(&matches)?)?;

    if explicit_language.is_none() {
        if let Some(configured) = &ctx.settings.language {
            rust_i18n::set_locale(&crate::resolve_locale(configured));
        }
    }

    match matches.subcommand() {
        Some(("select", select_matches)) => {
            let files = select_matches
                .get_many::<String>("files")
                .into_iter()
                .flatten()
                .map(|raw| expand_path(raw))
                .collect::<Result<Vec<_>>>()?;
            commands::select::execute(&ctx, &files)?;
        }
        Some(("validate", validate_matches)) => {
            commands::run::execute(&ctx, ToolKind::Violations, run_args(validate_matches)?).await?;
        }
        Some(("automation", automation_matches)) => {
            commands::run::execute(&ctx, ToolKind::Automation, run_args(automation_matches)?)
                .await?;
        }
        Some(("show", _)) => {
            commands::show::execute(&ctx)?;
        }
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::execute(&ctx, non_interactive)?;
        }
        _ => {
            // `subcommand_required` makes clap print the help before we get here.
        }
    }
    Ok(())
}
