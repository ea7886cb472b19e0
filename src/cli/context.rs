//! Resolves the directories, settings and stores every command works with.

use anyhow::Result;
use std::path::PathBuf;

use crate::core::config::{APP_FOLDER_NAME, CONFIG_FILE_NAME, ConfigStore};
use crate::core::settings::{self, Settings};
use crate::infra::fs::{absolute_path, application_data_dir, executable_dir};
use crate::infra::log::{LOG_FILE_NAME, RunLog};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub app_dir: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub strict_exit_code: bool,
    pub timeout_secs: Option<u64>,
}

/// Everything a command needs, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Holds the executables, the default `config.json`, `verifier.toml` and `app.log`.
    pub app_dir: PathBuf,
    pub settings: Settings,
    pub store: ConfigStore,
    pub log: RunLog,
}

impl AppContext {
    /// Command-line options win over `verifier.toml`, which wins over the built-in defaults.
    pub fn load(options: GlobalOptions) -> Result<Self> {
        let app_dir = match options.app_dir {
            Some(dir) => absolute_path(&dir)?,
            None => executable_dir()?,
        };

        let mut settings = settings::load_or_default(&app_dir)?;
        if options.strict_exit_code {
            settings.strict_exit_code = true;
        }
        if options.timeout_secs.is_some() {
            settings.timeout_secs = options.timeout_secs;
        }

        let profile_dir = match options.profile_dir {
            Some(dir) => absolute_path(&dir)?,
            None => application_data_dir()?.join(APP_FOLDER_NAME),
        };
        let store = ConfigStore::new(profile_dir, app_dir.join(CONFIG_FILE_NAME));

        let log_path = match options.log_file {
            Some(path) => absolute_path(&path)?,
            None => app_dir.join(LOG_FILE_NAME),
        };

        Ok(Self {
            app_dir,
            settings,
            store,
            log: RunLog::new(log_path),
        })
    }
}
