//! # Configuration Store / 配置存储
//!
//! The per-user `config.json` lives in the profile directory and is seeded from
//! a default file shipped next to the executables. Updates are key-level upserts:
//! the existing JSON object is read, the given keys are set, and the document is
//! written back atomically. Keys this tool does not know about are left alone.
//!
//! 每用户的 `config.json` 位于配置目录中，首次使用时从随可执行文件一起发布的默认文件复制。
//! 更新是键级别的 upsert：读取现有 JSON 对象，设置给定的键，然后以原子方式写回。
//! 本工具不认识的键保持不变。

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::infra::fs::write_atomic;

/// File name of the configuration, both in the profile and in the app directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Folder created under the per-user application data directory.
pub const APP_FOLDER_NAME: &str = "AT_baseline_verifier";

/// One lock per configuration path, shared by every `ConfigStore` in the process.
static WRITE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = Lazy::new(Default::default);

fn write_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = WRITE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(path.to_path_buf()).or_default().clone()
}

/// The keys this tool reads and writes.
/// 本工具读写的键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Absolute path of the selected workbook / 所选工作簿的绝对路径
    ExcelPath,
    /// Test-suite (STD) name / 测试套件（STD）名称
    StdName,
    /// VSTS iteration path / VSTS 迭代路径
    IterationPath,
    /// Current version string / 当前版本字符串
    CurrentVersion,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::ExcelPath,
        ConfigKey::StdName,
        ConfigKey::IterationPath,
        ConfigKey::CurrentVersion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::ExcelPath => "excel_path",
            ConfigKey::StdName => "std_name",
            ConfigKey::IterationPath => "iteration_path",
            ConfigKey::CurrentVersion => "current_version",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while bootstrapping, reading or updating `config.json`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Neither the user file nor the bundled default exists.
    #[error("Default config.json not found at {}", default.display())]
    NotFound { default: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> ConfigError + '_ {
        move |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The parsed configuration document. Key order of the file is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    /// Returns the value of `key` when it is stored as a string.
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        self.0.get(key.as_str()).and_then(Value::as_str)
    }

    /// Returns any stored value, recognized or not.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: ConfigKey, value: impl Into<String>) {
        self.0.insert(key.as_str().to_string(), Value::String(value.into()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        // Files saved by Windows editors may start with a byte order mark.
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let value: Value = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ConfigError::NotAnObject {
                path: path.to_path_buf(),
            }),
        }
    }

    fn to_pretty_string(&self, path: &Path) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(&self.0).map_err(|source| ConfigError::Encode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Owns the location of the per-user `config.json` and its bundled default.
/// 管理每用户 `config.json` 及其随附默认文件的位置。
#[derive(Debug, Clone)]
pub struct ConfigStore {
    profile_dir: PathBuf,
    default_path: PathBuf,
}

impl ConfigStore {
    /// # Arguments
    /// * `profile_dir` - Per-user directory that holds the live `config.json`
    /// * `default_path` - The bundled default copied on first use
    pub fn new(profile_dir: impl Into<PathBuf>, default_path: impl Into<PathBuf>) -> Self {
        Self {
            profile_dir: profile_dir.into(),
            default_path: default_path.into(),
        }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Path of the per-user configuration file, whether or not it exists yet.
    pub fn config_path(&self) -> PathBuf {
        self.profile_dir.join(CONFIG_FILE_NAME)
    }

    /// Makes sure the per-user configuration file exists, copying the bundled
    /// default when it does not, and returns its path.
    ///
    /// Fails with [`ConfigError::NotFound`] without creating anything when
    /// neither file exists.
    ///
    /// 确保每用户配置文件存在，不存在时复制随附的默认文件，并返回其路径。
    /// 两个文件都不存在时返回 [`ConfigError::NotFound`]，且不创建任何文件。
    pub fn ensure(&self) -> Result<PathBuf, ConfigError> {
        let path = self.config_path();
        let lock = write_lock(&path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_locked(&path)?;
        Ok(path)
    }

    fn ensure_locked(&self, path: &Path) -> Result<(), ConfigError> {
        if path.is_file() {
            return Ok(());
        }
        if !self.default_path.is_file() {
            return Err(ConfigError::NotFound {
                default: self.default_path.clone(),
            });
        }

        fs::create_dir_all(&self.profile_dir).map_err(ConfigError::io(&self.profile_dir))?;
        fs::copy(&self.default_path, path).map_err(ConfigError::io(path))?;
        Ok(())
    }

    /// Ensures the file exists and returns its parsed content.
    pub fn load(&self) -> Result<ConfigDocument, ConfigError> {
        let path = self.ensure()?;
        read_document(&path)
    }

    /// Runs one read-modify-write cycle on the configuration.
    ///
    /// Concurrent updates of the same file are serialized, and the new content
    /// replaces the old file in a single rename.
    pub fn update<F>(&self, apply: F) -> Result<ConfigDocument, ConfigError>
    where
        F: FnOnce(&mut ConfigDocument),
    {
        let path = self.config_path();
        let lock = write_lock(&path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.ensure_locked(&path)?;
        let mut document = read_document(&path)?;
        apply(&mut document);

        let content = document.to_pretty_string(&path)?;
        write_atomic(&path, content.as_bytes()).map_err(ConfigError::io(&path))?;
        Ok(document)
    }

    /// Sets or replaces a single key, leaving every other key untouched.
    pub fn upsert(&self, key: ConfigKey, value: &str) -> Result<ConfigDocument, ConfigError> {
        self.upsert_many(&[(key, value)])
    }

    /// Sets or replaces several keys in one read-modify-write cycle.
    pub fn upsert_many(&self, entries: &[(ConfigKey, &str)]) -> Result<ConfigDocument, ConfigError> {
        self.update(|document| {
            for (key, value) in entries {
                document.set(*key, *value);
            }
        })
    }
}

fn read_document(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::io(path))?;
    ConfigDocument::parse(path, &content)
}
