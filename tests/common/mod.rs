// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Default configuration shipped next to the executables in the fixtures.
pub const DEFAULT_CONFIG: &str = r#"{
  "excel_path": "",
  "std_name": "",
  "iteration_path": "",
  "current_version": "",
  "vsts_url": "https://dev.azure.com/example",
  "retry_count": 3
}"#;

/// An application directory and a profile directory, both temporary.
pub struct TestEnv {
    pub app_dir: TempDir,
    pub profile_dir: TempDir,
}

impl TestEnv {
    pub fn app_path(&self) -> &Path {
        self.app_dir.path()
    }

    /// The profile folder itself does not exist until the configuration is first needed.
    pub fn profile_path(&self) -> PathBuf {
        self.profile_dir.path().join("profile")
    }

    pub fn user_config_path(&self) -> PathBuf {
        self.profile_path().join("config.json")
    }

    pub fn default_config_path(&self) -> PathBuf {
        self.app_path().join("config.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.app_path().join("app.log")
    }

    pub fn read_user_config(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.user_config_path()).expect("user config should exist");
        serde_json::from_str(&content).expect("user config should be valid JSON")
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(self.log_path()).unwrap_or_default()
    }
}

/// Creates an environment whose app directory holds the default `config.json`.
pub fn setup_test_environment() -> TestEnv {
    let env = setup_empty_environment();
    fs::write(env.default_config_path(), DEFAULT_CONFIG).expect("Failed to write default config");
    env
}

/// Creates an environment without any configuration file.
pub fn setup_empty_environment() -> TestEnv {
    TestEnv {
        app_dir: tempdir().expect("Failed to create app directory"),
        profile_dir: tempdir().expect("Failed to create profile directory"),
    }
}

/// Writes an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    {
        let mut file = fs::File::create(&path).expect("Failed to create script");
        writeln!(file, "#!/bin/sh").unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod script");
    path
}

/// Creates an empty file that passes the workbook extension check.
pub fn create_workbook(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").expect("Failed to create workbook");
    path
}
