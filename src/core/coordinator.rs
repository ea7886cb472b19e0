//! # Run Coordinator / 运行协调器
//!
//! The coordinator turns a [`RunRequest`] into one tool invocation: it checks the
//! inputs, stores the text fields in the configuration, resolves the executable,
//! runs it, classifies the result and publishes status messages along the way.
//!
//! It owns the run state of every tool. A tool that is already running rejects a
//! second request; different tools may run at the same time. State changes are
//! published through a `watch` channel, status messages through an unbounded
//! `mpsc` channel, in the order they happen.
//!
//! 协调器将一个 [`RunRequest`] 转换为一次工具调用：检查输入，将文本字段存入配置，
//! 解析可执行文件，运行它，判定结果，并在此过程中发布状态消息。
//! 它拥有每个工具的运行状态。已在运行的工具会拒绝第二个请求；不同的工具可以同时运行。

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::{mpsc, watch};

use crate::core::config::{ConfigError, ConfigKey, ConfigStore};
use crate::core::execution::{ProcessRunner, RunError};
use crate::core::models::{
    ClassificationPolicy, FailureReason, RunOutcome, RunRequest, RunState, RunStates, Status,
    ToolKind,
};
use crate::infra::log::RunLog;
use crate::infra::t;

/// Reasons a run ended without a classified outcome.
#[derive(Debug, thiserror::Error)]
pub enum RunFailure {
    #[error("no Excel workbook selected")]
    MissingWorkbook,

    #[error("required fields are blank")]
    MissingFields,

    #[error("{kind} is already running")]
    AlreadyRunning { kind: ToolKind },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// Coordinates tool runs. Share it behind an `Arc` to trigger runs from several tasks.
pub struct Coordinator {
    store: ConfigStore,
    runner: ProcessRunner,
    log: RunLog,
    app_dir: PathBuf,
    policy: ClassificationPolicy,
    states: watch::Sender<RunStates>,
    claimed: Mutex<HashSet<ToolKind>>,
    status_tx: Option<mpsc::UnboundedSender<Status>>,
}

/// Holds a tool kind from the moment a request is accepted until the run ends.
/// The published state only turns `Running` once the executable is found.
struct Claim<'a> {
    claimed: &'a Mutex<HashSet<ToolKind>>,
    kind: ToolKind,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}

/// Puts a tool back to `Idle` when its run ends, whichever way it ends.
struct RunningGuard<'a> {
    states: &'a watch::Sender<RunStates>,
    kind: ToolKind,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let kind = self.kind;
        self.states.send_modify(|states| states.set(kind, RunState::Idle));
    }
}

impl Coordinator {
    /// # Arguments
    /// * `store` - The per-user configuration
    /// * `runner` - Launches the tools
    /// * `log` - Receives delimiters and error entries
    /// * `app_dir` - Directory the executables are resolved against
    pub fn new(
        store: ConfigStore,
        runner: ProcessRunner,
        log: RunLog,
        app_dir: impl Into<PathBuf>,
    ) -> Self {
        let (states, _) = watch::channel(RunStates::default());
        Self {
            store,
            runner,
            log,
            app_dir: app_dir.into(),
            policy: ClassificationPolicy::default(),
            states,
            claimed: Mutex::new(HashSet::new()),
            status_tx: None,
        }
    }

    pub fn with_policy(mut self, policy: ClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Every status message is sent to `tx`, in order.
    pub fn with_status_sender(mut self, tx: mpsc::UnboundedSender<Status>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Observes the run state of every tool.
    pub fn subscribe(&self) -> watch::Receiver<RunStates> {
        self.states.subscribe()
    }

    /// The current run state of every tool.
    pub fn states(&self) -> RunStates {
        *self.states.borrow()
    }

    /// Executes one run request.
    ///
    /// Input, configuration and launch problems end in `Err` after publishing an
    /// error status. A run that reached the tool ends in `Ok`, with the outcome
    /// decided by the classification policy.
    ///
    /// 执行一个运行请求。
    /// 输入、配置和启动问题在发布错误状态后以 `Err` 结束。
    /// 到达工具的运行以 `Ok` 结束，其结果由判定策略决定。
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome, RunFailure> {
        self.log.delimiter();
        let result = self.run_framed(&request).await;
        self.log.delimiter();
        result
    }

    async fn run_framed(&self, request: &RunRequest) -> Result<RunOutcome, RunFailure> {
        let Some(workbook) = request
            .workbook
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
        else {
            self.publish(Status::error(t!("status.select_excel_file")));
            return Err(RunFailure::MissingWorkbook);
        };

        if request.use_config && request.fields.any_blank() {
            self.publish(Status::error(t!("status.fill_all_fields")));
            return Err(RunFailure::MissingFields);
        }

        // A rejected request must not overwrite the fields of the run in flight.
        let _claim = self.claim(request.kind)?;

        let fields = if request.use_config {
            let fields = request.fields.normalized();
            let stored = self.store.upsert_many(&[
                (ConfigKey::StdName, fields.std_name.as_str()),
                (ConfigKey::IterationPath, fields.iteration_path.as_str()),
                (ConfigKey::CurrentVersion, fields.current_version.as_str()),
            ]);
            if let Err(err) = stored {
                self.log.error(&err.to_string());
                self.publish(Status::error(t!(
                    "status.config_update_failed",
                    error = err.to_string()
                )));
                return Err(err.into());
            }
            fields
        } else {
            request.fields.clone()
        };

        let executable = self.app_dir.join(&request.executable);
        if !executable.is_file() {
            self.publish(Status::error(t!(
                "status.executable_not_found",
                exe = request.executable.as_str()
            )));
            self.log.error(&format!(
                "{} not found at {}",
                request.executable,
                executable.display()
            ));
            return Err(RunError::ExecutableNotFound { path: executable }.into());
        }

        let _running = self.begin(request.kind);
        self.publish(Status::info(t!("status.running")));

        let args = [
            OsString::from(workbook.as_os_str()),
            OsString::from(&fields.std_name),
        ];
        let output = match self.runner.run(&executable, &args).await {
            Ok(output) => output,
            Err(err) => {
                self.log.error(&err.to_string());
                self.publish(Status::error(t!("status.execution_failed")));
                return Err(err.into());
            }
        };

        match output.classify(self.policy) {
            Some(reason) => {
                let detail = match reason {
                    FailureReason::StderrNotEmpty => output.stderr_text(),
                    FailureReason::NonZeroExit => match output.exit_code {
                        Some(code) => format!("{} exited with code {code}", request.executable),
                        None => format!("{} was terminated by a signal", request.executable),
                    },
                };
                self.log.error(&detail);
                self.publish(Status::error(t!("status.execution_failed")));
                Ok(RunOutcome::Failed { reason, output })
            }
            None => {
                self.publish(Status::info(request.success_message.clone()));
                Ok(RunOutcome::Succeeded {
                    message: request.success_message.clone(),
                    output,
                })
            }
        }
    }

    /// Reserves `kind` for this request, or rejects it if a run of `kind` is in flight.
    fn claim(&self, kind: ToolKind) -> Result<Claim<'_>, RunFailure> {
        let inserted = self
            .claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);

        if !inserted {
            self.publish(Status::error(t!("status.already_running", tool = kind)));
            return Err(RunFailure::AlreadyRunning { kind });
        }

        Ok(Claim {
            claimed: &self.claimed,
            kind,
        })
    }

    /// Publishes `kind` as `Running` until the returned guard is dropped.
    fn begin(&self, kind: ToolKind) -> RunningGuard<'_> {
        self.states
            .send_modify(|states| states.set(kind, RunState::Running { kind }));
        RunningGuard {
            states: &self.states,
            kind,
        }
    }

    fn publish(&self, status: Status) {
        if let Some(tx) = &self.status_tx {
            // A closed receiver only means nobody is listening any more.
            let _ = tx.send(status);
        }
    }
}
