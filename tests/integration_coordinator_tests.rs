//! # Coordinator Integration Tests / 协调器集成测试
//!
//! End-to-end tests of a run request: input checks, configuration writes,
//! executable resolution, status messages, the run log and run state.
//!
//! 运行请求的端到端测试：输入检查、配置写入、可执行文件解析、状态消息、运行日志和运行状态。

mod common;

use baseline_verifier::config::ConfigStore;
use baseline_verifier::coordinator::{Coordinator, RunFailure};
use baseline_verifier::execution::{ProcessRunner, RunError};
use baseline_verifier::infra::log::{DELIMITER, RunLog};
use baseline_verifier::models::{
    FieldValues, RunOutcome, RunRequest, RunState, Status, ToolKind,
};
use baseline_verifier::settings::ToolSpec;
use common::{TestEnv, setup_test_environment};
use std::path::PathBuf;
use tokio::sync::mpsc;

fn coordinator(env: &TestEnv) -> (Coordinator, mpsc::UnboundedReceiver<Status>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let store = ConfigStore::new(env.profile_path(), env.default_config_path());
    let coordinator = Coordinator::new(
        store,
        ProcessRunner::new(),
        RunLog::new(env.log_path()),
        env.app_path(),
    )
    .with_status_sender(tx);
    (coordinator, rx)
}

fn request(kind: ToolKind, executable: &str, workbook: Option<&str>, fields: FieldValues) -> RunRequest {
    let tool = ToolSpec {
        executable: executable.to_string(),
        success_message: format!("{kind} completed successfully!"),
    };
    RunRequest::for_tool(kind, &tool, workbook.map(PathBuf::from), fields)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Status>) -> Vec<Status> {
    let mut statuses = Vec::new();
    while let Ok(status) = rx.try_recv() {
        statuses.push(status);
    }
    statuses
}

fn filled_fields() -> FieldValues {
    FieldValues::new(" STD_Login ", " Proj\\Sprint 5 ", "3,1")
}

#[cfg(test)]
mod input_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_workbook_is_rejected() {
        let env = setup_test_environment();
        let (coordinator, mut rx) = coordinator(&env);

        let result = coordinator
            .run(request(ToolKind::Violations, "rules", None, FieldValues::default()))
            .await;

        assert!(matches!(result, Err(RunFailure::MissingWorkbook)));
        assert_eq!(drain(&mut rx), vec![Status::error("Please Select an Excel File.")]);
    }

    #[tokio::test]
    async fn test_empty_workbook_path_is_rejected() {
        let env = setup_test_environment();
        let (coordinator, _rx) = coordinator(&env);

        let result = coordinator
            .run(request(ToolKind::Violations, "rules", Some(""), FieldValues::default()))
            .await;

        assert!(matches!(result, Err(RunFailure::MissingWorkbook)));
    }

    #[tokio::test]
    async fn test_automation_requires_all_fields() {
        let env = setup_test_environment();
        let (coordinator, mut rx) = coordinator(&env);

        let result = coordinator
            .run(request(
                ToolKind::Automation,
                "bugs",
                Some("/data/a.xlsx"),
                FieldValues::new("STD", "", "1.0"),
            ))
            .await;

        assert!(matches!(result, Err(RunFailure::MissingFields)));
        assert_eq!(drain(&mut rx), vec![Status::error("Please Fill all fields.")]);
        // Nothing is written when the fields are incomplete.
        assert!(!env.user_config_path().exists());
    }

    #[tokio::test]
    async fn test_missing_executable_never_reaches_running() {
        let env = setup_test_environment();
        let (coordinator, mut rx) = coordinator(&env);
        let mut states = coordinator.subscribe();

        let result = coordinator
            .run(request(
                ToolKind::Violations,
                "test_excel_violations.exe",
                Some("/data/a.xlsx"),
                FieldValues::default(),
            ))
            .await;

        assert!(matches!(
            result,
            Err(RunFailure::Run(RunError::ExecutableNotFound { .. }))
        ));
        let statuses = drain(&mut rx);
        assert_eq!(
            statuses,
            vec![Status::error("Error: test_excel_violations.exe not found.")]
        );
        assert!(!states.has_changed().unwrap());
        assert!(env.read_log().contains("test_excel_violations.exe not found at"));
    }

    #[tokio::test]
    async fn test_automation_stores_fields_even_when_executable_is_missing() {
        let env = setup_test_environment();
        let (coordinator, _rx) = coordinator(&env);

        let result = coordinator
            .run(request(
                ToolKind::Automation,
                "missing_bugs_tool",
                Some("/data/a.xlsx"),
                filled_fields(),
            ))
            .await;

        assert!(result.is_err());
        let json = env.read_user_config();
        assert_eq!(json["std_name"], "STD_Login");
        assert_eq!(json["iteration_path"], "Proj\\Sprint 5");
        assert_eq!(json["current_version"], "3.1");
    }

    #[tokio::test]
    async fn test_config_failure_is_reported_and_logged() {
        let env = common::setup_empty_environment();
        let (coordinator, mut rx) = coordinator(&env);

        let result = coordinator
            .run(request(
                ToolKind::Automation,
                "bugs",
                Some("/data/a.xlsx"),
                filled_fields(),
            ))
            .await;

        assert!(matches!(result, Err(RunFailure::Config(_))));
        let statuses = drain(&mut rx);
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].is_error);
        assert!(statuses[0].message.starts_with("Error updating config:"));
        assert!(env.read_log().contains("Default config.json not found"));
    }
}

#[cfg(all(test, unix))]
mod execution_tests {
    use super::*;
    use common::write_script;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_successful_automation_run() {
        let env = setup_test_environment();
        write_script(env.app_path(), "bugs", "echo \"checked $1 for $2\"\n");
        let (coordinator, mut rx) = coordinator(&env);

        let outcome = coordinator
            .run(request(
                ToolKind::Automation,
                "bugs",
                Some("/data/STD_Login.xlsx"),
                filled_fields(),
            ))
            .await
            .unwrap();

        match &outcome {
            RunOutcome::Succeeded { message, output } => {
                assert_eq!(message, "automation completed successfully!");
                assert_eq!(output.stdout, vec!["checked /data/STD_Login.xlsx for STD_Login"]);
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(
            drain(&mut rx),
            vec![
                Status::info("Running..."),
                Status::info("automation completed successfully!")
            ]
        );
        assert_eq!(env.read_user_config()["current_version"], "3.1");
        assert!(coordinator.states().all_idle());
    }

    #[tokio::test]
    async fn test_violations_run_does_not_touch_config() {
        let env = setup_test_environment();
        write_script(env.app_path(), "rules", "echo ok\n");
        let (coordinator, _rx) = coordinator(&env);

        let outcome = coordinator
            .run(request(
                ToolKind::Violations,
                "rules",
                Some("/data/a.xlsx"),
                FieldValues::default(),
            ))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert!(!env.user_config_path().exists());
    }

    #[tokio::test]
    async fn test_stderr_run_fails_and_is_logged_between_delimiters() {
        let env = setup_test_environment();
        write_script(
            env.app_path(),
            "rules",
            "echo 'checking'\necho 'Sheet1 row 7: missing owner' >&2\n",
        );
        let (coordinator, mut rx) = coordinator(&env);

        let outcome = coordinator
            .run(request(
                ToolKind::Violations,
                "rules",
                Some("/data/a.xlsx"),
                FieldValues::default(),
            ))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            drain(&mut rx),
            vec![
                Status::info("Running..."),
                Status::error("Execution failed. See log for details.")
            ]
        );

        let log = env.read_log();
        assert_eq!(log.matches(DELIMITER).count(), 2);
        assert!(log.starts_with(DELIMITER));
        assert!(log.trim_end().ends_with(DELIMITER));
        assert!(log.contains("[ERROR "));
        assert!(log.contains("] Sheet1 row 7: missing owner"));
        assert!(!log.contains("checking"));
    }

    #[tokio::test]
    async fn test_successful_run_logs_only_delimiters() {
        let env = setup_test_environment();
        write_script(env.app_path(), "rules", "echo fine\n");
        let (coordinator, _rx) = coordinator(&env);

        coordinator
            .run(request(ToolKind::Violations, "rules", Some("/data/a.xlsx"), FieldValues::default()))
            .await
            .unwrap();

        assert_eq!(env.read_log(), format!("{DELIMITER}\n{DELIMITER}\n"));
    }

    #[tokio::test]
    async fn test_second_run_of_same_tool_is_rejected() {
        let env = setup_test_environment();
        write_script(env.app_path(), "slow", "sleep 1\necho done\n");
        let (coordinator, mut rx) = coordinator(&env);
        let coordinator = Arc::new(coordinator);
        let mut states = coordinator.subscribe();

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .run(request(ToolKind::Violations, "slow", Some("/data/a.xlsx"), FieldValues::default()))
                    .await
            })
        };

        states
            .wait_for(|states| states.get(ToolKind::Violations).is_running())
            .await
            .unwrap();

        let second = coordinator
            .run(request(ToolKind::Violations, "slow", Some("/data/a.xlsx"), FieldValues::default()))
            .await;
        assert!(matches!(
            second,
            Err(RunFailure::AlreadyRunning { kind: ToolKind::Violations })
        ));

        let first = first.await.unwrap().unwrap();
        assert!(first.is_success());
        assert_eq!(coordinator.states().get(ToolKind::Violations), RunState::Idle);

        let statuses = drain(&mut rx);
        assert!(statuses.contains(&Status::error("violations is already running.")));
    }

    #[tokio::test]
    async fn test_rejected_automation_keeps_fields_of_run_in_flight() {
        let env = setup_test_environment();
        write_script(env.app_path(), "slow_bugs", "sleep 1\necho \"filed for $2\"\n");
        let (coordinator, _rx) = coordinator(&env);
        let coordinator = Arc::new(coordinator);
        let mut states = coordinator.subscribe();

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .run(request(
                        ToolKind::Automation,
                        "slow_bugs",
                        Some("/data/a.xlsx"),
                        FieldValues::new("FIRST", "Proj\\One", "1.0"),
                    ))
                    .await
            })
        };

        states
            .wait_for(|states| states.get(ToolKind::Automation).is_running())
            .await
            .unwrap();

        let second = coordinator
            .run(request(
                ToolKind::Automation,
                "slow_bugs",
                Some("/data/b.xlsx"),
                FieldValues::new("SECOND", "Proj\\Two", "2.0"),
            ))
            .await;
        assert!(matches!(
            second,
            Err(RunFailure::AlreadyRunning { kind: ToolKind::Automation })
        ));

        let json = env.read_user_config();
        assert_eq!(json["std_name"], "FIRST");
        assert_eq!(json["iteration_path"], "Proj\\One");
        assert_eq!(json["current_version"], "1.0");

        match first.await.unwrap().unwrap() {
            RunOutcome::Succeeded { output, .. } => {
                assert_eq!(output.stdout, vec!["filed for FIRST"]);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_releases_the_tool() {
        let env = setup_test_environment();
        let (coordinator, _rx) = coordinator(&env);

        for _ in 0..2 {
            let result = coordinator
                .run(request(
                    ToolKind::Automation,
                    "absent_tool",
                    Some("/data/a.xlsx"),
                    filled_fields(),
                ))
                .await;
            assert!(matches!(
                result,
                Err(RunFailure::Run(RunError::ExecutableNotFound { .. }))
            ));
        }
    }

    #[tokio::test]
    async fn test_different_tools_may_run_together() {
        let env = setup_test_environment();
        write_script(env.app_path(), "slow", "sleep 1\necho done\n");
        let (coordinator, _rx) = coordinator(&env);

        let (violations, automation) = tokio::join!(
            coordinator.run(request(
                ToolKind::Violations,
                "slow",
                Some("/data/a.xlsx"),
                FieldValues::default()
            )),
            coordinator.run(request(
                ToolKind::Automation,
                "slow",
                Some("/data/a.xlsx"),
                filled_fields()
            )),
        );

        assert!(violations.unwrap().is_success());
        assert!(automation.unwrap().is_success());
        assert!(coordinator.states().all_idle());
    }

    #[tokio::test]
    async fn test_state_returns_to_idle_after_timeout() {
        let env = setup_test_environment();
        write_script(env.app_path(), "hang", "sleep 10\n");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let coordinator = Coordinator::new(
            ConfigStore::new(env.profile_path(), env.default_config_path()),
            ProcessRunner::new().with_timeout(Some(Duration::from_millis(200))),
            RunLog::new(env.log_path()),
            env.app_path(),
        )
        .with_status_sender(tx);

        let result = coordinator
            .run(request(ToolKind::Violations, "hang", Some("/data/a.xlsx"), FieldValues::default()))
            .await;

        assert!(matches!(result, Err(RunFailure::Run(RunError::TimedOut { .. }))));
        assert!(coordinator.states().all_idle());
        assert_eq!(
            drain(&mut rx).last(),
            Some(&Status::error("Execution failed. See log for details."))
        );
        assert!(env.read_log().contains("did not finish within"));
    }

    #[tokio::test]
    async fn test_strict_policy_fails_nonzero_exit() {
        let env = setup_test_environment();
        write_script(env.app_path(), "quiet", "exit 4\n");
        let (coordinator, _rx) = coordinator(&env);
        let coordinator =
            coordinator.with_policy(baseline_verifier::models::ClassificationPolicy::Strict);

        let outcome = coordinator
            .run(request(ToolKind::Violations, "quiet", Some("/data/a.xlsx"), FieldValues::default()))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert!(env.read_log().contains("quiet exited with code 4"));
    }

    #[tokio::test]
    async fn test_default_policy_ignores_nonzero_exit() {
        let env = setup_test_environment();
        write_script(env.app_path(), "quiet", "exit 4\n");
        let (coordinator, _rx) = coordinator(&env);

        let outcome = coordinator
            .run(request(ToolKind::Violations, "quiet", Some("/data/a.xlsx"), FieldValues::default()))
            .await
            .unwrap();

        assert!(outcome.is_success());
    }
}
