mod common;

use common::TestProject;
use deployflow::{Pipeline, PipelineError, PipelineOptions, Stage, StageSelection, StageStatus};
use deployflow_container::RecordingRunner;
use deployflow_core::{Credentials, PipelineConfig, PipelineSettings, ServiceList};

const PASSWORD: &str = "s3cr3t-registry-pass";

fn config_for(project: &TestProject, services: Option<Vec<String>>) -> PipelineConfig {
    PipelineConfig::from_settings(PipelineSettings {
        namespace: Some("mudam5".to_string()),
        workdir: Some(project.path().to_path_buf()),
        services,
        ..Default::default()
    })
    .unwrap()
}

fn credentials() -> Option<Credentials> {
    Credentials::new("deployer", PASSWORD).ok()
}

/// 各ステージを実行するコマンドの対象サービスを抜き出す
fn services_in(lines: &[String], prefix: &str) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.strip_prefix(prefix))
        .map(|rest| {
            let image = rest.split_whitespace().next().unwrap_or_default();
            image
                .trim_start_matches("mudam5/")
                .trim_end_matches(":latest")
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_two_services() {
    let project = TestProject::with_services(&["log-collector", "persistor-auth"]);
    let config = config_for(
        &project,
        Some(vec!["log-collector".into(), "persistor-auth".into()]),
    );
    let runner = RecordingRunner::new();
    let pipeline = Pipeline::new(&config, &runner, credentials(), PipelineOptions::default());

    let report = pipeline.run(&StageSelection::full()).await.unwrap();

    assert!(report.is_success());
    let manifest = project.read_manifest();
    assert!(manifest.contains("image: mudam5/log-collector:latest"));
    assert!(manifest.contains("image: mudam5/persistor-auth:latest"));
    assert!(!manifest.contains("build: ./log-collector"));
    assert!(!manifest.contains("build: ./persistor-auth"));

    let lines = runner.command_lines();
    assert_eq!(
        lines.first().map(String::as_str),
        Some("docker login --username deployer --password-stdin")
    );
    assert_eq!(lines.last().map(String::as_str), Some("docker logout"));
    assert!(lines.iter().any(|l| l.ends_with("down")));
    assert!(lines.iter().any(|l| l.ends_with("up -d")));
}

#[tokio::test]
async fn test_every_stage_sees_same_service_list() {
    let services = ServiceList::defaults();
    let names: Vec<&str> = services.names();
    let project = TestProject::with_services(&names);
    let config = config_for(&project, None);
    let runner = RecordingRunner::new();
    let pipeline = Pipeline::new(&config, &runner, credentials(), PipelineOptions::default());

    let report = pipeline.run(&StageSelection::full()).await.unwrap();
    assert!(report.is_success());

    let lines = runner.command_lines();
    let built = services_in(&lines, "docker build -t ");
    let pushed = services_in(&lines, "docker push ");
    assert_eq!(built, names);
    assert_eq!(pushed, names);

    let manifest = project.read_manifest();
    for name in &names {
        assert!(manifest.contains(&format!("image: mudam5/{}:latest", name)));
    }
}

#[tokio::test]
async fn test_build_failure_prevents_push() {
    let project = TestProject::with_services(&["log-collector", "persistor-auth", "log-ui"]);
    let config = config_for(
        &project,
        Some(vec![
            "log-collector".into(),
            "persistor-auth".into(),
            "log-ui".into(),
        ]),
    );
    let runner = RecordingRunner::new().fail_on("build -t mudam5/persistor-auth");
    let pipeline = Pipeline::new(&config, &runner, credentials(), PipelineOptions::default());

    let report = pipeline.run(&StageSelection::full()).await.unwrap();

    assert!(matches!(
        report.failure,
        Some(PipelineError::StageFailed {
            stage: Stage::Build,
            ..
        })
    ));
    let lines = runner.command_lines();
    assert!(!lines.iter().any(|l| l.starts_with("docker push")));
    // fail-fast: 失敗後のサービスはビルドしない
    assert!(!lines.iter().any(|l| l.contains("mudam5/log-ui")));
    assert_eq!(lines.last().map(String::as_str), Some("docker logout"));
    assert_eq!(
        project.read_manifest().matches("build:").count(),
        3,
        "manifest must stay untouched"
    );
}

#[tokio::test]
async fn test_logout_runs_after_failure_in_any_stage() {
    let needles = [
        "docker login",
        "docker build",
        "docker push",
        "compose -f",
        "up -d",
    ];

    for needle in needles {
        let project = TestProject::with_services(&["log-collector", "persistor-auth"]);
        let config = config_for(
            &project,
            Some(vec!["log-collector".into(), "persistor-auth".into()]),
        );
        let runner = RecordingRunner::new().fail_on(needle);
        let pipeline = Pipeline::new(&config, &runner, credentials(), PipelineOptions::default());

        let report = pipeline.run(&StageSelection::full()).await.unwrap();

        assert!(!report.is_success(), "failure expected for {}", needle);
        assert_eq!(
            runner.command_lines().last().map(String::as_str),
            Some("docker logout"),
            "logout must be last after failure in {}",
            needle
        );
        assert_eq!(report.status_of(Stage::Logout), Some(&StageStatus::Succeeded));
    }
}

#[tokio::test]
async fn test_rewrite_failure_reported_without_write() {
    let project = TestProject::with_services(&["log-collector", "persistor-auth"]);
    project.write_manifest("services:\n  log-collector:\n    build: ./log-collector\n");
    let config = config_for(
        &project,
        Some(vec!["log-collector".into(), "persistor-auth".into()]),
    );
    let runner = RecordingRunner::new();
    let pipeline = Pipeline::new(&config, &runner, credentials(), PipelineOptions::default());

    let report = pipeline.run(&StageSelection::full()).await.unwrap();

    assert!(matches!(
        report.failure,
        Some(PipelineError::StageFailed {
            stage: Stage::Rewrite,
            ..
        })
    ));
    assert!(matches!(
        report.status_of(Stage::Restart),
        Some(StageStatus::Skipped(_))
    ));
    assert_eq!(
        project.read_manifest(),
        "services:\n  log-collector:\n    build: ./log-collector\n"
    );
    assert!(!runner.command_lines().iter().any(|l| l.contains("compose")));
}

#[tokio::test]
async fn test_second_rewrite_is_unchanged() {
    let project = TestProject::with_services(&["log-collector", "persistor-auth"]);
    let config = config_for(
        &project,
        Some(vec!["log-collector".into(), "persistor-auth".into()]),
    );
    let runner = RecordingRunner::new();

    let first = Pipeline::new(&config, &runner, None, PipelineOptions::default())
        .run(&StageSelection::rewrite_only())
        .await
        .unwrap();
    let after_first = project.read_manifest();

    let second = Pipeline::new(&config, &runner, None, PipelineOptions::default())
        .run(&StageSelection::rewrite_only())
        .await
        .unwrap();

    assert!(first.is_success());
    assert!(second.is_success());
    assert_eq!(project.read_manifest(), after_first);
    let detail = second.records[0].detail.clone().unwrap_or_default();
    assert_eq!(detail, "0 rewritten, 0 retagged, 2 unchanged");
    assert!(runner.invocations().is_empty());
}

#[tokio::test]
async fn test_password_never_in_argv() {
    let project = TestProject::with_services(&["log-collector", "persistor-auth"]);
    let config = config_for(
        &project,
        Some(vec!["log-collector".into(), "persistor-auth".into()]),
    );
    let runner = RecordingRunner::new();
    let pipeline = Pipeline::new(&config, &runner, credentials(), PipelineOptions::default());

    pipeline.run(&StageSelection::full()).await.unwrap();

    for invocation in runner.invocations() {
        assert!(!invocation.args.iter().any(|a| a.contains(PASSWORD)));
        assert!(!invocation.to_string().contains(PASSWORD));
    }
    let login = runner
        .invocations()
        .into_iter()
        .find(|i| i.args.first().map(String::as_str) == Some("login"))
        .unwrap();
    assert_eq!(login.stdin().map(|s| s.expose()), Some(PASSWORD));
}

#[tokio::test]
async fn test_dry_run_leaves_manifest() {
    let project = TestProject::with_services(&["log-collector", "persistor-auth"]);
    let before = project.read_manifest();
    let config = config_for(
        &project,
        Some(vec!["log-collector".into(), "persistor-auth".into()]),
    );
    let runner = RecordingRunner::new();
    let options = PipelineOptions {
        dry_run: true,
        ..Default::default()
    };
    let pipeline = Pipeline::new(&config, &runner, credentials(), options);

    let report = pipeline.run(&StageSelection::full()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(project.read_manifest(), before);
    assert_eq!(
        runner.command_lines().last().map(String::as_str),
        Some("docker logout")
    );
}
