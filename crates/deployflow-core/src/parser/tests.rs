use super::*;

#[test]
fn test_parse_full_pipeline() {
    let kdl = r#"
        pipeline "log-stack"
        namespace "mudam5"
        tag "latest"
        source "https://github.com/org/logs.git" branch="release"
        workdir "checkout"
        manifest "compose.yml"
        concurrency 3
        services {
            service "log-collector"
            service "persistor-auth"
        }
    "#;

    let settings = parse_pipeline_string(kdl).unwrap();
    assert_eq!(settings.name.as_deref(), Some("log-stack"));
    assert_eq!(settings.namespace.as_deref(), Some("mudam5"));
    assert_eq!(settings.tag.as_deref(), Some("latest"));
    assert_eq!(
        settings.repository.as_deref(),
        Some("https://github.com/org/logs.git")
    );
    assert_eq!(settings.branch.as_deref(), Some("release"));
    assert_eq!(settings.workdir, Some(PathBuf::from("checkout")));
    assert_eq!(settings.manifest, Some(PathBuf::from("compose.yml")));
    assert_eq!(settings.concurrency, Some(3));
    assert_eq!(
        settings.services,
        Some(vec![
            "log-collector".to_string(),
            "persistor-auth".to_string()
        ])
    );
}

#[test]
fn test_parse_inline_services() {
    let kdl = r#"
        namespace "mudam5"
        services "log-ui" "log-collector"
    "#;

    let settings = parse_pipeline_string(kdl).unwrap();
    // 宣言順がそのまま保持される
    assert_eq!(
        settings.services,
        Some(vec!["log-ui".to_string(), "log-collector".to_string()])
    );
}

#[test]
fn test_parse_registry_alias() {
    let settings = parse_pipeline_string(r#"registry "ghcr.io/org""#).unwrap();
    assert_eq!(settings.namespace.as_deref(), Some("ghcr.io/org"));
}

#[test]
fn test_parse_source_without_branch() {
    let settings = parse_pipeline_string(r#"source "https://example.com/r.git""#).unwrap();
    assert!(settings.repository.is_some());
    assert!(settings.branch.is_none());
}

#[test]
fn test_services_declared_twice_rejected() {
    let kdl = r#"
        services "a"
        services "b"
    "#;
    assert!(matches!(
        parse_pipeline_string(kdl),
        Err(FlowError::InvalidConfig(_))
    ));
}

#[test]
fn test_negative_concurrency_rejected() {
    assert!(parse_pipeline_string("concurrency -1").is_err());
    assert!(parse_pipeline_string(r#"concurrency "two""#).is_err());
}

#[test]
fn test_missing_argument_rejected() {
    assert!(parse_pipeline_string("namespace").is_err());
}

#[test]
fn test_invalid_kdl() {
    assert!(matches!(
        parse_pipeline_string("namespace \"unterminated"),
        Err(FlowError::KdlParse(_))
    ));
}

#[test]
fn test_unknown_nodes_are_ignored() {
    let settings = parse_pipeline_string(
        r#"
        namespace "mudam5"
        notify "slack"
    "#,
    )
    .unwrap();
    assert_eq!(settings.namespace.as_deref(), Some("mudam5"));
}

#[test]
fn test_parse_file_resolves_workdir_against_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployflow.kdl");
    std::fs::write(&path, "namespace \"mudam5\"\nworkdir \"checkout\"\n").unwrap();

    let settings = parse_pipeline_file(&path).unwrap();
    assert_eq!(settings.workdir, Some(dir.path().join("checkout")));
}

#[test]
fn test_parse_file_without_workdir_leaves_it_unset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployflow.kdl");
    std::fs::write(&path, "namespace \"mudam5\"\n").unwrap();

    let settings = parse_pipeline_file(&path).unwrap();
    assert_eq!(settings.workdir, None);
}

#[test]
fn test_parse_hidden_dir_file_resolves_workdir_against_project_root() {
    let dir = tempfile::tempdir().unwrap();
    let hidden = dir.path().join(".deployflow");
    std::fs::create_dir(&hidden).unwrap();
    let path = hidden.join("deployflow.kdl");
    std::fs::write(&path, "namespace \"mudam5\"\nworkdir \"checkout\"\n").unwrap();

    let settings = parse_pipeline_file(&path).unwrap();
    assert_eq!(settings.workdir, Some(dir.path().join("checkout")));
}
