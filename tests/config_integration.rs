use std::path::PathBuf;

use chartpad::chart::ChartType;
use chartpad::config::{ConfigFlags, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".chartpadrc");
    let content = r#"
# comment
--no-mouse

--type mindmap

--render-debug-log=render.log
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_mouse);
    assert_eq!(flags.chart_type, Some(ChartType::MindMap));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".chartpadrc");
    let content = "--no-mouse\n--type mindmap\n--debounce-ms 500\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "chartpad".to_string(),
        "--type".to_string(),
        "flowchart".to_string(),
        "--perf".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_mouse, "file flags should remain enabled");
    assert!(effective.perf, "cli flags should be applied");
    assert_eq!(
        effective.chart_type,
        Some(ChartType::Flowchart),
        "cli should override chart type"
    );
    assert_eq!(effective.debounce_ms, Some(500));
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_local_override_wins_over_global() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("config");
    let local = dir.path().join(".chartpadrc");
    std::fs::write(&global, "--debounce-ms 500\n--export-dir global-out\n").unwrap();
    std::fs::write(&local, "--debounce-ms 120\n").unwrap();

    let merged = load_config_flags(&global)
        .unwrap()
        .union(&load_config_flags(&local).unwrap());
    assert_eq!(merged.debounce_ms, Some(120));
    assert_eq!(merged.export_dir, Some(PathBuf::from("global-out")));
}

#[test]
fn test_missing_config_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "chartpad".to_string(),
        "--type=mermaid".to_string(),
        "--state-file=state.json".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.chart_type, Some(ChartType::Flowchart));
    assert_eq!(flags.state_file, Some(PathBuf::from("state.json")));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        no_mouse: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        perf: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.no_mouse);
    assert!(merged.perf);
}
