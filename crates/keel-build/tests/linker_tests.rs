//! Whole-workspace linking

mod common;

use common::{add, names, TARGET};
use keel_build::{
    BuildError, DependencySetting, LinkOptions, Linker, LinkerConfig, OutputKind, Workspace,
};
use keel_config::{ConfigLoader, DumpFormat};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn game_workspace() -> Workspace {
    let mut ws = Workspace::new();
    add(&mut ws, "game::Core", OutputKind::Lib, |_| {});
    add(&mut ws, "game::Audio", OutputKind::Dll, |c| {
        c.add_private_dependency("game::Core", TARGET, DependencySetting::DEFAULT)
            .unwrap();
    });
    add(&mut ws, "game::Engine", OutputKind::Lib, |c| {
        c.add_public_dependency("game::Core", TARGET, DependencySetting::DEFAULT)
            .unwrap();
    });
    add(&mut ws, "game::Game", OutputKind::Exe, |c| {
        c.add_public_dependency("game::Engine", TARGET, DependencySetting::DEFAULT)
            .unwrap();
        c.add_private_dependency("game::Audio", TARGET, DependencySetting::DEFAULT)
            .unwrap();
    });
    ws
}

#[rstest]
#[case::multithreaded(true)]
#[case::sequential(false)]
fn test_link_all(#[case] multithreaded: bool) {
    let ws = game_workspace();
    let linker = Linker::default().with_multithreaded(multithreaded);

    let stats = linker.link_all(&ws).unwrap();
    assert_eq!(stats.total_configurations, 4);
    assert_eq!(stats.linked_configurations, 4);
    assert_eq!(stats.skipped_configurations, 0);
    assert!(ws.configurations().all(|c| c.is_linked()));

    let game = ws
        .configurations()
        .find(|c| c.project().name == "Game")
        .unwrap();
    let resolved = game.resolved().unwrap();
    assert_eq!(names(&resolved.public_dependencies), vec!["Core", "Engine"]);
    assert_eq!(names(&resolved.private_dependencies), vec!["Audio"]);
}

#[test]
fn test_link_all_twice_skips_linked() {
    let ws = game_workspace();
    let linker = Linker::default();

    linker.link_all(&ws).unwrap();
    let stats = linker.link_all(&ws).unwrap();
    assert_eq!(stats.linked_configurations, 0);
    assert_eq!(stats.skipped_configurations, 4);
}

#[test]
fn test_parallel_matches_sequential() {
    let parallel = game_workspace();
    let sequential = game_workspace();
    Linker::default().with_multithreaded(true).link_all(&parallel).unwrap();
    Linker::default().with_multithreaded(false).link_all(&sequential).unwrap();

    for (a, b) in parallel.configurations().zip(sequential.configurations()) {
        let (ra, rb) = (a.resolved().unwrap(), b.resolved().unwrap());
        assert_eq!(names(&ra.dependencies), names(&rb.dependencies));
        assert_eq!(names(&ra.link_dependencies), names(&rb.link_dependencies));
        assert_eq!(ra.copy_files, rb.copy_files);
    }
}

#[test]
fn test_link_all_reports_cycle() {
    let mut ws = Workspace::new();
    add(&mut ws, "c::A", OutputKind::Lib, |c| {
        c.add_public_dependency("c::B", TARGET, DependencySetting::DEFAULT)
            .unwrap();
    });
    add(&mut ws, "c::B", OutputKind::Lib, |c| {
        c.add_public_dependency("c::A", TARGET, DependencySetting::DEFAULT)
            .unwrap();
    });

    let err = Linker::default()
        .with_multithreaded(false)
        .link_all(&ws)
        .unwrap_err();
    assert!(matches!(err, BuildError::CircularDependency(_)));

    let stats = Linker::default()
        .with_options(LinkOptions::default().with_strict_cycles(false))
        .link_all(&ws)
        .unwrap();
    assert_eq!(stats.linked_configurations, 2);
}

#[rstest]
#[case::json(DumpFormat::Json, "\"id\": \"game::Game [win64|debug]\"")]
#[case::dot(
    DumpFormat::Dot,
    "\"game::Game [win64|debug]\" -> \"game::Engine [win64|debug]\" [color=green"
)]
fn test_dump_written(#[case] format: DumpFormat, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graphs").join(format!("deps.{}", format.extension()));
    let ws = game_workspace();

    Linker::default().with_dump(&path, format).link_all(&ws).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains(expected), "{contents}");
    assert!(contents.contains("game::Audio [win64|debug]"));
}

#[test]
fn test_linker_config_from_keel_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("keel.toml"),
        r#"
[link]
multithreaded = false
threads = 2
strict_cycles = false

[dump]
enabled = true
format = "json"
path = "out/deps.json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_global_config_path(dir.path().join("none.toml"))
        .load_from_directory(dir.path())
        .unwrap();
    let linker_config = LinkerConfig::from_config(&config);

    assert!(!linker_config.multithreaded);
    assert_eq!(linker_config.threads, Some(2));
    assert!(!linker_config.options.strict_cycles);
    assert_eq!(
        linker_config.dump,
        Some((dir.path().join("out/deps.json"), DumpFormat::Json))
    );

    let ws = game_workspace();
    Linker::default()
        .with_config(linker_config)
        .link_all(&ws)
        .unwrap();
    assert!(dir.path().join("out/deps.json").exists());
}

#[test]
fn test_linker_config_defaults() {
    let config = LinkerConfig::default();
    assert!(config.multithreaded);
    assert_eq!(config.threads, None);
    assert!(config.options.strict_cycles);
    assert!(config.dump.is_none());
    assert!(Linker::default().config().dump.is_none());
}
