//! Comprehensive configuration loading and precedence tests

use keel_config::{ConfigError, ConfigLoader, DumpFormat, LinkConfig, ProjectConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("keel.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn loader_with_global(dir: &Path, global: Option<&str>) -> ConfigLoader {
    let global_path = dir.join("global.toml");
    if let Some(content) = global {
        fs::write(&global_path, content).unwrap();
    }
    ConfigLoader::new().with_global_config_path(global_path)
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_when_no_config_exists() {
    let temp_dir = TempDir::new().unwrap();

    let mut loader = loader_with_global(temp_dir.path(), None);
    let config = loader.load_from_directory(temp_dir.path()).unwrap();

    assert!(!config.is_project());
    assert!(config.multithreaded());
    assert!(config.strict_cycles());
}

#[test]
#[serial]
fn test_load_with_empty_config() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "");

    let mut loader = loader_with_global(temp_dir.path(), None);
    let config = loader.load_from_directory(temp_dir.path()).unwrap();

    // Empty config is valid (all fields optional)
    assert!(config.is_project());
    assert_eq!(config.project, ProjectConfig::default());
}

#[test]
#[serial]
fn test_load_from_nested_subdirectory_finds_parent() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[dump]
enabled = true
"#,
    );

    let nested = temp_dir.path().join("sub1").join("sub2");
    fs::create_dir_all(&nested).unwrap();

    let mut loader = loader_with_global(temp_dir.path(), None);
    let config = loader.load_from_directory(&nested).unwrap();

    assert!(config.dump_enabled());
    assert_eq!(config.project_root(), Some(temp_dir.path()));
    assert_eq!(config.dump_path(), temp_dir.path().join("dependencies.dot"));
}

#[test]
#[serial]
fn test_load_from_specific_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[link]
threads = 3
"#,
    );

    let mut loader = loader_with_global(temp_dir.path(), None);
    let config = loader.load_from_file(&path).unwrap();

    assert_eq!(config.threads(), Some(3));
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_invalid_toml_syntax() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[link\nmultithreaded = true");

    let result = ProjectConfig::load_from_file(&path);
    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[test]
fn test_unknown_field_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[link]
parallelism = "max"
"#,
    );

    let result = ProjectConfig::load_from_file(&path);
    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[test]
fn test_missing_file_reports_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result = ProjectConfig::load_from_file(&temp_dir.path().join("keel.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[rstest]
#[case("json", DumpFormat::Json)]
#[case("dot", DumpFormat::Dot)]
fn test_dump_formats(#[case] format: &str, #[case] expected: DumpFormat) {
    let toml = format!("[dump]\nformat = \"{}\"\n", format);
    let config: ProjectConfig = toml::from_str(&toml).unwrap();
    assert_eq!(config.dump.unwrap().format, Some(expected));
}

#[test]
fn test_unknown_dump_format_rejected() {
    let result: Result<ProjectConfig, _> = toml::from_str("[dump]\nformat = \"svg\"\n");
    assert!(result.is_err());
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_global_defaults_apply_when_project_silent() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "");

    let mut loader = loader_with_global(
        temp_dir.path(),
        Some(
            r#"
[defaults]
multithreaded = false
threads = 2
dump_format = "json"
"#,
        ),
    );
    let config = loader.load_from_directory(temp_dir.path()).unwrap();

    assert!(!config.multithreaded());
    assert_eq!(config.threads(), Some(2));
    assert_eq!(config.dump_format(), DumpFormat::Json);
}

#[test]
#[serial]
fn test_project_overrides_global() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[link]
multithreaded = true
threads = 8
"#,
    );

    let mut loader = loader_with_global(
        temp_dir.path(),
        Some(
            r#"
[defaults]
multithreaded = false
threads = 2
"#,
        ),
    );
    let config = loader.load_from_directory(temp_dir.path()).unwrap();

    assert!(config.multithreaded());
    assert_eq!(config.threads(), Some(8));
}

#[rstest]
#[case("true", true)]
#[case("1", true)]
#[case("YES", true)]
#[case("false", false)]
#[case("0", false)]
#[serial]
fn test_env_override_multithreaded(#[case] value: &str, #[case] expected: bool) {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[link]
multithreaded = true
"#,
    );

    env::set_var("KEEL_MULTITHREADED", value);
    let mut loader = loader_with_global(temp_dir.path(), None);
    let config = loader.load_from_directory(temp_dir.path()).unwrap();
    env::remove_var("KEEL_MULTITHREADED");

    assert_eq!(config.multithreaded(), expected);
}

#[test]
#[serial]
fn test_env_enables_dump() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("KEEL_DUMP_GRAPH", "1");
    let mut loader = loader_with_global(temp_dir.path(), None);
    let config = loader.load_from_directory(temp_dir.path()).unwrap();
    env::remove_var("KEEL_DUMP_GRAPH");

    assert!(config.dump_enabled());
}

#[test]
#[serial]
fn test_env_zero_threads_rejected() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("KEEL_THREADS", "0");
    let mut loader = loader_with_global(temp_dir.path(), None);
    let result = loader.load_from_directory(temp_dir.path());
    env::remove_var("KEEL_THREADS");

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_caller_overrides_beat_env() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[link]
threads = 8
strict_cycles = true
"#,
    );

    env::set_var("KEEL_MULTITHREADED", "true");
    let mut loader = loader_with_global(temp_dir.path(), None);
    let loaded = loader.load_from_directory(temp_dir.path());
    env::remove_var("KEEL_MULTITHREADED");

    let overrides = ProjectConfig {
        link: Some(LinkConfig {
            multithreaded: Some(false),
            strict_cycles: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    };
    let config = loaded.unwrap().with_overrides(&overrides).unwrap();

    assert!(!config.multithreaded());
    assert!(!config.strict_cycles());
    assert_eq!(config.threads(), Some(8));
}
