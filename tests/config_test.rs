//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global → Config file: REPLACE per field, arrays replaced whole
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests pass the global config location explicitly, so the
//! user's own `~/.config/tipitree` is never read.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use tipitree::application::ApplicationError;
use tipitree::config::{RawSettings, Settings};

#[test]
fn given_global_and_file_config_when_load_then_file_wins_per_field() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("global.toml");
    fs::write(
        &global,
        r#"
[references]
source_attr = "href"

[split]
leaf_tag = "sutta"
level_tags = ["pitaka", "nikaya"]
"#,
    )
    .unwrap();
    let local = dir.path().join("local.toml");
    fs::write(
        &local,
        r#"
[split]
level_tags = ["only"]
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_layers(Some(global.as_path()), Some(local.as_path()))
        .expect("load settings");

    // Assert
    assert_eq!(settings.references.source_attr, "href");
    assert_eq!(settings.references.action_attr, "action");
    assert_eq!(settings.split.leaf_tag, "sutta");
    assert_eq!(settings.split.level_tags, vec!["only".to_string()]);
    assert_eq!(settings.split.toc_tag, "tree");
}

#[test]
fn given_missing_config_file_when_load_then_fails_with_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = Settings::load_layers(None, Some(missing.as_path()));

    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("not found")),
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
fn given_invalid_toml_when_load_then_fails_with_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[split\nleaf_tag = ").unwrap();

    let result = Settings::load_layers(None, Some(path.as_path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_stylesheet_path_when_load_then_path_is_kept() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "stylesheet = \"/etc/tipitree/rules.toml\"\n").unwrap();

    let settings = Settings::load_layers(None, Some(path.as_path())).unwrap();

    assert_eq!(
        settings.stylesheet,
        Some(PathBuf::from("/etc/tipitree/rules.toml"))
    );
}

#[test]
fn given_settings_when_serialized_then_reloads_to_same_values() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.split.leaf_tag = "sutta".into();
    let path = dir.path().join("shown.toml");
    fs::write(&path, settings.to_toml().unwrap()).unwrap();

    let reloaded = Settings::load_layers(None, Some(path.as_path())).unwrap();

    assert_eq!(reloaded, settings);
}

#[test]
fn given_template_when_written_as_config_then_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tipitree.toml");
    fs::write(&path, Settings::template()).unwrap();

    let settings = Settings::load_layers(None, Some(path.as_path())).unwrap();
    let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();

    assert_eq!(settings, Settings::default());
    assert!(raw.references.source_attr.is_none());
}
