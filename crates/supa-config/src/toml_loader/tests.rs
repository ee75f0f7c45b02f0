//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_supa_realtime_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, supa_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[project]
host = "abc.supabase.co"
api_key = "anon"

[realtime]
heartbeat_interval_secs = 25
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.project.host, "abc.supabase.co");
    assert_eq!(config.project.api_key, "anon");
    assert_eq!(config.realtime.heartbeat_interval_secs, 25);
    // Defaults preserved
    assert!(config.realtime.secure);
    assert_eq!(config.realtime.join_timeout_secs, 10);
    assert!(config.realtime.custom_url.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn load_websocket_subsection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[realtime.websocket]
subprotocols = ["phoenix"]
max_message_size = 1024
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.realtime.websocket.subprotocols, vec!["phoenix"]);
    assert_eq!(config.realtime.websocket.max_message_size, Some(1024));
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, supa_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_is_returned_as_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[realtime]
heartbeat_interval_secs = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.realtime.heartbeat_interval_secs, 0);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("supa-realtime").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert!(config.realtime.secure);
    assert_eq!(config.realtime.heartbeat_interval_secs, 10);
}

#[test]
fn create_default_config_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    assert!(create_default_config(&path).is_err());
    assert_eq!(load_from_path(&path).unwrap().logging.level, "debug");
}

#[test]
fn config_path_is_app_dir_then_file() {
    let path = super::paths::config_path_in(Path::new("/home/u/.config"));
    assert_eq!(path, Path::new("/home/u/.config/supa-realtime/config.toml"));
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::SupaConfig;

    let config: SupaConfig = toml::from_str(&default_config_toml()).unwrap();
    assert_eq!(config.realtime.connect_timeout_secs, 15);
}

#[test]
fn default_config_path_is_reasonable() {
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("supa-realtime"));
        assert!(path_str.ends_with("config.toml"));
    }
}
