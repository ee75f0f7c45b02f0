//! Per-section validators.

use crate::schema::SupaConfig;

use super::helpers::{validate_range, validate_required};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Host and key are only needed when the URL is derived from them.
pub(crate) fn validate_project(errors: &mut Vec<String>, config: &SupaConfig) {
    if config.realtime.custom_url.is_some() {
        return;
    }
    validate_required(errors, "project.host", &config.project.host);
    validate_required(errors, "project.api_key", &config.project.api_key);
    if config.project.host.contains("://") {
        errors.push("project.host must not include a scheme".into());
    }
}

pub(crate) fn validate_realtime(errors: &mut Vec<String>, config: &SupaConfig) {
    let rt = &config.realtime;
    validate_range(
        errors,
        "realtime.heartbeat_interval_secs",
        rt.heartbeat_interval_secs,
        1,
        300,
    );
    validate_range(
        errors,
        "realtime.connect_timeout_secs",
        rt.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "realtime.join_timeout_secs",
        rt.join_timeout_secs,
        1,
        120,
    );

    if let Some(url) = &rt.custom_url {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            errors.push(format!(
                "realtime.custom_url = {url:?} must start with ws:// or wss://"
            ));
        }
    }

    if rt.websocket.max_message_size == Some(0) {
        errors.push("realtime.websocket.max_message_size must be greater than 0".into());
    }
}

pub(crate) fn validate_logging(errors: &mut Vec<String>, config: &SupaConfig) {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(format!(
            "logging.level = {:?} must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }
}
