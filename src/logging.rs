// Logging setup for PlayerControl
//
// Uses env_logger with the default filter taken from the configuration and
// still overridable through RUST_LOG. Per-module overrides let the protocol
// chatter be turned up without drowning the rest of the log.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::str::FromStr;

use crate::config::get_service_config;

/// Initialize the global logger.
///
/// Configuration section:
/// ```json
/// { "logging": { "level": "info", "modules": { "playercontrol::player": "debug" } } }
/// ```
pub fn init_logging(config: &serde_json::Value) {
    let logging_config = get_service_config(config, "logging");

    let default_level = logging_config
        .and_then(|l| l.get("level"))
        .and_then(|v| v.as_str())
        .unwrap_or("info");

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_secs();

    if let Some(modules) = logging_config
        .and_then(|l| l.get("modules"))
        .and_then(|m| m.as_object())
    {
        for (module, level) in modules {
            if let Some(level) = level.as_str().and_then(|l| LevelFilter::from_str(l).ok()) {
                builder.filter_module(module, level);
            }
        }
    }

    builder.init();
}
