// Configuration utilities for PlayerControl
//
// The configuration is a single JSON file with per-service sections grouped
// under a "services" subtree; sections at the top level are still honored
// for configs written before the subtree existed.

use log::{debug, warn};
use std::path::Path;

/// Read the configuration file at `path`.
///
/// A missing or unparsable file is not fatal: the server runs on built-in
/// defaults and the problem is logged.
pub fn load_config(path: &Path) -> serde_json::Value {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => {
                debug!("loaded configuration from {}", path.display());
                value
            }
            Err(e) => {
                warn!(
                    "invalid configuration in {}: {}, using defaults",
                    path.display(),
                    e
                );
                serde_json::json!({})
            }
        },
        Err(e) => {
            warn!(
                "cannot read configuration {}: {}, using defaults",
                path.display(),
                e
            );
            serde_json::json!({})
        }
    }
}

/// Look up a service section, preferring the "services" subtree and falling
/// back to a top-level section of the same name.
pub fn get_service_config<'a>(
    config: &'a serde_json::Value,
    service_name: &str,
) -> Option<&'a serde_json::Value> {
    if let Some(services) = config.get("services") {
        if let Some(service_config) = services.get(service_name) {
            return Some(service_config);
        }
    }

    if let Some(service_config) = config.get(service_name) {
        debug!("found {} configuration at top level", service_name);
        return Some(service_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_services_subtree_is_preferred() {
        let config = json!({
            "services": { "webserver": { "port": 8080 } },
            "webserver": { "port": 9090 }
        });
        let webserver = get_service_config(&config, "webserver").unwrap();
        assert_eq!(webserver["port"], 8080);
    }

    #[test]
    fn test_top_level_fallback() {
        let config = json!({ "player": { "binary": "mplayer2" } });
        let player = get_service_config(&config, "player").unwrap();
        assert_eq!(player["binary"], "mplayer2");
    }

    #[test]
    fn test_missing_section() {
        assert!(get_service_config(&json!({}), "webserver").is_none());
    }

    #[test]
    fn test_load_config_missing_file_yields_empty_object() {
        let config = load_config(Path::new("/nonexistent/playercontrol.json"));
        assert_eq!(config, json!({}));
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"services": {"poller": {"interval_ms": 500}}}"#).unwrap();
        let config = load_config(&path);
        assert_eq!(
            get_service_config(&config, "poller").unwrap()["interval_ms"],
            500
        );
    }
}
