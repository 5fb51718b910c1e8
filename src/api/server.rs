use crate::api::events::WebSocketManager;
use crate::api::{browse, commands, events};
use crate::config::get_service_config;
use crate::constants::{API_PREFIX, DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_WEBROOT};
use crate::player::PlayerSupervisor;

use log::{info, warn};
use rocket::config::Config;
use rocket::fs::FileServer;
use rocket::serde::json::Json;
use rocket::{get, routes};
use std::path::Path;
use std::sync::Arc;

// Define the version response struct
#[derive(serde::Serialize)]
struct VersionResponse {
    version: String,
}

// API endpoint to get the version
#[get("/version")]
fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// Start the Rocket server
pub async fn start_rocket_server(
    supervisor: Arc<PlayerSupervisor>,
    ws_manager: Arc<WebSocketManager>,
    config_json: &serde_json::Value,
    port_override: Option<u16>,
) -> Result<(), rocket::Error> {
    let webserver_config = get_service_config(config_json, "webserver");

    let host = webserver_config
        .and_then(|ws| ws.get("host"))
        .and_then(|h| h.as_str())
        .unwrap_or(DEFAULT_HTTP_HOST);

    let port = port_override.unwrap_or_else(|| {
        webserver_config
            .and_then(|ws| ws.get("port"))
            .and_then(|p| p.as_u64())
            .map(|p| p as u16)
            .unwrap_or(DEFAULT_HTTP_PORT)
    });

    let webroot = webserver_config
        .and_then(|ws| ws.get("webroot"))
        .and_then(|w| w.as_str())
        .unwrap_or(DEFAULT_WEBROOT);

    info!("starting webserver on {}:{}", host, port);

    let config = Config::figment()
        .merge(("port", port))
        .merge(("address", host));

    let api_routes = routes![
        get_version,
        commands::send_command,
        browse::browse,
        events::status_socket,
    ];

    let mut rocket_builder = rocket::custom(config)
        .mount(API_PREFIX, api_routes)
        .manage(supervisor)
        .manage(ws_manager);

    if Path::new(webroot).is_dir() {
        info!("serving static files from '{}'", webroot);
        rocket_builder = rocket_builder.mount("/", FileServer::from(webroot));
    } else {
        warn!("webroot '{}' not found, static file serving disabled", webroot);
    }

    let _rocket = rocket_builder.launch().await?;

    Ok(())
}
