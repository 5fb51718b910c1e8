use clap::Parser;
use log::{error, info};
use playercontrol::api::events::{self, WebSocketManager};
use playercontrol::api::server::start_rocket_server;
use playercontrol::config::{get_service_config, load_config};
use playercontrol::constants::DEFAULT_POLL_INTERVAL_MS;
use playercontrol::player::{PlayerSupervisor, StatusListener, StatusPoller};
use playercontrol::logging::init_logging;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Web remote control for an MPlayer instance in slave mode
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "playercontrol.json")]
    config: PathBuf,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[rocket::main]
async fn main() {
    let args = Args::parse();

    let config = load_config(&args.config);
    init_logging(&config);

    info!("PlayerControl {} starting", env!("CARGO_PKG_VERSION"));

    let supervisor = Arc::new(PlayerSupervisor::from_config(&config));

    // The websocket manager observes every status change the supervisor makes
    let ws_manager = Arc::new(WebSocketManager::new());
    supervisor.register_status_listener(Arc::downgrade(&ws_manager) as Weak<dyn StatusListener>);
    events::start_prune_task(ws_manager.clone());

    let poll_interval = get_service_config(&config, "poller")
        .and_then(|p| p.get("interval_ms"))
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    let mut poller =
        StatusPoller::with_interval(supervisor.clone(), Duration::from_millis(poll_interval));

    // Make sure the player process does not outlive the server
    let shutdown_supervisor = supervisor.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("shutting down");
        shutdown_supervisor.shutdown();
        std::process::exit(0);
    }) {
        error!("cannot install signal handler: {}", e);
    }

    if let Err(e) = start_rocket_server(supervisor.clone(), ws_manager, &config, args.port).await {
        error!("webserver failed: {}", e);
    }

    poller.stop();
    supervisor.shutdown();
}
