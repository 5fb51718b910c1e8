//! WebSocket status broadcasting.
//!
//! The [`WebSocketManager`] is registered as a status listener on the
//! supervisor. Every status change stores a timestamped snapshot; each
//! connected client's channel task delivers the latest snapshot it has not
//! seen yet, so observers always converge on current state without ever
//! receiving a backlog. A client gets the current snapshot immediately on
//! connect and can send `command` envelopes back over the same socket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Use the correct rocket_ws imports
use rocket::futures::{SinkExt, StreamExt};
use rocket::State;
use rocket_ws::{Channel, Message, WebSocket};

use crate::api::commands;
use crate::data::{PlayerCommand, PlayerStatus};
use crate::player::{PlayerSupervisor, StatusListener};

/// How often each client task checks for a pending snapshot
const DELIVERY_INTERVAL: Duration = Duration::from_millis(250);

/// Outbound message: a full status snapshot
#[derive(Serialize)]
struct StatusMessage<'a> {
    event: &'static str,
    payload: &'a PlayerStatus,
}

/// Inbound message envelope; only `command` is understood
#[derive(Deserialize)]
struct InboundMessage {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Per-client bookkeeping
struct ClientState {
    /// Last time the client sent us anything; used for pruning
    last_activity: Instant,

    /// Snapshots stamped at or before this instant have been delivered
    last_delivery: Instant,
}

/// WebSocket client connection manager
pub struct WebSocketManager {
    /// Connected clients by id
    clients: Mutex<HashMap<usize, ClientState>>,

    /// Counter for generating unique client ids
    next_id: Mutex<usize>,

    /// The most recent status snapshot waiting to be delivered
    latest: Mutex<Option<(PlayerStatus, Instant)>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        WebSocketManager {
            clients: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
            latest: Mutex::new(None),
        }
    }

    fn next_id(&self) -> usize {
        match self.next_id.lock() {
            Ok(mut id) => {
                let current = *id;
                *id += 1;
                current
            }
            Err(_) => {
                warn!("client id lock poisoned");
                0
            }
        }
    }

    /// Register a new client connection
    pub fn register(&self) -> usize {
        let id = self.next_id();
        let now = Instant::now();
        if let Ok(mut clients) = self.clients.lock() {
            clients.insert(
                id,
                ClientState {
                    last_activity: now,
                    last_delivery: now,
                },
            );
            info!("websocket client connected (id {}), total {}", id, clients.len());
        }
        id
    }

    /// Remove a client connection
    pub fn remove_client(&self, id: usize) {
        if let Ok(mut clients) = self.clients.lock() {
            if clients.remove(&id).is_some() {
                info!(
                    "websocket client disconnected (id {}), remaining {}",
                    id,
                    clients.len()
                );
            }
        }
    }

    /// Record inbound traffic so the prune task keeps the client
    pub fn record_activity(&self, id: usize) {
        if let Ok(mut clients) = self.clients.lock() {
            if let Some(client) = clients.get_mut(&id) {
                client.last_activity = Instant::now();
            }
        }
    }

    /// The latest snapshot the client has not seen yet, if any.
    ///
    /// Intermediate snapshots a slow client missed are deliberately skipped;
    /// only current state matters.
    pub fn pending_for_client(&self, id: usize) -> Option<PlayerStatus> {
        let (snapshot, stamped) = match self.latest.lock() {
            Ok(latest) => latest.clone()?,
            Err(_) => return None,
        };

        match self.clients.lock() {
            Ok(mut clients) => {
                let client = clients.get_mut(&id)?;
                if stamped > client.last_delivery {
                    client.last_delivery = stamped;
                    Some(snapshot)
                } else {
                    None
                }
            }
            Err(_) => None,
        }
    }

    /// Drop clients that have been silent longer than `client_timeout`
    pub fn prune_inactive(&self, client_timeout: Duration) {
        let now = Instant::now();
        if let Ok(mut clients) = self.clients.lock() {
            let before = clients.len();
            clients.retain(|_, client| now.duration_since(client.last_activity) <= client_timeout);
            let removed = before - clients.len();
            if removed > 0 {
                info!("pruned {} inactive websocket clients", removed);
            }
        }
    }
}

impl Default for WebSocketManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Every status change lands here as the new pending broadcast
impl StatusListener for WebSocketManager {
    fn on_status_changed(&self, status: PlayerStatus) {
        debug!("queueing status broadcast: {}", status);
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some((status, Instant::now()));
        }
    }
}

/// Create a task to periodically prune inactive connections
pub fn start_prune_task(ws_manager: Arc<WebSocketManager>) {
    std::thread::spawn(move || loop {
        std::thread::sleep(Duration::from_secs(300));
        // Browsers that never send anything (not even a ping) for an hour
        // are considered gone
        ws_manager.prune_inactive(Duration::from_secs(3600));
    });
}

fn encode_status(status: &PlayerStatus) -> Option<String> {
    match serde_json::to_string(&StatusMessage {
        event: "status",
        payload: status,
    }) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("status serialization failed: {}", e);
            None
        }
    }
}

/// Handle one inbound text frame. Anything that is not a well-formed
/// command envelope is logged and dropped; the command model is
/// fire-and-forget and no error ever goes back over the socket.
fn handle_inbound(supervisor: &Arc<PlayerSupervisor>, client_id: usize, text: &str) {
    let message: InboundMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("client {}: unparsable message ({}): {}", client_id, e, text);
            return;
        }
    };

    if message.event != "command" {
        debug!("client {}: unknown event '{}'", client_id, message.event);
        return;
    }

    match serde_json::from_value::<PlayerCommand>(message.payload) {
        Ok(command) => commands::dispatch(supervisor, command),
        Err(e) => {
            debug!("client {}: unknown or malformed command: {}", client_id, e);
        }
    }
}

// WebSocket handler for the status endpoint
#[rocket::get("/status")]
pub fn status_socket(
    ws: WebSocket,
    supervisor: &State<Arc<PlayerSupervisor>>,
    ws_manager: &State<Arc<WebSocketManager>>,
) -> Channel<'static> {
    let supervisor = supervisor.inner().clone();
    let manager = ws_manager.inner().clone();

    ws.channel(move |mut stream| {
        Box::pin(async move {
            let client_id = manager.register();

            // New observers see current state right away, no round trip
            if let Some(json) = encode_status(&supervisor.status()) {
                if let Err(e) = stream.send(Message::Text(json)).await {
                    warn!("failed to send initial status: {}", e);
                    manager.remove_client(client_id);
                    return Err(e.into());
                }
            }

            let mut interval = tokio::time::interval(DELIVERY_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Some(status) = manager.pending_for_client(client_id) {
                            if let Some(json) = encode_status(&status) {
                                if let Err(e) = stream.send(Message::Text(json)).await {
                                    debug!("error sending status to client {}: {}", client_id, e);
                                    break;
                                }
                            }
                        }
                    }
                    Some(message) = stream.next() => {
                        match message {
                            Ok(message) => {
                                manager.record_activity(client_id);
                                match message {
                                    Message::Text(text) => {
                                        handle_inbound(&supervisor, client_id, &text);
                                    }
                                    Message::Ping(data) => {
                                        stream.send(Message::Pong(data)).await?;
                                    }
                                    Message::Close(_) => break,
                                    _ => {}
                                }
                            }
                            Err(e) => {
                                debug!("websocket error for client {}: {}", client_id, e);
                                break;
                            }
                        }
                    }
                    else => break,
                }
            }

            manager.remove_client(client_id);
            Ok(())
        })
    })
}
