//! Command gateway: the single entry point client commands pass through on
//! their way to the supervisor.

use std::sync::Arc;

use log::debug;
use rocket::serde::json::Json;
use rocket::State;

use crate::data::{PlayerCommand, PlayerStatus};
use crate::player::PlayerSupervisor;

/// Forward a validated command to the supervisor. Commands are
/// fire-and-forget: the caller gets no success or failure signal beyond the
/// next status broadcast.
pub fn dispatch(supervisor: &Arc<PlayerSupervisor>, command: PlayerCommand) {
    debug!("dispatching command: {}", command);
    supervisor.handle_command(command);
}

/// REST variant of the command gateway. Malformed or unknown envelopes are
/// rejected by the JSON guard before reaching this handler; well-formed ones
/// are answered with the current status snapshot (which may not yet reflect
/// the command — the WebSocket broadcast will).
#[rocket::post("/command", format = "json", data = "<command>")]
pub fn send_command(
    command: Json<PlayerCommand>,
    supervisor: &State<Arc<PlayerSupervisor>>,
) -> Json<PlayerStatus> {
    dispatch(supervisor.inner(), command.into_inner());
    Json(supervisor.status())
}
