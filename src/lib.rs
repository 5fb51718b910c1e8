/// Data structures shared between the supervisor and the API
pub mod data;

/// Player subprocess supervision and the slave-mode protocol
pub mod player;

/// HTTP and WebSocket API
pub mod api;

/// Configuration loading
pub mod config;

/// Logging setup
pub mod logging;

/// Shared constants
pub mod constants;

// Re-export the types most callers need
pub use data::{PlayerCommand, PlayerStatus};
pub use player::{PlayerSupervisor, StatusListener, StatusPoller};
