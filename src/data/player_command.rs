/// Commands that clients can send to the player supervisor
use serde::{Deserialize, Serialize};

/// A command envelope received from a client.
///
/// The wire format is an internally tagged JSON object, e.g.
/// `{"type": "load", "path": "/media/a.mkv"}` or `{"type": "pause"}`.
/// Envelopes with an unknown `type` fail deserialization and are dropped
/// by the gateway without an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlayerCommand {
    /// Load a media file and start playback fullscreen
    Load {
        /// Absolute path of the media file to load
        path: String,
    },

    /// Toggle pause
    Pause,

    /// Stop playback and let the player process exit
    Stop,

    /// Switch the player window to fullscreen
    Fullscreen,

    /// Seek 60 seconds backwards
    Rewind1m,

    /// Seek 10 seconds backwards
    Rewind10s,

    /// Seek 10 seconds forwards
    Forward10s,

    /// Seek 60 seconds forwards
    Forward1m,

    /// Seek to an absolute position
    Seek {
        /// Target position in seconds from the start of the media
        position: f64,
    },
}

impl std::fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerCommand::Load { path } => write!(f, "load:{}", path),
            PlayerCommand::Pause => write!(f, "pause"),
            PlayerCommand::Stop => write!(f, "stop"),
            PlayerCommand::Fullscreen => write!(f, "fullscreen"),
            PlayerCommand::Rewind1m => write!(f, "rewind1m"),
            PlayerCommand::Rewind10s => write!(f, "rewind10s"),
            PlayerCommand::Forward10s => write!(f, "forward10s"),
            PlayerCommand::Forward1m => write!(f, "forward1m"),
            PlayerCommand::Seek { position } => write!(f, "seek:{}", position),
        }
    }
}
