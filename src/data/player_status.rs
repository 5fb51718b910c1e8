/// Snapshot of the controlled player's state
use serde::{Deserialize, Serialize};

/// Complete state of the player as last reported by the subprocess.
///
/// This is the snapshot broadcast to every connected client. The supervisor
/// is the only component that mutates it; everyone else receives a copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// A media item has been accepted and playback has started
    pub loaded: bool,

    /// Playback is paused (false until the first `pause` answer arrives)
    pub paused: bool,

    /// Last known playback offset in seconds
    pub position: f64,

    /// Last known media duration in seconds
    pub length: f64,

    /// Directory component of the loaded media, as reported by the player
    pub path: String,

    /// Base file name of the loaded media, as reported by the player
    pub filename: String,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.loaded {
            write!(
                f,
                "{} ({}/{}s{})",
                self.filename,
                self.position,
                self.length,
                if self.paused { ", paused" } else { "" }
            )
        } else {
            write!(f, "no media loaded")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero_state() {
        let status = PlayerStatus::default();
        assert!(!status.loaded);
        assert!(!status.paused);
        assert_eq!(status.position, 0.0);
        assert_eq!(status.length, 0.0);
        assert_eq!(status.path, "");
        assert_eq!(status.filename, "");
    }

    #[test]
    fn test_serialized_field_names() {
        let status = PlayerStatus {
            loaded: true,
            paused: false,
            position: 12.5,
            length: 3600.0,
            path: "/media".to_string(),
            filename: "a.mkv".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["loaded"], true);
        assert_eq!(json["paused"], false);
        assert_eq!(json["position"], 12.5);
        assert_eq!(json["length"], 3600.0);
        assert_eq!(json["path"], "/media");
        assert_eq!(json["filename"], "a.mkv");
    }
}
