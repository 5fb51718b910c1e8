//! Codec for the MPlayer slave-mode control protocol.
//!
//! The protocol is line oriented: commands are single ASCII lines written to
//! the player's stdin, status comes back as lines on its stdout. Output lines
//! are either unsolicited (most importantly `Starting playback...`, emitted
//! when a file actually starts playing) or answers to property queries of the
//! form `ANS_<key>=<value>`. Everything in this module is a pure translation;
//! no state is held here.

use std::str::FromStr;
use strum_macros::{EnumString, IntoStaticStr};

/// Exact unsolicited line the player prints once playback begins
const PLAYBACK_STARTED_LINE: &str = "Starting playback...";

/// Prefix of a property answer line
const ANSWER_PREFIX: &str = "ANS_";

/// Properties tracked by the supervisor.
///
/// The strum spelling (snake_case) is the protocol spelling used both in
/// `get_property` queries and in `ANS_` answer keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Property {
    Pause,
    TimePos,
    Length,
    Path,
    Filename,
}

impl Property {
    /// All tracked properties, in the order a full refresh queries them
    pub const ALL: [Property; 5] = [
        Property::Pause,
        Property::TimePos,
        Property::Length,
        Property::Path,
        Property::Filename,
    ];

    /// The properties that change while playing and are re-queried every
    /// poll tick. The rest are static once a file is loaded.
    pub const VOLATILE: [Property; 2] = [Property::Pause, Property::TimePos];

    /// Protocol spelling of the property name
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// A command that can be encoded into one protocol line.
#[derive(Debug, Clone, PartialEq)]
pub enum SlaveCommand {
    /// Load a media file and start playing it
    LoadFile(String),

    /// Toggle fullscreen (issued right after a load)
    ToggleFullscreen,

    /// Force the window into fullscreen without touching pause state
    ForceFullscreen,

    /// Toggle pause
    TogglePause,

    /// Quit the player process
    Quit,

    /// Seek relative to the current position, keeping pause state
    SeekRelative(f64),

    /// Seek to an absolute position in seconds, keeping pause state
    SeekAbsolute(f64),

    /// Query a property without disturbing pause state
    GetProperty(Property),
}

impl SlaveCommand {
    /// Encode this command as a single newline-terminated protocol line.
    ///
    /// Seeks use the `pausing_keep` prefix so that a paused player stays
    /// paused across the seek. Queries use `pausing_keep_force`, which also
    /// suppresses the one-frame step a plain `pausing_keep` would cause.
    pub fn to_line(&self) -> String {
        match self {
            SlaveCommand::LoadFile(path) => format!("loadfile \"{}\"\n", path),
            SlaveCommand::ToggleFullscreen => "vo_fullscreen\n".to_string(),
            SlaveCommand::ForceFullscreen => "pausing_keep_force vo_fullscreen 1\n".to_string(),
            SlaveCommand::TogglePause => "pause\n".to_string(),
            SlaveCommand::Quit => "quit\n".to_string(),
            SlaveCommand::SeekRelative(seconds) => format!("pausing_keep seek {} 0\n", seconds),
            SlaveCommand::SeekAbsolute(seconds) => format!("pausing_keep seek {} 1\n", seconds),
            SlaveCommand::GetProperty(property) => {
                format!("pausing_keep_force get_property {}\n", property.as_str())
            }
        }
    }
}

/// A property answer with its value already coerced to the tracked type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyAnswer {
    /// `pause`: anything other than `no` counts as paused
    Pause(bool),

    /// `time_pos` in seconds
    TimePos(f64),

    /// `length` in seconds
    Length(f64),

    /// Directory component of the playing media
    Path(String),

    /// Base file name of the playing media
    Filename(String),
}

impl PropertyAnswer {
    /// The property this answer belongs to
    pub fn property(&self) -> Property {
        match self {
            PropertyAnswer::Pause(_) => Property::Pause,
            PropertyAnswer::TimePos(_) => Property::TimePos,
            PropertyAnswer::Length(_) => Property::Length,
            PropertyAnswer::Path(_) => Property::Path,
            PropertyAnswer::Filename(_) => Property::Filename,
        }
    }
}

/// One decoded line of player output.
#[derive(Debug, Clone, PartialEq)]
pub enum SlaveEvent {
    /// The unsolicited "playback has started" marker
    PlaybackStarted,

    /// An answer to a property query
    Answer(PropertyAnswer),

    /// Anything else: noise, answers for untracked keys, malformed answers.
    /// Never an error; the caller logs and moves on.
    Ignored(String),
}

/// Decode one raw output line.
///
/// Lines are matched after stripping a trailing `\r` so CRLF output decodes
/// the same as LF output. Decoding never fails: unknown shapes come back as
/// [`SlaveEvent::Ignored`].
pub fn decode(raw: &str) -> SlaveEvent {
    let line = raw.trim_end_matches(['\r', '\n']);

    if line == PLAYBACK_STARTED_LINE {
        return SlaveEvent::PlaybackStarted;
    }

    if let Some(answer) = line.strip_prefix(ANSWER_PREFIX) {
        // Split on the first '='; an answer without one is malformed and
        // falls through to Ignored
        if let Some((key, value)) = answer.split_once('=') {
            if let Ok(property) = Property::from_str(key) {
                return SlaveEvent::Answer(coerce(property, value));
            }
        }
    }

    SlaveEvent::Ignored(line.to_string())
}

/// Coerce an answer value to the type of its property.
fn coerce(property: Property, value: &str) -> PropertyAnswer {
    match property {
        Property::Pause => PropertyAnswer::Pause(value != "no"),
        Property::TimePos => PropertyAnswer::TimePos(parse_seconds(value)),
        Property::Length => PropertyAnswer::Length(parse_seconds(value)),
        Property::Path => PropertyAnswer::Path(value.to_string()),
        Property::Filename => PropertyAnswer::Filename(value.to_string()),
    }
}

/// Permissive numeric coercion: a malformed number decodes to 0.0 rather
/// than being dropped, keeping every answer applicable.
fn parse_seconds(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_loadfile() {
        assert_eq!(
            SlaveCommand::LoadFile("/media/a.mkv".to_string()).to_line(),
            "loadfile \"/media/a.mkv\"\n"
        );
    }

    #[test]
    fn test_encode_fullscreen_variants() {
        assert_eq!(SlaveCommand::ToggleFullscreen.to_line(), "vo_fullscreen\n");
        assert_eq!(
            SlaveCommand::ForceFullscreen.to_line(),
            "pausing_keep_force vo_fullscreen 1\n"
        );
    }

    #[test]
    fn test_encode_pause_and_quit() {
        assert_eq!(SlaveCommand::TogglePause.to_line(), "pause\n");
        assert_eq!(SlaveCommand::Quit.to_line(), "quit\n");
    }

    #[test]
    fn test_encode_relative_seeks() {
        assert_eq!(
            SlaveCommand::SeekRelative(-60.0).to_line(),
            "pausing_keep seek -60 0\n"
        );
        assert_eq!(
            SlaveCommand::SeekRelative(10.0).to_line(),
            "pausing_keep seek 10 0\n"
        );
    }

    #[test]
    fn test_encode_absolute_seek() {
        assert_eq!(
            SlaveCommand::SeekAbsolute(42.0).to_line(),
            "pausing_keep seek 42 1\n"
        );
        assert_eq!(
            SlaveCommand::SeekAbsolute(12.5).to_line(),
            "pausing_keep seek 12.5 1\n"
        );
    }

    #[test]
    fn test_encode_property_queries() {
        assert_eq!(
            SlaveCommand::GetProperty(Property::Pause).to_line(),
            "pausing_keep_force get_property pause\n"
        );
        assert_eq!(
            SlaveCommand::GetProperty(Property::TimePos).to_line(),
            "pausing_keep_force get_property time_pos\n"
        );
        assert_eq!(
            SlaveCommand::GetProperty(Property::Filename).to_line(),
            "pausing_keep_force get_property filename\n"
        );
    }

    #[test]
    fn test_decode_playback_started() {
        assert_eq!(decode("Starting playback..."), SlaveEvent::PlaybackStarted);
        // CRLF output decodes identically
        assert_eq!(
            decode("Starting playback...\r"),
            SlaveEvent::PlaybackStarted
        );
    }

    #[test]
    fn test_decode_pause_answer() {
        assert_eq!(
            decode("ANS_pause=yes"),
            SlaveEvent::Answer(PropertyAnswer::Pause(true))
        );
        assert_eq!(
            decode("ANS_pause=no"),
            SlaveEvent::Answer(PropertyAnswer::Pause(false))
        );
        // Anything that is not "no" counts as paused
        assert_eq!(
            decode("ANS_pause=1"),
            SlaveEvent::Answer(PropertyAnswer::Pause(true))
        );
    }

    #[test]
    fn test_decode_numeric_answers() {
        assert_eq!(
            decode("ANS_time_pos=42.5"),
            SlaveEvent::Answer(PropertyAnswer::TimePos(42.5))
        );
        assert_eq!(
            decode("ANS_length=3600"),
            SlaveEvent::Answer(PropertyAnswer::Length(3600.0))
        );
    }

    #[test]
    fn test_decode_malformed_number_coerces_to_zero() {
        assert_eq!(
            decode("ANS_time_pos=garbage"),
            SlaveEvent::Answer(PropertyAnswer::TimePos(0.0))
        );
        assert_eq!(
            decode("ANS_length="),
            SlaveEvent::Answer(PropertyAnswer::Length(0.0))
        );
    }

    #[test]
    fn test_decode_string_answers_keep_raw_value() {
        assert_eq!(
            decode("ANS_path=/media/movies"),
            SlaveEvent::Answer(PropertyAnswer::Path("/media/movies".to_string()))
        );
        assert_eq!(
            decode("ANS_filename=a b.mkv"),
            SlaveEvent::Answer(PropertyAnswer::Filename("a b.mkv".to_string()))
        );
    }

    #[test]
    fn test_decode_value_may_contain_equals() {
        // Only the first '=' separates key and value
        assert_eq!(
            decode("ANS_filename=a=b.mkv"),
            SlaveEvent::Answer(PropertyAnswer::Filename("a=b.mkv".to_string()))
        );
    }

    #[test]
    fn test_decode_unknown_key_is_ignored() {
        assert_eq!(
            decode("ANS_volume=95"),
            SlaveEvent::Ignored("ANS_volume=95".to_string())
        );
    }

    #[test]
    fn test_decode_answer_without_equals_is_ignored() {
        assert_eq!(
            decode("ANS_ERROR"),
            SlaveEvent::Ignored("ANS_ERROR".to_string())
        );
    }

    #[test]
    fn test_decode_noise_is_ignored() {
        assert_eq!(
            decode("MPlayer SVN-r38000 (C) 2000-2019 MPlayer Team"),
            SlaveEvent::Ignored("MPlayer SVN-r38000 (C) 2000-2019 MPlayer Team".to_string())
        );
        assert_eq!(decode(""), SlaveEvent::Ignored(String::new()));
    }

    #[test]
    fn test_property_spelling() {
        assert_eq!(Property::Pause.as_str(), "pause");
        assert_eq!(Property::TimePos.as_str(), "time_pos");
        assert_eq!(Property::Length.as_str(), "length");
        assert_eq!(Property::Path.as_str(), "path");
        assert_eq!(Property::Filename.as_str(), "filename");
    }
}
