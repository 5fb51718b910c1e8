// Shared constants for PlayerControl

/// URL prefix all API routes are mounted under
pub const API_PREFIX: &str = "/api";

/// Default address the webserver binds to
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default port the webserver listens on
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default directory the browser UI is served from
pub const DEFAULT_WEBROOT: &str = "web";

/// Player binary spawned when the configuration does not name one
pub const DEFAULT_PLAYER_BINARY: &str = "mplayer";

/// Stock arguments for slave-mode operation: take commands on stdin, keep
/// quiet on stdout, stay alive with no file loaded
pub const DEFAULT_PLAYER_ARGS: [&str; 3] = ["-slave", "-quiet", "-idle"];

/// Cadence of the volatile-property poller in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
