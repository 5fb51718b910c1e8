//! Supervisor for the MPlayer subprocess.
//!
//! The supervisor is the only component that spawns, writes to and reaps the
//! player process, and the only writer of the canonical [`PlayerStatus`].
//! Everything it learns comes in through one reader thread per spawned
//! process, which decodes each stdout line and applies it to the status.
//! Registered [`StatusListener`]s receive an owned snapshot on every genuine
//! state change.

use crate::config::get_service_config;
use crate::constants::{DEFAULT_PLAYER_ARGS, DEFAULT_PLAYER_BINARY};
use crate::data::{PlayerCommand, PlayerStatus};
use crate::player::protocol::{self, PropertyAnswer, SlaveCommand, SlaveEvent};
use log::{debug, error, info, trace, warn};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::thread;

/// Errors the supervisor can hit while driving the subprocess.
///
/// These never escape the supervisor as panics; every caller logs and
/// carries on with the player treated as absent.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The player binary could not be spawned
    #[error("failed to spawn player process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The spawned process came up without the expected stdio pipes
    #[error("player process is missing a stdio pipe")]
    MissingPipe,
}

/// Trait for objects that want to be told about player status changes
pub trait StatusListener: Send + Sync {
    /// Called with a full snapshot whenever the status genuinely changed
    fn on_status_changed(&self, status: PlayerStatus);
}

/// A live subprocess: the child, its stdin pipe and the generation it
/// belongs to. Exactly one exists at a time.
struct PlayerProcess {
    child: Child,
    stdin: ChildStdin,
    generation: u64,
}

/// Supervisor owning the player subprocess and the canonical status.
pub struct PlayerSupervisor {
    /// Player binary to spawn
    binary: String,

    /// Arguments the binary is spawned with (slave/quiet/idle by default)
    args: Vec<String>,

    /// The single subprocess handle, None while no player is running
    process: Mutex<Option<PlayerProcess>>,

    /// Canonical player status; reset to default whenever the process exits
    status: Mutex<PlayerStatus>,

    /// Listeners notified with a snapshot on every status change
    listeners: RwLock<Vec<Weak<dyn StatusListener>>>,

    /// Bumped on every spawn so lines read from a dead process can be told
    /// apart from lines of its successor
    generation: AtomicU64,
}

impl PlayerSupervisor {
    /// Create a supervisor that spawns the given binary with the given
    /// arguments. Nothing is spawned until the first `load` command.
    pub fn new(binary: String, args: Vec<String>) -> Self {
        debug!("creating supervisor for {} {:?}", binary, args);
        Self {
            binary,
            args,
            process: Mutex::new(None),
            status: Mutex::new(PlayerStatus::default()),
            listeners: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a supervisor from the `player` section of the configuration.
    ///
    /// Recognized keys: `binary` (string) and `args` (array of strings);
    /// both fall back to the stock MPlayer slave-mode invocation.
    pub fn from_config(config: &serde_json::Value) -> Self {
        let player_config = get_service_config(config, "player");

        let binary = player_config
            .and_then(|c| c.get("binary"))
            .and_then(|b| b.as_str())
            .unwrap_or(DEFAULT_PLAYER_BINARY)
            .to_string();

        let args = player_config
            .and_then(|c| c.get("args"))
            .and_then(|a| a.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_PLAYER_ARGS.iter().map(|s| s.to_string()).collect());

        Self::new(binary, args)
    }

    /// Spawn the player process if none is running. Idempotent: while a
    /// process is live this never spawns a second one.
    ///
    /// On success a reader thread tagged with the new generation starts
    /// consuming the process's stdout. On failure the status is untouched
    /// and the error is returned for the caller to log.
    pub fn ensure_started(self: &Arc<Self>) -> Result<(), PlayerError> {
        let mut guard = match self.process.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("player handle lock poisoned, refusing to spawn");
                return Err(PlayerError::Spawn(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "player handle lock poisoned",
                )));
            }
        };

        if guard.is_some() {
            trace!("player process already running");
            return Ok(());
        }

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(PlayerError::MissingPipe)?;
        let stdout = child.stdout.take().ok_or(PlayerError::MissingPipe)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *guard = Some(PlayerProcess {
            child,
            stdin,
            generation,
        });
        drop(guard);

        let supervisor = Arc::clone(self);
        thread::spawn(move || supervisor.read_output(stdout, generation));

        info!(
            "started player process: {} (generation {})",
            self.binary, generation
        );
        Ok(())
    }

    /// Whether a subprocess is currently running
    pub fn is_running(&self) -> bool {
        self.process
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Snapshot of the current status
    pub fn status(&self) -> PlayerStatus {
        self.status
            .lock()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    fn is_loaded(&self) -> bool {
        self.status
            .lock()
            .map(|status| status.loaded)
            .unwrap_or(false)
    }

    /// Dispatch one client command.
    ///
    /// `load` is the only command that may spawn the process; all others are
    /// dropped while no process is running. Commands that change position or
    /// pause state are followed by a full refresh so the next broadcast
    /// reflects them; the fullscreen toggle changes neither and is not.
    pub fn handle_command(self: &Arc<Self>, command: PlayerCommand) {
        debug!("handling command: {}", command);
        match command {
            PlayerCommand::Load { path } => {
                if let Err(e) = self.ensure_started() {
                    error!("cannot start player: {}", e);
                    return;
                }
                self.send(SlaveCommand::LoadFile(path));
                self.send(SlaveCommand::ToggleFullscreen);
            }
            PlayerCommand::Pause => {
                self.send(SlaveCommand::TogglePause);
                self.refresh();
            }
            PlayerCommand::Stop => {
                self.send(SlaveCommand::Quit);
                self.refresh();
            }
            PlayerCommand::Fullscreen => {
                self.send(SlaveCommand::ForceFullscreen);
            }
            PlayerCommand::Rewind1m => self.seek_relative(-60.0),
            PlayerCommand::Rewind10s => self.seek_relative(-10.0),
            PlayerCommand::Forward10s => self.seek_relative(10.0),
            PlayerCommand::Forward1m => self.seek_relative(60.0),
            PlayerCommand::Seek { position } => {
                self.send(SlaveCommand::SeekAbsolute(position));
                self.refresh();
            }
        }
    }

    fn seek_relative(&self, seconds: f64) {
        self.send(SlaveCommand::SeekRelative(seconds));
        self.refresh();
    }

    /// Query all tracked properties. A no-op unless a process is running and
    /// media is loaded; querying an idle player would only produce
    /// meaningless answers.
    pub fn refresh(&self) {
        if !self.is_running() || !self.is_loaded() {
            return;
        }
        for property in protocol::Property::ALL {
            self.send(SlaveCommand::GetProperty(property));
        }
    }

    /// One poller tick: re-query only the volatile properties (pause state
    /// and playback position). Skipped entirely while nothing is loaded.
    pub fn poll_tick(&self) {
        if !self.is_running() || !self.is_loaded() {
            return;
        }
        for property in protocol::Property::VOLATILE {
            self.send(SlaveCommand::GetProperty(property));
        }
    }

    /// Write one command line to the subprocess stdin.
    ///
    /// A write failure means the process is dead or dying; it is logged and
    /// swallowed here so a broken pipe can never take the supervisor down.
    /// The exit path will reset state once the reader sees EOF.
    fn send(&self, command: SlaveCommand) -> bool {
        let line = command.to_line();
        match self.process.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(process) => {
                    let result = process
                        .stdin
                        .write_all(line.as_bytes())
                        .and_then(|_| process.stdin.flush());
                    match result {
                        Ok(()) => {
                            trace!("sent: {}", line.trim_end());
                            true
                        }
                        Err(e) => {
                            warn!("write to player stdin failed: {}", e);
                            false
                        }
                    }
                }
                None => {
                    debug!("no player process, dropping: {}", line.trim_end());
                    false
                }
            },
            Err(_) => {
                warn!("player handle lock poisoned, dropping: {}", line.trim_end());
                false
            }
        }
    }

    /// Reader loop for one spawned process. Runs on its own thread until the
    /// process closes stdout, then triggers exit handling.
    fn read_output(self: Arc<Self>, stdout: ChildStdout, generation: u64) {
        debug!("reader thread started (generation {})", generation);
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    trace!("player: {}", line);
                    self.apply(generation, protocol::decode(&line));
                }
                Err(e) => {
                    warn!("error reading player output: {}", e);
                    break;
                }
            }
        }
        debug!("reader thread finished (generation {})", generation);
        self.handle_exit(generation);
    }

    /// Apply one decoded event to the status.
    ///
    /// The generation check and the status update happen under the handle
    /// lock as one step, so lines still buffered from a dead instance can
    /// never resurrect stale state in a freshly spawned one, and a teardown
    /// cannot slip between check and update. Listeners are only notified
    /// when a field actually changed.
    fn apply(self: &Arc<Self>, generation: u64, event: SlaveEvent) {
        let (changed, snapshot, playback_started) = {
            let guard = match self.process.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("player handle lock poisoned, dropping event");
                    return;
                }
            };
            let live = guard
                .as_ref()
                .map(|p| p.generation == generation)
                .unwrap_or(false);
            if !live {
                debug!("discarding event from stale generation {}", generation);
                return;
            }

            match event {
                SlaveEvent::PlaybackStarted => match self.status.lock() {
                    Ok(mut status) => {
                        let changed = !status.loaded;
                        status.loaded = true;
                        (changed, status.clone(), true)
                    }
                    Err(_) => {
                        warn!("status lock poisoned, dropping playback start");
                        return;
                    }
                },
                SlaveEvent::Answer(answer) => match self.status.lock() {
                    Ok(mut status) => {
                        let changed = apply_answer(&mut status, &answer);
                        (changed, status.clone(), false)
                    }
                    Err(_) => {
                        warn!("status lock poisoned, dropping answer");
                        return;
                    }
                },
                SlaveEvent::Ignored(line) => {
                    if !line.is_empty() {
                        debug!("ignoring player output: {}", line);
                    }
                    return;
                }
            }
        };

        if changed {
            if playback_started {
                info!("playback started");
            }
            self.notify_status_changed(&snapshot);
        }
        if playback_started {
            // Loading a new file re-announces playback; pick up the new
            // path, filename and length either way
            self.refresh();
        }
    }

    /// Process exit observed by the reader of `generation`: reap the child,
    /// clear the handle and reset the status to its initial value. A reader
    /// whose process was already torn down or replaced does nothing.
    ///
    /// Handle removal and status reset happen under the handle lock so a
    /// concurrent `load` cannot spawn a successor whose state this cleanup
    /// would then wipe out.
    fn handle_exit(&self, generation: u64) {
        let (process, snapshot) = match self.process.lock() {
            Ok(mut guard) => {
                let is_current = guard
                    .as_ref()
                    .map(|p| p.generation == generation)
                    .unwrap_or(false);
                if !is_current {
                    debug!("exit of stale generation {}, nothing to do", generation);
                    return;
                }
                (guard.take(), self.reset_status())
            }
            Err(_) => {
                warn!("player handle lock poisoned during exit handling");
                return;
            }
        };

        if let Some(mut process) = process {
            match process.child.wait() {
                Ok(exit) => info!("player process exited: {}", exit),
                Err(e) => warn!("failed to reap player process: {}", e),
            }
        }

        if let Some(snapshot) = snapshot {
            self.notify_status_changed(&snapshot);
        }
    }

    /// Reset the status to the zero state, returning the snapshot to
    /// broadcast. Listeners are not called here: callers notify after the
    /// handle lock is released.
    fn reset_status(&self) -> Option<PlayerStatus> {
        match self.status.lock() {
            Ok(mut status) => {
                *status = PlayerStatus::default();
                Some(status.clone())
            }
            Err(_) => {
                warn!("status lock poisoned during reset");
                None
            }
        }
    }

    /// Terminate the subprocess on server shutdown so no orphaned player
    /// window outlives the controller.
    pub fn shutdown(&self) {
        let (mut process, snapshot) = match self.process.lock() {
            Ok(mut guard) => match guard.take() {
                Some(process) => (process, self.reset_status()),
                None => return,
            },
            Err(_) => return,
        };

        // Ask politely first, then make sure
        let _ = process.stdin.write_all(SlaveCommand::Quit.to_line().as_bytes());
        let _ = process.stdin.flush();
        if let Err(e) = process.child.kill() {
            debug!("player process already gone: {}", e);
        }
        let _ = process.child.wait();
        info!("player process terminated");

        if let Some(snapshot) = snapshot {
            self.notify_status_changed(&snapshot);
        }
    }

    /// Register a status listener. Duplicate registrations of the same
    /// object are rejected.
    pub fn register_status_listener(&self, listener: Weak<dyn StatusListener>) -> bool {
        match self.listeners.write() {
            Ok(mut listeners) => {
                for existing in listeners.iter() {
                    if let (Some(new), Some(old)) = (listener.upgrade(), existing.upgrade()) {
                        if Arc::ptr_eq(&new, &old) {
                            debug!("listener already registered, skipping");
                            return false;
                        }
                    }
                }
                listeners.push(listener);
                debug!("listener registered, total listeners: {}", listeners.len());
                true
            }
            Err(_) => {
                warn!("failed to acquire write lock when registering listener");
                false
            }
        }
    }

    /// Hand the snapshot to every live listener, dropping dead ones
    fn notify_status_changed(&self, status: &PlayerStatus) {
        self.prune_dead_listeners();
        match self.listeners.read() {
            Ok(listeners) => {
                trace!("notifying {} listeners of status change", listeners.len());
                for weak in listeners.iter() {
                    if let Some(listener) = weak.upgrade() {
                        listener.on_status_changed(status.clone());
                    }
                }
            }
            Err(_) => warn!("failed to acquire read lock for listeners"),
        }
    }

    fn prune_dead_listeners(&self) {
        if let Ok(mut listeners) = self.listeners.write() {
            let before = listeners.len();
            listeners.retain(|weak| weak.upgrade().is_some());
            let removed = before - listeners.len();
            if removed > 0 {
                debug!("pruned {} dead listeners", removed);
            }
        }
    }
}

impl Drop for PlayerSupervisor {
    fn drop(&mut self) {
        // Best effort: don't leave a player process behind
        if let Ok(mut guard) = self.process.lock() {
            if let Some(mut process) = guard.take() {
                let _ = process.child.kill();
                let _ = process.child.wait();
            }
        }
    }
}

/// Update exactly the field named by the answer. Returns whether the stored
/// value actually changed; unchanged answers do not trigger a broadcast.
fn apply_answer(status: &mut PlayerStatus, answer: &PropertyAnswer) -> bool {
    match answer {
        PropertyAnswer::Pause(paused) => {
            let changed = status.paused != *paused;
            status.paused = *paused;
            changed
        }
        PropertyAnswer::TimePos(position) => {
            let changed = status.position != *position;
            status.position = *position;
            changed
        }
        PropertyAnswer::Length(length) => {
            let changed = status.length != *length;
            status.length = *length;
            changed
        }
        PropertyAnswer::Path(path) => {
            let changed = status.path != *path;
            status.path = path.clone();
            changed
        }
        PropertyAnswer::Filename(filename) => {
            let changed = status.filename != *filename;
            status.filename = filename.clone();
            changed
        }
    }
}
