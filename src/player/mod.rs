// Player subprocess supervision and the slave-mode control protocol

pub mod poller;
pub mod protocol;
pub mod supervisor;

pub use poller::StatusPoller;
pub use supervisor::{PlayerError, PlayerSupervisor, StatusListener};
