// HTTP and WebSocket API for PlayerControl

// Export the browse module
pub mod browse;

// Export the commands module
pub mod commands;

// Export the events module
pub mod events;

// Export the server module
pub mod server;
