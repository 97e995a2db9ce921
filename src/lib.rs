// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod heartbeat;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod store;
pub mod ws;
