//! Sending and serving DNS messages.

pub mod client;
pub mod server;
