//! Various helper modules.

pub mod config;
