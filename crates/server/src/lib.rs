//! Network device log server
//!
//! Serves a single resource, `/`, backed by a flat text log file:
//! GET reads it, POST appends one record, PATCH appends several, PUT
//! replaces everything and DELETE clears it.

pub mod config;
mod http_server;

pub use config::ServerConfig;
pub use http_server::{router, run_http_server, serve, ALLOWED_METHODS, EMPTY_LOG_PLACEHOLDER};
