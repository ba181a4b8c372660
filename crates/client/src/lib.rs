//! Scripted client for the network device log server
//!
//! Drives a fixed sequence of requests (clear, add, read, patch, replace,
//! read) and prints each status and body for the operator.

mod runner;
pub mod scenario;

pub use runner::{ClientError, Reply, RunSummary, Runner, RunnerConfig, DEFAULT_SERVER_URL};
pub use scenario::{default_scenario, Payload, Scenario, Step};
