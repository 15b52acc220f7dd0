//! `sm-gateway` — the SolMind completion service: orchestrator, memory
//! persistence queue, HTTP API and CLI.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
pub mod telemetry;
