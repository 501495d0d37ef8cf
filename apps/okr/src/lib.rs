//! # okr
//!
//! HTTP API, CLI and configuration for the OKR server.
//!
//! The binary in `main.rs` is a thin wrapper over [`cli::execute`]; the
//! modules are exposed here so integration tests can drive the router
//! directly.

pub mod api;
pub mod cli;
pub mod config;
