//! HTTP and WebSocket front end for the Mao game library.
//!
//! The binary in `main.rs` wires these modules together; they're exposed as
//! a library so integration tests can build the router directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
