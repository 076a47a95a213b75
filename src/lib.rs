//! Static file server library
//!
//! Maps HTTP request paths to files under a configured root directory and
//! serves them with conditional request and byte-range support, directory
//! listings, and per-phase timeouts. The binary in `main.rs` wires these
//! pieces to CLI flags and a listen loop.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
