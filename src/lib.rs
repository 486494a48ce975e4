//! Fantasy football weekly recap generator.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod document;
pub mod llm;
pub mod logging;
pub mod notify;
pub mod recap;
pub mod server;
pub mod types;
pub mod yahoo;
