//! Oroswap farming bot.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod chain;
pub mod config;
pub mod console;
pub mod engine;
pub mod input;
pub mod router;
pub mod session;
pub mod types;
