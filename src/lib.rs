//! Yuzu - comic/manga chapter metadata aggregator
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod metadata;
pub mod server;
pub mod watch;
