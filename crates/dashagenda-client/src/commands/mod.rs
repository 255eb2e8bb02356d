//! Subcommand implementations.

pub mod config;
pub mod get;
pub mod render;
pub mod server;
