//! Adopilot core: shared wire types, configuration, and utilities.
//!
//! - [`types`]: chat-completions messages, tool calls, tool descriptors
//! - [`config`]: typed configuration, file + environment loading
//! - [`utils`]: small helpers shared by the other crates

pub mod config;
pub mod types;
pub mod utils;
