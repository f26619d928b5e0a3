//! Configuration: schema, file loading, and environment overrides.
//!
//! # Usage
//! ```no_run
//! use adopilot_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Model: {}", cfg.llm.model);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{apply_env_overrides, get_config_path, load_config};
pub use schema::{
    default_categories, AgentConfig, ApiFlavor, CategoryConfig, Config, ConfigError, LlmConfig,
    McpConfig, PromptsConfig, ServerCommand, DEFAULT_API_VERSION, DEFAULT_MAX_RESULT_CHARS,
};
