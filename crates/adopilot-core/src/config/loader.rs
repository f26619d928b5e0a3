//! Config loader: reads `~/.adopilot/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.adopilot/config.json`
//! 3. Well-known variables (`AZURE_OPENAI_*`, `AZURE_DEVOPS_*`)
//! 4. Environment variables `ADOPILOT_<SECTION>__<FIELD>` (override everything)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    let config = load_config_from_path(&config_path);
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// `lookup` returns the value of a variable, if set.
///
/// Supported overrides:
/// - `AZURE_OPENAI_ENDPOINT` / `ADOPILOT_LLM__ENDPOINT` → `llm.endpoint`
/// - `AZURE_OPENAI_MODEL` / `ADOPILOT_LLM__MODEL` → `llm.model`
/// - `AZURE_OPENAI_API_KEY` / `ADOPILOT_LLM__API_KEY` → `llm.api_key`
/// - `AZURE_OPENAI_API_VERSION` / `ADOPILOT_LLM__API_VERSION` → `llm.api_version`
/// - `ADOPILOT_LLM__FLAVOR` → `llm.flavor`
/// - `ADOPILOT_LLM__MAX_TOKENS`, `ADOPILOT_LLM__TEMPERATURE`, `ADOPILOT_LLM__TIMEOUT_SECS`
/// - `AZURE_DEVOPS_ORG` / `ADOPILOT_MCP__ORGANIZATION` → `mcp.organization`
/// - `AZURE_DEVOPS_PAT` / `ADOPILOT_MCP__PAT` → `mcp.pat`
/// - `ADOPILOT_MCP__COMMAND`, `ADOPILOT_MCP__REQUEST_TIMEOUT_SECS`
/// - `ADOPILOT_AGENT__MAX_RESULT_CHARS` → `agent.max_result_chars`
/// - `ADOPILOT_PROMPTS__PROJECT`, `__TEAM`, `__WORK_ITEM_ID`, `__REPOSITORY`, `__CUSTOM_PROMPT`
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let first = |keys: &[&str]| keys.iter().rev().find_map(|k| lookup(*k));

    // LLM
    if let Some(val) = first(&["AZURE_OPENAI_ENDPOINT", "ADOPILOT_LLM__ENDPOINT"]) {
        config.llm.endpoint = val;
    }
    if let Some(val) = first(&["AZURE_OPENAI_MODEL", "ADOPILOT_LLM__MODEL"]) {
        config.llm.model = val;
    }
    if let Some(val) = first(&["AZURE_OPENAI_API_KEY", "ADOPILOT_LLM__API_KEY"]) {
        config.llm.api_key = val;
    }
    if let Some(val) = first(&["AZURE_OPENAI_API_VERSION", "ADOPILOT_LLM__API_VERSION"]) {
        config.llm.api_version = val;
    }
    if let Some(val) = lookup("ADOPILOT_LLM__FLAVOR") {
        match val.parse() {
            Ok(flavor) => config.llm.flavor = flavor,
            Err(e) => warn!("Ignoring ADOPILOT_LLM__FLAVOR: {}", e),
        }
    }
    if let Some(val) = lookup("ADOPILOT_LLM__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.llm.max_tokens = Some(n);
        }
    }
    if let Some(val) = lookup("ADOPILOT_LLM__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.llm.temperature = Some(t);
        }
    }
    if let Some(val) = lookup("ADOPILOT_LLM__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.llm.timeout_secs = n;
        }
    }

    // Tool server
    if let Some(val) = first(&["AZURE_DEVOPS_ORG", "ADOPILOT_MCP__ORGANIZATION"]) {
        config.mcp.organization = val;
    }
    if let Some(val) = first(&["AZURE_DEVOPS_PAT", "ADOPILOT_MCP__PAT"]) {
        config.mcp.pat = val;
    }
    if let Some(val) = lookup("ADOPILOT_MCP__COMMAND") {
        config.mcp.command = Some(val);
    }
    if let Some(val) = lookup("ADOPILOT_MCP__REQUEST_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.mcp.request_timeout_secs = n;
        }
    }

    // Agent
    if let Some(val) = lookup("ADOPILOT_AGENT__MAX_RESULT_CHARS") {
        if let Ok(n) = val.parse::<usize>() {
            config.agent.max_result_chars = n;
        }
    }

    // Prompts
    if let Some(val) = lookup("ADOPILOT_PROMPTS__PROJECT") {
        config.prompts.project = val;
    }
    if let Some(val) = lookup("ADOPILOT_PROMPTS__TEAM") {
        config.prompts.team = val;
    }
    if let Some(val) = lookup("ADOPILOT_PROMPTS__WORK_ITEM_ID") {
        if let Ok(n) = val.parse::<u64>() {
            config.prompts.work_item_id = n;
        }
    }
    if let Some(val) = lookup("ADOPILOT_PROMPTS__REPOSITORY") {
        config.prompts.repository = val;
    }
    if let Some(val) = lookup("ADOPILOT_PROMPTS__CUSTOM_PROMPT") {
        config.prompts.custom_prompt = Some(val);
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
