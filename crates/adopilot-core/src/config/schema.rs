//! Configuration schema.
//!
//! Hierarchy: `Config` → `LlmConfig`, `McpConfig`, `AgentConfig`, `PromptsConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Azure OpenAI API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2025-04-01-preview";

/// Character budget for a single tool result fed back to the model.
pub const DEFAULT_MAX_RESULT_CHARS: usize = 10_000;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.adopilot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub llm: LlmConfig,
    pub mcp: McpConfig,
    pub agent: AgentConfig,
    pub prompts: PromptsConfig,
}

/// A required setting that was not provided.
#[derive(Debug, Error, PartialEq)]
#[error("missing required configuration: {}", missing.join(", "))]
pub struct ConfigError {
    /// Human-readable names of the missing settings (env var names).
    pub missing: Vec<String>,
}

impl Config {
    /// Check that every value needed to talk to the model and the tool
    /// server is present. Reports all missing values at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = self.missing_llm_settings();
        missing.extend(self.missing_tool_server_settings());
        ConfigError::check(missing)
    }

    /// Check only what starting the tool server needs. Commands that never
    /// call the model (`adopilot tools`) validate with this.
    pub fn validate_tool_server(&self) -> Result<(), ConfigError> {
        ConfigError::check(self.missing_tool_server_settings())
    }

    fn missing_llm_settings(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.llm.endpoint.trim().is_empty() {
            missing.push("AZURE_OPENAI_ENDPOINT".to_string());
        }
        if self.llm.model.trim().is_empty() {
            missing.push("AZURE_OPENAI_MODEL".to_string());
        }
        if self.llm.api_key.trim().is_empty() {
            missing.push("AZURE_OPENAI_API_KEY".to_string());
        }
        missing
    }

    fn missing_tool_server_settings(&self) -> Vec<String> {
        // A custom command may not need an organization.
        if self.mcp.command.is_none() && self.mcp.organization.trim().is_empty() {
            vec!["AZURE_DEVOPS_ORG".to_string()]
        } else {
            Vec::new()
        }
    }
}

impl ConfigError {
    fn check(missing: Vec<String>) -> Result<(), ConfigError> {
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { missing })
        }
    }
}

// ─────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────

/// Which URL layout and auth header the completion endpoint expects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// `{endpoint}/openai/deployments/{model}/chat/completions?api-version=…`, `api-key` header.
    #[default]
    Azure,
    /// `{endpoint}/chat/completions`, bearer token.
    OpenAi,
}

impl std::str::FromStr for ApiFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "azure" => Ok(ApiFlavor::Azure),
            "openai" => Ok(ApiFlavor::OpenAi),
            other => Err(format!("unknown API flavor '{other}' (expected azure or openai)")),
        }
    }
}

/// Chat-completion endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    pub flavor: ApiFlavor,
    /// Resource endpoint (Azure) or API base URL (OpenAI-compatible).
    pub endpoint: String,
    /// Deployment name (Azure) or model identifier.
    pub model: String,
    pub api_key: String,
    pub api_version: String,
    /// Maximum tokens to generate; omitted from requests when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature; omitted from requests when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            flavor: ApiFlavor::Azure,
            endpoint: String::new(),
            model: String::new(),
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_tokens: None,
            temperature: None,
            timeout_secs: 120,
        }
    }
}

// ─────────────────────────────────────────────
// MCP tool server
// ─────────────────────────────────────────────

/// How to launch the tool server.
///
/// With no explicit `command`, the Azure DevOps MCP server is started via
/// `npx`, authenticating with the PAT when one is set and the Azure CLI
/// login otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McpConfig {
    /// Azure DevOps organization name.
    pub organization: String,
    /// Personal access token, forwarded as `ADO_MCP_AUTH_TOKEN`.
    pub pat: String,
    /// Override the server executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Override the server arguments (only used with `command`).
    pub args: Vec<String>,
    /// Extra environment for the server process.
    pub env: HashMap<String, String>,
    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            pat: String::new(),
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            request_timeout_secs: 120,
        }
    }
}

/// A fully resolved process invocation for the tool server.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl McpConfig {
    /// `envvar` when a PAT is configured, otherwise `azcli`.
    pub fn auth_mode(&self) -> &'static str {
        if self.pat.is_empty() {
            "azcli"
        } else {
            "envvar"
        }
    }

    /// Resolve the program, arguments, and environment to spawn.
    pub fn server_command(&self) -> ServerCommand {
        let mut env = self.env.clone();
        if !self.pat.is_empty() {
            env.insert("ADO_MCP_AUTH_TOKEN".to_string(), self.pat.clone());
        }

        match &self.command {
            Some(program) => ServerCommand {
                program: program.clone(),
                args: self.args.clone(),
                env,
            },
            None => ServerCommand {
                program: "npx".to_string(),
                args: vec![
                    "-y".to_string(),
                    "@azure-devops/mcp@latest".to_string(),
                    self.organization.clone(),
                    "--authentication".to_string(),
                    self.auth_mode().to_string(),
                ],
                env,
            },
        }
    }
}

// ─────────────────────────────────────────────
// Agent (tool narrowing)
// ─────────────────────────────────────────────

/// A named group of tools with the keywords that select it.
///
/// Keywords are matched as lower-case substrings of the prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub keywords: Vec<String>,
    pub tool_names: Vec<String>,
}

impl CategoryConfig {
    pub fn new(id: &str, description: &str, keywords: &[&str], tool_names: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            tool_names: tool_names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Tool-narrowing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Tool results longer than this many characters are cut.
    pub max_result_chars: usize,
    /// Categories used when no keyword matches.
    pub default_categories: Vec<String>,
    /// The category table, in declaration order.
    pub categories: Vec<CategoryConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_result_chars: DEFAULT_MAX_RESULT_CHARS,
            default_categories: vec!["project".to_string(), "work_item".to_string()],
            categories: default_categories(),
        }
    }
}

/// The built-in category table for the Azure DevOps MCP server.
///
/// A tool the server advertises but no category lists here is never shown
/// to the model; keep this table in sync with the server's catalog.
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "work_item",
            "Create, read, update work items, add links and comments",
            &["work item", "task", "bug", "user story", "backlog", "assign", "comment", "triage"],
            &[
                "wit_get_work_item",
                "wit_create_work_item",
                "wit_update_work_items_batch",
                "wit_my_work_items",
                "wit_add_artifact_link",
                "wit_work_items_link",
            ],
        ),
        CategoryConfig::new(
            "project",
            "List projects, teams, manage iterations and capacity",
            &["project", "team", "iteration", "capacity", "sprint"],
            &[
                "project_list",
                "team_list",
                "work_get_team_capacity",
                "work_get_iteration_capacities",
                "work_list_team_iterations",
                "work_update_team_capacity",
            ],
        ),
        CategoryConfig::new(
            "repository",
            "Access repositories, create branches",
            &["repo", "repository", "branch", "code"],
            &[
                "repo_list",
                "repo_get_by_name",
                "repo_create_branch",
                "repo_create_pull_request_thread",
            ],
        ),
        CategoryConfig::new(
            "pull_request",
            "List and manage pull requests, add comments",
            &["pull request", "pr", "review", "merge"],
            &["repo_list_pull_requests", "repo_get_pull_request"],
        ),
        CategoryConfig::new(
            "pipeline",
            "List and run pipelines",
            &["pipeline", "build", "deploy", "run"],
            &["pipelines_list", "pipelines_run_pipeline"],
        ),
        CategoryConfig::new(
            "wiki",
            "Access and update wiki pages",
            &["wiki", "documentation", "page"],
            &["wiki_list", "wiki_list_pages", "wiki_create_or_update_page"],
        ),
        CategoryConfig::new(
            "search",
            "Search code and wiki content",
            &["search", "find"],
            &["search_code", "search_wiki"],
        ),
    ]
}

// ─────────────────────────────────────────────
// Example prompts
// ─────────────────────────────────────────────

/// Values substituted into the example prompt batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptsConfig {
    pub project: String,
    pub team: String,
    pub work_item_id: u64,
    pub repository: String,
    /// Prompt run after the examples; defaults to listing repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            project: "your-project-name".to_string(),
            team: "your-team-name".to_string(),
            work_item_id: 12345,
            repository: "your-repo-name".to_string(),
            custom_prompt: None,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
