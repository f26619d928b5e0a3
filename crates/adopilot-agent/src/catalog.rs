//! The tool catalog discovered from the tool server.
//!
//! Discovered once at startup and read-only afterwards. Names are unique:
//! a repeated name keeps its first descriptor.

use std::collections::HashSet;

use tracing::{info, warn};

use adopilot_core::config::CategoryConfig;
use adopilot_core::types::ToolDescriptor;
use adopilot_mcp::ToolServer;

use crate::error::AgentError;

/// Every tool the server advertises, in the order it advertised them.
#[derive(Clone, Debug, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    /// Ask the tool server for its tools.
    ///
    /// Any failure is a [`AgentError::Discovery`]. An empty catalog is
    /// accepted but leaves the model with nothing to call.
    pub async fn discover(server: &dyn ToolServer) -> Result<Self, AgentError> {
        let tools = server.list_tools().await.map_err(AgentError::Discovery)?;
        let catalog = Self::from_descriptors(tools);

        if catalog.is_empty() {
            warn!("tool server advertised no tools");
        } else {
            info!(count = catalog.len(), "discovered tools");
        }
        Ok(catalog)
    }

    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(descriptors.len());
        for tool in descriptors {
            if seen.insert(tool.name.clone()) {
                tools.push(tool);
            } else {
                warn!(tool = %tool.name, "duplicate tool name in catalog, keeping the first");
            }
        }
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Compare the catalog with the category table.
    pub fn coverage(&self, categories: &[CategoryConfig]) -> CoverageReport {
        let mapped: HashSet<&str> = categories
            .iter()
            .flat_map(|c| c.tool_names.iter().map(String::as_str))
            .collect();

        let unmapped = self
            .tools
            .iter()
            .filter(|t| !mapped.contains(t.name.as_str()))
            .map(|t| t.name.clone())
            .collect();

        let missing = categories
            .iter()
            .flat_map(|c| {
                c.tool_names
                    .iter()
                    .filter(|name| !self.contains(name))
                    .map(move |name| (c.id.clone(), name.clone()))
            })
            .collect();

        CoverageReport { unmapped, missing }
    }
}

/// Where the catalog and the category table disagree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverageReport {
    /// Catalog tools no category lists. The model can never be offered these.
    pub unmapped: Vec<String>,
    /// `(category, tool)` pairs naming a tool the server does not have.
    pub missing: Vec<(String, String)>,
}

impl CoverageReport {
    pub fn is_consistent(&self) -> bool {
        self.unmapped.is_empty() && self.missing.is_empty()
    }

    /// Emit one warning per inconsistency.
    pub fn log(&self) {
        for tool in &self.unmapped {
            warn!(tool = %tool, "tool is not in any category and will never be offered");
        }
        for (category, tool) in &self.missing {
            warn!(category = %category, tool = %tool, "category lists a tool the server does not provide");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adopilot_mcp::{CallToolResult, McpError};
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    struct StaticServer(Result<Vec<ToolDescriptor>, ()>);

    #[async_trait]
    impl ToolServer for StaticServer {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            self.0.clone().map_err(|_| McpError::Closed)
        }

        async fn call_tool(&self, _name: &str, _args: Map<String, Value>) -> Result<CallToolResult, McpError> {
            unreachable!("discovery never calls tools")
        }
    }

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{name} description"), adopilot_core::types::empty_object_schema())
    }

    #[tokio::test]
    async fn test_discover_keeps_server_order() {
        let server = StaticServer(Ok(vec![tool("wit_get_work_item"), tool("project_list"), tool("repo_list")]));
        let catalog = ToolCatalog::discover(&server).await.unwrap();
        let names: Vec<&str> = catalog.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["wit_get_work_item", "project_list", "repo_list"]);
    }

    #[tokio::test]
    async fn test_discover_failure_is_discovery_error() {
        let server = StaticServer(Err(()));
        let err = ToolCatalog::discover(&server).await.unwrap_err();
        assert!(matches!(err, AgentError::Discovery(McpError::Closed)));
    }

    #[tokio::test]
    async fn test_discover_empty_catalog() {
        let catalog = ToolCatalog::discover(&StaticServer(Ok(vec![]))).await.unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let mut second = tool("repo_list");
        second.description = "shadowed".into();
        let catalog = ToolCatalog::from_descriptors(vec![tool("repo_list"), tool("wiki_list"), second]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("repo_list").unwrap().description, "repo_list description");
    }

    #[test]
    fn test_coverage_report() {
        let catalog = ToolCatalog::from_descriptors(vec![tool("repo_list"), tool("core_list_builds"), tool("wiki_list")]);
        let categories = vec![
            CategoryConfig::new("repository", "", &["repo"], &["repo_list", "repo_get_by_name"]),
            CategoryConfig::new("wiki", "", &["wiki"], &["wiki_list"]),
        ];

        let report = catalog.coverage(&categories);
        assert!(!report.is_consistent());
        assert_eq!(report.unmapped, vec!["core_list_builds".to_string()]);
        assert_eq!(report.missing, vec![("repository".to_string(), "repo_get_by_name".to_string())]);
    }

    #[test]
    fn test_coverage_consistent() {
        let catalog = ToolCatalog::from_descriptors(vec![tool("wiki_list")]);
        let categories = vec![CategoryConfig::new("wiki", "", &["wiki"], &["wiki_list"])];
        assert!(catalog.coverage(&categories).is_consistent());
    }
}
