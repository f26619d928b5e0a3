//! Narrow the catalog to the tools of the selected categories.
//!
//! Only tools listed by some category can ever be selected. A tool the
//! server adds later stays invisible to the model until the category table
//! names it; [`ToolCatalog::coverage`](crate::catalog::ToolCatalog::coverage)
//! reports such tools at startup.

use std::collections::{BTreeSet, HashSet};

use tracing::{info, warn};

use adopilot_core::config::CategoryConfig;
use adopilot_core::types::{ToolDefinition, ToolDescriptor};

/// Builds the tool subset offered to the model for one prompt.
#[derive(Clone, Copy, Debug)]
pub struct ToolSetBuilder<'a> {
    categories: &'a [CategoryConfig],
}

impl<'a> ToolSetBuilder<'a> {
    pub fn new(categories: &'a [CategoryConfig]) -> Self {
        Self { categories }
    }

    /// Catalog entries named by any selected category, in catalog order.
    ///
    /// Unknown category ids are logged and ignored.
    pub fn build(&self, catalog: &[ToolDescriptor], selected: &BTreeSet<String>) -> Vec<ToolDescriptor> {
        self.select(catalog, selected).0
    }

    /// Like [`build`](Self::build), also returning the record that was logged.
    pub fn select(
        &self,
        catalog: &[ToolDescriptor],
        selected: &BTreeSet<String>,
    ) -> (Vec<ToolDescriptor>, SelectionRecord) {
        for id in selected {
            if !self.categories.iter().any(|c| &c.id == id) {
                warn!(category = %id, "unknown category selected");
            }
        }

        let wanted: HashSet<&str> = self
            .categories
            .iter()
            .filter(|c| selected.contains(&c.id))
            .flat_map(|c| c.tool_names.iter().map(String::as_str))
            .collect();

        let tools: Vec<ToolDescriptor> = catalog
            .iter()
            .filter(|t| wanted.contains(t.name.as_str()))
            .cloned()
            .collect();

        let record = SelectionRecord {
            selected: tools.len(),
            total: catalog.len(),
            categories: selected.iter().cloned().collect(),
            reduction_pct: reduction_pct(tools.len(), catalog.len()),
        };
        record.log();

        (tools, record)
    }
}

/// What one filtering step kept, as logged at `info`.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionRecord {
    /// Tools offered to the model.
    pub selected: usize,
    /// Tools in the catalog.
    pub total: usize,
    /// Selected category ids, sorted.
    pub categories: Vec<String>,
    pub reduction_pct: f64,
}

impl SelectionRecord {
    fn log(&self) {
        info!(
            selected = self.selected,
            total = self.total,
            categories = ?self.categories,
            reduction_pct = %format!("{:.1}", self.reduction_pct),
            "filtered tool set"
        );
    }
}

/// Serialize descriptors into the function declarations the completion API
/// expects, one per descriptor.
pub fn to_definitions(tools: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    tools.iter().map(ToolDescriptor::to_definition).collect()
}

/// Share of the catalog left out, in percent. Zero for an empty catalog.
pub fn reduction_pct(selected: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (total.saturating_sub(selected)) as f64 / total as f64 * 100.0
}
