//! `adopilot tools`: the discovered catalog grouped by category.

use colored::Colorize;

use adopilot_agent::ToolCatalog;
use adopilot_core::config::AgentConfig;

/// Print every category with its tools, then the coverage report.
pub fn print_report(catalog: &ToolCatalog, config: &AgentConfig) {
    println!();
    println!("{} {}", "Tools discovered:".bold(), catalog.len());

    for category in &config.categories {
        let default_marker = if config.default_categories.contains(&category.id) {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!();
        println!("  {}{}", category.id.cyan().bold(), default_marker);
        if !category.description.is_empty() {
            println!("    {}", category.description.dimmed());
        }
        println!("    {} {}", "keywords:".dimmed(), category.keywords.join(", "));
        for name in &category.tool_names {
            match catalog.get(name) {
                Some(tool) => println!("    {} {:<36} {}", "✓".green(), name, first_line(&tool.description).dimmed()),
                None => println!("    {} {:<36} {}", "✗".red(), name, "(not provided by server)".red()),
            }
        }
    }

    let report = catalog.coverage(&config.categories);
    println!();
    if report.is_consistent() {
        println!("{}", "Category table matches the catalog.".green());
        return;
    }

    if !report.unmapped.is_empty() {
        println!(
            "{} {}",
            "Never offered (no category lists them):".yellow().bold(),
            report.unmapped.len()
        );
        for name in &report.unmapped {
            let description = catalog.get(name).map(|t| first_line(&t.description)).unwrap_or_default();
            println!("    {} {:<36} {}", "·".yellow(), name, description.dimmed());
        }
    }
    if !report.missing.is_empty() {
        println!(
            "{} {}",
            "Listed but missing from the server:".yellow().bold(),
            report.missing.len()
        );
    }
}

fn first_line(text: &str) -> String {
    adopilot_core::utils::truncate_string(&adopilot_core::utils::single_line(text), 80)
}
