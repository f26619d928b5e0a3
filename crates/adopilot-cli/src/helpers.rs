//! Console output for prompts, tool calls, and answers.

use colored::Colorize;
use serde_json::Value;

use adopilot_agent::{reduction_pct, RunOutcome};
use adopilot_core::config::CategoryConfig;
use adopilot_core::types::{Message, ToolCall};

const RULE_WIDTH: usize = 70;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Print the banner shown after connecting to the tool server.
pub fn print_connected(server: &str, tool_count: usize, categories: &[CategoryConfig]) {
    println!();
    println!(
        "{}  v{}",
        "Adopilot".cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!("Connected to {}. Total tools available: {}", server.bold(), tool_count);
    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    println!("Tool categories: {}", ids.join(", "));
    for category in categories {
        println!("  {:<14} {}", category.id.cyan(), category.description.dimmed());
    }
    println!();
}

/// Print the prompt being run.
pub fn print_prompt(index: usize, total: usize, prompt: &str) {
    println!();
    println!("{} {}", format!("[{index}/{total}] Prompt:").cyan().bold(), prompt);
}

/// Print what the model was offered and which tools it called.
pub fn print_trace(outcome: &RunOutcome, catalog_len: usize) {
    if outcome.categories.is_empty() {
        println!("   Tools offered: {} (full catalog)", outcome.tools_offered.len());
    } else {
        let categories: Vec<&str> = outcome.categories.iter().map(String::as_str).collect();
        println!(
            "   Categories: {} | tools offered: {}/{}",
            categories.join(", "),
            outcome.tools_offered.len(),
            catalog_len
        );
        println!(
            "   Token reduction: ~{:.1}% (from tool definitions)",
            reduction_pct(outcome.tools_offered.len(), catalog_len)
        );
    }

    let calls = requested_calls(&outcome.transcript);
    if calls.is_empty() {
        return;
    }
    println!();
    println!("{} {}", "Tool calls made:".bold(), calls.len());
    for call in calls {
        println!("  {} {}", "→ Calling:".yellow(), call.function.name);
        println!("    Arguments: {}", pretty_arguments(&call.function.arguments));
    }
}

/// Print the final answer between rules.
pub fn print_answer(answer: &str) {
    println!();
    println!("{}", rule());
    println!("{}", "Response:".green().bold());
    println!("{}", rule());
    if answer.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{answer}");
    }
    println!("{}", rule());
}

/// Print a failed prompt.
pub fn print_failure(kind: &str, error: &dyn std::error::Error) {
    println!();
    println!("{} {} ({})", "✗".red().bold(), error, kind.dimmed());
    let mut source = error.source();
    while let Some(cause) = source {
        println!("    {} {}", "caused by:".dimmed(), cause);
        source = cause.source();
    }
}

/// Tool calls of the first assistant message that made any.
fn requested_calls(transcript: &[Message]) -> Vec<&ToolCall> {
    transcript
        .iter()
        .find_map(|m| match m {
            Message::Assistant {
                tool_calls: Some(calls),
                ..
            } => Some(calls.iter().collect()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Indent JSON arguments for display; anything unparsable is shown as-is.
fn pretty_arguments(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .map(|s| s.replace('\n', "\n    "))
        .unwrap_or_else(|| raw.to_string())
}
