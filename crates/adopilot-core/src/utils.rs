//! Utility helpers: data directory resolution and string shortening.

use std::path::PathBuf;

/// Get the Adopilot data directory (e.g. `~/.adopilot/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".adopilot")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Collapse all whitespace runs (including newlines) into single spaces.
///
/// Tool descriptions from remote servers are often multi-line; this keeps
/// one-line listings readable.
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
