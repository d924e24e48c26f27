//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use url::Url;

/// Maximum characters shown per table cell
pub const MAX_CELL_LENGTH: usize = 200;

/// Extract the registrable-looking host from a URL, without a leading `www.`
///
/// Returns an empty string when the URL cannot be parsed or has no host.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

/// Truncate text to a maximum number of characters, appending `...` when cut
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len).collect();
        format!("{truncated}...")
    }
}

/// Render rows as a Markdown table.
///
/// Cells longer than [`MAX_CELL_LENGTH`] are truncated and `|` is escaped.
/// Returns an empty string when there are no rows.
pub fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!(
        "| {} |",
        headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
    ));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| truncate_text(cell, MAX_CELL_LENGTH).replace('|', "\\|"))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}
