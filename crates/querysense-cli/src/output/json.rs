//! JSON output formatting.

use anyhow::{Context, Result};

use super::CompletionReport;

/// Format the completion result as JSON.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json(report: &CompletionReport, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(report)
    } else {
        serde_json::to_string_pretty(report)
    };
    json.context("Failed to serialize completion result")
}
