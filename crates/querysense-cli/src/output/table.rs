//! Human-readable table output formatting.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::CompletionReport;

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Boost")]
    boost: i32,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Format the completion result as a table with an optional colored header.
pub fn format_table(report: &CompletionReport, source: &str, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();
    let mut out = String::new();

    let title = format!("QuerySense completions for {source}");
    let context = format!("Context: {}", report.context_summary());
    if colored {
        let _ = writeln!(out, "{}", title.bold());
        let _ = writeln!(out, "{}", context.cyan());
    } else {
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{context}");
    }
    let _ = writeln!(out, "Replace from offset {}", report.insert_from());
    let _ = writeln!(out);

    let candidates = report.candidates();
    if candidates.is_empty() {
        let _ = writeln!(out, "No candidates.");
        return out;
    }

    let rows = candidates.iter().map(|item| CandidateRow {
        label: item.label.clone(),
        kind: format!("{:?}", item.kind),
        boost: item.boost,
        detail: item.detail.clone().unwrap_or_default(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    let _ = writeln!(out, "{table}");
    let _ = writeln!(out, "{} candidate(s)", candidates.len());
    out
}
