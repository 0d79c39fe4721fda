//! Table formatting helpers for CLI output.

use comfy_table::{ContentArrangement, Table};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Shorten a digest for display: keep the algorithm prefix plus the
/// first 12 hex characters.
pub fn short_digest(digest: &str) -> String {
    match digest.split_once(':') {
        Some((algorithm, hex)) => {
            let truncated = if hex.len() > 12 { &hex[..12] } else { hex };
            format!("{algorithm}:{truncated}")
        }
        None => {
            let truncated = if digest.len() > 12 {
                &digest[..12]
            } else {
                digest
            };
            truncated.to_string()
        }
    }
}

/// Format a chrono timestamp as a relative "ago" string.
pub fn format_ago(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(*dt);

    let secs = duration.num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }

    if secs < 60 {
        return format!("{secs} seconds ago");
    }

    let mins = duration.num_minutes();
    if mins < 60 {
        return format!("{mins} minutes ago");
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{hours} hours ago");
    }

    let days = duration.num_days();
    if days < 30 {
        return format!("{days} days ago");
    }

    let months = days / 30;
    if months < 12 {
        return format!("{months} months ago");
    }

    let years = days / 365;
    format!("{years} years ago")
}
