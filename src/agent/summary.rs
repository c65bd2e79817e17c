//! Summary builder

use crate::core::CollectedDatum;
use crate::distill::preview;

pub const NO_DATA_SUMMARY: &str = "No data was collected during the browsing session.";

const PREVIEW_CHARS: usize = 200;

/// Plain-text digest of the collected data, one entry per source in order
pub fn build_summary(prompt: &str, collected: &[CollectedDatum]) -> String {
    if collected.is_empty() {
        return NO_DATA_SUMMARY.to_string();
    }

    let mut lines = vec![
        format!("Summary for: {}", prompt),
        format!("Collected data from {} source(s)", collected.len()),
        String::new(),
    ];

    for (i, datum) in collected.iter().enumerate() {
        let title = if datum.title.trim().is_empty() {
            format!("Source {}", i + 1)
        } else {
            datum.title.clone()
        };
        lines.push(format!("{}. {}", i + 1, title));
        lines.push(format!("   URL: {}", datum.source_url));
        lines.push(format!("   {}", preview(datum.content.trim(), PREVIEW_CHARS)));
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}
