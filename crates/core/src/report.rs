use std::fmt::Write;

use crate::domain::StoreSummary;
use crate::error::Result;
use crate::store::MetadataStore;

pub fn summarize(store: &MetadataStore) -> Result<StoreSummary> {
    store.summary()
}

/// Plain-text report: total row count followed by one line per status.
pub fn render(summary: &StoreSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total records in database: {}", summary.total);
    let _ = writeln!(out);
    let _ = writeln!(out, "Validation Summary:");
    for entry in &summary.by_status {
        let _ = writeln!(out, "- {}: {} files", entry.status, entry.count);
    }
    out
}
