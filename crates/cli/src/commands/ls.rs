use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use imagegate_core::{ImageRecord, MetadataStore, PipelineConfig, ValidationStatus};

pub fn run(config: &PipelineConfig, status: Option<ValidationStatus>) -> Result<()> {
    let store = MetadataStore::open_existing(&config.store_path)?;
    let records = store.list_records(status)?;

    if records.is_empty() {
        println!("No records found. Run `imagegate run` first.");
        return Ok(());
    }

    println!("{}", build_table(&records));
    println!("  {} records", records.len());
    Ok(())
}

pub(crate) fn build_table(records: &[ImageRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("File"),
        Cell::new("Status"),
        Cell::new("Size"),
        Cell::new("Fmt"),
        Cell::new("Processed"),
        Cell::new("Notes"),
    ]);

    for record in records {
        let status_color = match record.status {
            ValidationStatus::Passed => Color::Green,
            ValidationStatus::Failed => Color::Red,
        };
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(&record.filename),
            Cell::new(record.status).fg(status_color),
            Cell::new(format_dimensions(record)),
            Cell::new(record.format.as_deref().unwrap_or("-")),
            Cell::new(record.processed_timestamp.as_deref().unwrap_or("-")),
            Cell::new(record.notes.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// `200x150, 48.25 KB` for passed records, `-` otherwise.
pub(crate) fn format_dimensions(record: &ImageRecord) -> String {
    match (record.width, record.height, record.size_kb) {
        (Some(w), Some(h), Some(kb)) => format!("{w}x{h}, {kb:.2} KB"),
        _ => "-".to_string(),
    }
}
