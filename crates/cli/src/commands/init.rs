use anyhow::Result;
use imagegate_core::{MetadataStore, PipelineConfig};

pub fn run(config: &PipelineConfig) -> Result<()> {
    MetadataStore::open(&config.store_path)?;
    println!(
        "Database {} created successfully!",
        config.store_path.display()
    );
    Ok(())
}
