use anyhow::Result;
use imagegate_core::{report, MetadataStore, PipelineConfig};

pub fn run(config: &PipelineConfig) -> Result<()> {
    let store = MetadataStore::open_existing(&config.store_path)?;
    let summary = report::summarize(&store)?;
    print!("{}", report::render(&summary));
    Ok(())
}
