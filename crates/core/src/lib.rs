pub mod config;
pub mod domain;
pub mod error;
pub mod inspector;
pub mod pipeline;
pub mod report;
pub mod store;

pub use config::{PipelineConfig, ValidationPolicy};
pub use domain::{Classification, ImageRecord, RunSummary, StoreSummary, ValidationStatus};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunProgress};
pub use store::MetadataStore;
