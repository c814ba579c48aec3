use anyhow::Result;
use imagegate_core::{Pipeline, PipelineConfig, RunProgress, ValidationStatus};
use indicatif::{ProgressBar, ProgressStyle};

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

pub fn run(config: PipelineConfig) -> Result<()> {
    println!("Starting the Pipeline...");

    let mut pipeline = Pipeline::open(config)?;
    let pb = ProgressBar::new(0);
    pb.set_style(bar_style());

    pipeline.run(Some(&mut |progress| match progress {
        RunProgress::Start { total } => {
            pb.println(format!("Found {total} files to process."));
            pb.set_length(total as u64);
            pb.set_position(0);
            pb.set_message("Processing images...");
        }
        RunProgress::FileProcessed { path, status, .. } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let marker = match status {
                ValidationStatus::Passed => "ok",
                ValidationStatus::Failed => "rejected",
            };
            pb.set_message(format!("{name} ({marker})"));
            pb.inc(1);
        }
        RunProgress::Skipped { .. } => {
            pb.inc(1);
        }
        RunProgress::Complete { summary } => {
            pb.finish_with_message(format!(
                "{} passed, {} failed, {} skipped",
                summary.passed, summary.failed, summary.skipped
            ));
        }
    }))?;

    println!("Pipeline closed successfully");
    Ok(())
}
