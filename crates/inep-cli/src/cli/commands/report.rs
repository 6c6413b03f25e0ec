//! End-of-run summary on stdout.

use inep_core::pipeline::{ItemOutcome, RunSummary};

pub fn print_summary(summary: &RunSummary) {
    if summary.items.is_empty() {
        println!(
            "No download link found for {} {}.",
            summary.dataset, summary.year
        );
    } else {
        println!("{:<8} {:<8} {}", "STATUS", "ROWS", "FILE");
        for item in &summary.items {
            let (status, rows, detail) = match &item.outcome {
                ItemOutcome::Written { path, rows } => {
                    ("saved", rows.to_string(), path.display().to_string())
                }
                ItemOutcome::NoMatchingRows { source } => {
                    ("empty", "0".to_string(), source.display().to_string())
                }
                ItemOutcome::Failed(reason) => (
                    "failed",
                    "-".to_string(),
                    format!("{} ({})", item.target.suggested_filename, reason),
                ),
            };
            println!("{:<8} {:<8} {}", status, rows, detail);
        }
    }

    if !summary.scratch.is_gone() {
        println!(
            "Warning: temporary folder could not be fully removed; delete it by hand."
        );
    }
    println!("Output folder: {}", summary.output_dir.display());
}
