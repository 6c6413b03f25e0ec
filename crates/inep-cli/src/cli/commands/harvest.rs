//! `inep-ufrj censo` / `inep-ufrj trajetoria` – one harvesting run.

use anyhow::{Context, Result};
use inep_core::config::AppConfig;
use inep_core::dataset::{DatasetKind, Year};
use inep_core::pipeline::{self, Pipeline};

use super::report::print_summary;

/// Runs the full pipeline for `dataset` in the current working directory.
pub fn run_harvest(dataset: DatasetKind, year: Year, cfg: &AppConfig) -> Result<()> {
    let base_dir = std::env::current_dir().context("resolve working directory")?;
    let mut discovery = pipeline::discovery_for(dataset, cfg, &base_dir);
    let fetcher = pipeline::fetcher_for(dataset, cfg);

    let summary = Pipeline::new(dataset, year, cfg, &base_dir)
        .run(discovery.as_mut(), &fetcher)
        .with_context(|| format!("{dataset} {year}"))?;

    print_summary(&summary);
    Ok(())
}
