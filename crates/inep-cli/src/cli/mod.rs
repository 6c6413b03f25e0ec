//! CLI for the INEP/UFRJ dataset harvester.

mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use inep_core::config;
use inep_core::dataset::{DatasetKind, Year};

use commands::run_harvest;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "inep-ufrj")]
#[command(
    about = "Download INEP higher-education datasets and keep only UFRJ's rows",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Censo da Educação Superior microdata for one year.
    Censo {
        /// Census year (YYYY). Prompted for when omitted.
        #[arg(long, value_name = "YYYY")]
        year: Option<String>,
    },

    /// Trajectory indicators for every tab whose final year matches.
    Trajetoria {
        /// Final follow-up year of the tab label (YYYY). Prompted for when omitted.
        #[arg(long, value_name = "YYYY")]
        year: Option<String>,
    },
}

/// A validated request, ready to run.
#[derive(Debug)]
pub struct Invocation {
    pub dataset: DatasetKind,
    pub year: Year,
}

impl CliCommand {
    fn dataset(&self) -> DatasetKind {
        match self {
            CliCommand::Censo { .. } => DatasetKind::Censo,
            CliCommand::Trajetoria { .. } => DatasetKind::Trajetoria,
        }
    }

    /// Parses the arguments and settles the year, prompting if needed.
    /// Nothing is written to disk before this returns.
    pub fn validate_from_args() -> Result<Invocation> {
        Self::validate(Cli::parse().command)
    }

    fn validate(command: CliCommand) -> Result<Invocation> {
        let dataset = command.dataset();
        let (CliCommand::Censo { year } | CliCommand::Trajetoria { year }) = command;
        let year = prompt::resolve_year(year, dataset)?;
        Ok(Invocation { dataset, year })
    }
}

impl Invocation {
    pub fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        run_harvest(self.dataset, self.year, &cfg)
    }
}

#[cfg(test)]
mod tests;
