//! Year input: from `--year` or a single interactive prompt.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use inep_core::dataset::{DatasetKind, Year};

fn prompt_message(dataset: DatasetKind) -> &'static str {
    match dataset {
        DatasetKind::Censo => "Census year to download (e.g. 2022): ",
        DatasetKind::Trajetoria => "FINAL follow-up year (second year of the tab, e.g. 2024): ",
    }
}

/// Writes `message`, reads one line and returns it without the line ending.
pub fn read_line<R: BufRead, W: Write>(mut input: R, mut output: W, message: &str) -> Result<String> {
    output.write_all(message.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("read year from stdin")?;
    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(trimmed.to_string())
}

/// Parses `arg` when given, otherwise prompts once on stdin. Anything but
/// four ASCII digits is an error.
pub fn resolve_year(arg: Option<String>, dataset: DatasetKind) -> Result<Year> {
    let raw = match arg {
        Some(raw) => raw,
        None => read_line(io::stdin().lock(), io::stdout(), prompt_message(dataset))?,
    };
    raw.parse::<Year>()
        .context("invalid input, please enter a 4-digit year")
}
