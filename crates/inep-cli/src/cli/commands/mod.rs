//! CLI command handlers.

mod harvest;
mod report;

pub use harvest::run_harvest;
