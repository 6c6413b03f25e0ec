use inep_core::logging;

mod cli;

use crate::cli::CliCommand;

fn exit_with(err: anyhow::Error) -> ! {
    eprintln!("inep-ufrj error: {:#}", err);
    std::process::exit(1);
}

fn main() {
    // Validate before logging creates its state dir.
    let invocation = match CliCommand::validate_from_args() {
        Ok(invocation) => invocation,
        Err(err) => exit_with(err),
    };

    if let Err(err) = logging::init_logging() {
        logging::init_logging_console();
        tracing::warn!("file logging unavailable, console only: {:#}", err);
    }

    if let Err(err) = invocation.run() {
        exit_with(err);
    }
}
