//! ccvalidator CLI
//!
//! Checks CircleCI configuration files against the configuration schema.
//! Exit status is 0 for a well-formed document, 1 for a document that
//! violates the schema, and 2 for unreadable or unparsable input.

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod loader;
mod logging;

use clap::Parser;
use cli::{Cli, EXIT_CLI, EXIT_OK, exit_code_for, render_error};
use logging::{TracingConfig, init_tracing};
use std::io::Write;

fn main() {
    // Using eprintln! here: tracing may not be usable during a panic.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = Cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("{e:?}");
        std::process::exit(EXIT_CLI);
    }

    let json_mode = cli.json_errors();
    let mut stdout = std::io::stdout().lock();
    let result = commands::execute(cli.command.into(), &mut stdout);
    let _ = stdout.flush();
    drop(stdout);

    let exit_code = match result {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, json_mode);
            exit_code_for(&err)
        }
    };
    std::process::exit(exit_code);
}
