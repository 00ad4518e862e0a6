//! Couplet Composer CLI - builds the Obliging Ode and Unsung Anthem projects

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use couplet::deps::DependencyError;
use couplet::ops::PresetError;
use couplet::toolchain::ToolchainError;
use couplet::util::diagnostic::{self, Diagnostic};
use couplet::util::shell::Shell;

fn main() {
    let cli = Cli::parse();
    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.print_debug > 0,
        cli.color,
    ));

    if let Err(e) = run(&cli, Arc::clone(&shell)) {
        report(&e, shell.use_color());
        std::process::exit(1);
    }
}

fn run(cli: &Cli, shell: Arc<Shell>) -> Result<()> {
    // RUST_LOG wins over --print-debug
    let level = match cli.print_debug {
        0 => "couplet=info",
        1 => "couplet=debug",
        _ => "couplet=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match &cli.command {
        Commands::Preset(args) => commands::preset::execute(cli, args, &shell),
        Commands::Configure(args) => commands::configure::execute(cli, args, shell),
        Commands::Compose(args) => commands::compose::execute(cli, args, shell),
        Commands::Status(args) => commands::status::execute(args, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, rendering known error types as diagnostics.
fn report(err: &anyhow::Error, color: bool) {
    match known_diagnostic(err) {
        Some(diag) => diagnostic::emit(&diag, color),
        None => eprintln!("error: {:#}", err),
    }
}

fn known_diagnostic(err: &anyhow::Error) -> Option<Diagnostic> {
    if let Some(e) = err.downcast_ref::<DependencyError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = err.downcast_ref::<ToolchainError>() {
        return Some(e.to_diagnostic());
    }
    err.downcast_ref::<PresetError>().map(PresetError::to_diagnostic)
}
