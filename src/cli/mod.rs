//! cli
//!
//! Command-line interface layer for refhub.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Wire configuration into the resolver, cache, and fallback layers
//! - Delegate to command handlers
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! command handlers, which orchestrate the library modules; the library
//! never reads ambient configuration itself.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.debug);

    let ctx = commands::Context {
        cwd: cli.cwd.clone(),
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Initialize the tracing subscriber.
///
/// `--debug` lowers the filter to debug for this crate; otherwise `RUST_LOG`
/// applies with a warn default. Initialization is best-effort so repeated
/// calls stay harmless.
fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if debug {
        EnvFilter::new("refhub=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
