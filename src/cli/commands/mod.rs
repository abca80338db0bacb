//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Locates the hub root and loads configuration
//! 2. Wires the library modules together per that configuration
//! 3. Formats and displays output
//!
//! The orchestration the library deliberately leaves to its caller lives
//! here: `resolve` ties the resolver to the persistent cache and the
//! fallback store, `fallback sync` ties the fallback store back to the
//! resolver, and `compat` evaluates the configured rule tables.

mod cache_cmd;
mod compat;
mod completion;
mod fallback_cmd;
mod resolve;
mod scan;
mod submodule;

pub use cache_cmd::cache;
pub use compat::compat;
pub use completion::completions;
pub use fallback_cmd::fallback;
pub use resolve::resolve;
pub use scan::scan;
pub use submodule::submodule;

use crate::cli::args::Command;
use crate::core::config::{Config, ConfigLoadResult};
use crate::vcs;
use anyhow::{Context as _, Result};
use std::path::PathBuf;

/// Execution context from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Run as if started in this directory.
    pub cwd: Option<PathBuf>,
    /// Minimal output.
    pub quiet: bool,
}

/// Hub root plus its loaded configuration.
pub(crate) struct Hub {
    pub root: PathBuf,
    pub config: Config,
}

/// Locate the hub and load its configuration.
///
/// The hub root is the enclosing repository's working directory; outside a
/// repository the (possibly `--cwd`-overridden) current directory serves.
pub(crate) fn open_hub(ctx: &Context) -> Result<Hub> {
    let cwd = match &ctx.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let root = vcs::discover_hub_root(&cwd).unwrap_or(cwd);

    let ConfigLoadResult { config, warnings } = Config::load(Some(&root))?;
    if !ctx.quiet {
        for warning in &warnings {
            eprintln!(
                "warning: {} ({})",
                warning.message,
                warning.path.display()
            );
        }
    }

    Ok(Hub { root, config })
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Resolve {
            reference,
            submodule,
            format,
            nested,
            no_cache,
            offline_template,
        } => resolve::resolve(
            ctx,
            &reference,
            resolve::ResolveArgs {
                submodule,
                format,
                nested,
                no_cache,
                offline_template,
            },
        ),
        Command::Scan { root, ext, all } => scan::scan(ctx, root, ext, all),
        Command::Cache { command } => cache_cmd::cache(ctx, command),
        Command::Fallback { command } => fallback_cmd::fallback(ctx, command),
        Command::Compat { command } => compat::compat(ctx, command),
        Command::Submodule { command } => submodule::submodule(ctx, command),
        Command::Completions { shell } => completion::completions(shell),
    }
}
