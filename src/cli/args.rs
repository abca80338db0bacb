//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Refhub - cross-repository reference resolution and caching
#[derive(Parser, Debug)]
#[command(name = "refhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if refhub was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a cross-repository reference to content
    #[command(
        name = "resolve",
        long_about = "Resolve a cross-repository reference to content.\n\n\
            References use the syntax @<type>:<repository>[@<branch>]/<path>, e.g.\n\
            @github:assetutilities/src/workflow.md. The reference is validated against \
            the configured repository allow-list, mapped to a local path under the hub, \
            and read from disk. Successful resolutions are written through to the \
            persistent cache and the offline fallback store; when live resolution \
            fails, the fallback store is consulted instead.",
        after_help = "\
EXAMPLES:
    # Resolve through a checked-out submodule under src/external/
    refhub resolve --submodule @github:assetutilities/src/workflow.md

    # Extract structured content
    refhub resolve --submodule --format yaml @github:assetutilities/conf.yml

    # Substitute references embedded in the content
    refhub resolve --submodule --nested @github:shared-templates/spec.md

    # Degrade gracefully when the target is unavailable
    refhub resolve --offline-template @github:assetutilities/src/workflow.md"
    )]
    Resolve {
        /// The reference to resolve
        reference: String,

        /// Resolve through src/external/<repo> instead of the checkout cache
        #[arg(long)]
        submodule: bool,

        /// Parse content as structured data (yaml, json, text)
        #[arg(long, value_name = "FORMAT")]
        format: Option<FormatArg>,

        /// Resolve references embedded in the content
        #[arg(long)]
        nested: bool,

        /// Bypass the in-memory resolution memo
        #[arg(long)]
        no_cache: bool,

        /// Synthesize a stub document when no fallback entry exists
        #[arg(long)]
        offline_template: bool,
    },

    /// Find references across a file tree
    #[command(
        name = "scan",
        long_about = "Find cross-repository references across a file tree.\n\n\
            Scans files with the selected extensions (md, yml, yaml, json by default), \
            skipping hidden and dependency directories, and lists every reference with \
            its file and line. Each match is re-validated through the grammar; use \
            --all to include matches the grammar rejects."
    )]
    Scan {
        /// Directory to scan (defaults to the hub root)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Comma-separated file extensions to scan
        #[arg(long, value_name = "EXT", value_delimiter = ',')]
        ext: Vec<String>,

        /// Include matches the grammar rejects
        #[arg(long)]
        all: bool,
    },

    /// Inspect and maintain the persistent component cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Inspect and reconcile the offline fallback store
    Fallback {
        #[command(subcommand)]
        command: FallbackCommand,
    },

    /// Check component version compatibility
    Compat {
        #[command(subcommand)]
        command: CompatCommand,
    },

    /// Manage shared-repository submodules
    Submodule {
        #[command(subcommand)]
        command: SubmoduleCommand,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// `refhub cache` subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show entry count and aggregate size
    Stats,
    /// Evict oldest-modified entries until the store fits its budget
    Prune,
    /// Delete every cache entry
    Clear,
}

/// `refhub fallback` subcommands.
#[derive(Subcommand, Debug)]
pub enum FallbackCommand {
    /// Re-resolve every stored entry and rewrite those whose content changed
    Sync,
    /// Show the stored fallback entry for a reference
    Show {
        /// The reference to look up
        reference: String,
    },
}

/// `refhub compat` subcommands.
#[derive(Subcommand, Debug)]
pub enum CompatCommand {
    /// Check a component version against the configured rules
    Check {
        /// Component name
        component: String,
        /// Version to check
        version: String,
    },
    /// List breaking changes between two versions of a changelog
    Breaking {
        /// Lower bound (exclusive)
        from: String,
        /// Upper bound (inclusive)
        to: String,
        /// Path to the changelog file
        #[arg(long, value_name = "PATH")]
        changelog: PathBuf,
    },
}

/// `refhub submodule` subcommands.
#[derive(Subcommand, Debug)]
pub enum SubmoduleCommand {
    /// Register and clone a shared repository
    Add {
        /// Repository URL
        url: String,
        /// Checkout path inside the hub
        path: String,
        /// Branch to track
        #[arg(long)]
        branch: Option<String>,
    },
    /// Update one submodule to its upstream state
    Update {
        /// Submodule name
        name: String,
    },
    /// Initialize all registered submodules
    Init,
    /// Show the status of every registered submodule
    Status,
    /// Deregister and remove a submodule
    Remove {
        /// Submodule name
        name: String,
    },
}

/// Content formats accepted by `resolve --format`.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum FormatArg {
    Yaml,
    Json,
    Text,
}

impl From<FormatArg> for crate::resolver::ContentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => crate::resolver::ContentFormat::Yaml,
            FormatArg::Json => crate::resolver::ContentFormat::Json,
            FormatArg::Text => crate::resolver::ContentFormat::Text,
        }
    }
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_flags_parse() {
        let cli = Cli::try_parse_from([
            "refhub",
            "resolve",
            "--submodule",
            "--format",
            "yaml",
            "--nested",
            "@github:assetutilities/a.yml",
        ])
        .unwrap();
        match cli.command {
            Command::Resolve {
                reference,
                submodule,
                format,
                nested,
                no_cache,
                offline_template,
            } => {
                assert_eq!(reference, "@github:assetutilities/a.yml");
                assert!(submodule);
                assert!(matches!(format, Some(FormatArg::Yaml)));
                assert!(nested);
                assert!(!no_cache);
                assert!(!offline_template);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn scan_extensions_split_on_commas() {
        let cli =
            Cli::try_parse_from(["refhub", "scan", "--ext", "md,yaml"]).unwrap();
        match cli.command {
            Command::Scan { ext, .. } => assert_eq!(ext, vec!["md", "yaml"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
