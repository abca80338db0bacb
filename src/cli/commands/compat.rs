//! compat command - Check component version compatibility.

use super::{open_hub, Context};
use crate::cli::args::CompatCommand;
use crate::core::version::{check_breaking_changes, check_compatibility, Compatibility};
use anyhow::{Context as _, Result};
use std::fs;

/// Dispatch `refhub compat` subcommands.
pub fn compat(ctx: &Context, command: CompatCommand) -> Result<()> {
    match command {
        CompatCommand::Check { component, version } => {
            let hub = open_hub(ctx)?;
            let rules = hub.config.compatibility_rules();
            match check_compatibility(&component, &version, &rules)? {
                Compatibility::Compatible => {
                    println!("{component} {version}: compatible");
                }
                Compatibility::Incompatible { reason } => {
                    println!("{component} {version}: incompatible ({reason})");
                }
            }
            Ok(())
        }
        CompatCommand::Breaking {
            from,
            to,
            changelog,
        } => {
            let text = fs::read_to_string(&changelog)
                .with_context(|| format!("cannot read changelog '{}'", changelog.display()))?;
            let result = check_breaking_changes(&from, &to, &text)?;

            if !result.has_breaking_changes {
                println!("no breaking changes between {from} and {to}");
                return Ok(());
            }
            println!(
                "{} breaking change(s) between {from} and {to}:",
                result.changes.len()
            );
            for change in &result.changes {
                println!("  [{}] {}", change.version, change.description);
            }
            Ok(())
        }
    }
}
