//! fallback command - Inspect and reconcile the offline fallback store.

use super::{open_hub, resolve::build_resolver, Context};
use crate::cli::args::FallbackCommand;
use crate::fallback::{FallbackManager, FallbackStore, HttpProbe, NetworkState};
use crate::resolver::ResolveOptions;
use anyhow::{bail, Result};
use chrono::Duration;

/// Dispatch `refhub fallback` subcommands.
pub fn fallback(ctx: &Context, command: FallbackCommand) -> Result<()> {
    let hub = open_hub(ctx)?;
    let store = FallbackStore::new(hub.config.fallback_dir(&hub.root));

    match command {
        FallbackCommand::Show { reference } => {
            let Some(entry) = store.read(&reference) else {
                bail!("no fallback entry for '{reference}'");
            };
            if !ctx.quiet {
                eprintln!("stored: {}", entry.timestamp.to_rfc3339());
            }
            println!("{}", entry.content);
            Ok(())
        }
        FallbackCommand::Sync => {
            let manager = FallbackManager::new(
                store,
                Box::new(HttpProbe::new(hub.config.probe_url())),
                hub.config.enable_network_check(),
            );

            // Reconciliation re-resolves live content; offline it would only
            // rewrite entries with their own stale selves.
            if manager.network_state() == NetworkState::Offline {
                bail!("offline; fallback sync needs live resolution");
            }

            let mut resolver = build_resolver(&hub);
            let report = manager.sync_with(|entry| {
                // Replay the local-path layout the entry was resolved under.
                let options = ResolveOptions {
                    use_submodule: entry
                        .metadata
                        .get("submodule")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(true),
                    use_cache: false,
                    cache_ttl: Duration::seconds(hub.config.memo_ttl_secs()),
                    max_depth: hub.config.max_depth(),
                    ..ResolveOptions::default()
                };
                resolver
                    .resolve(&entry.reference, &options)
                    .map(|resolved| resolved.content)
                    .map_err(|err| err.to_string())
            })?;

            println!(
                "checked {} entries, updated {}",
                report.checked, report.updated
            );
            for error in &report.errors {
                eprintln!("warning: {error}");
            }
            Ok(())
        }
    }
}
