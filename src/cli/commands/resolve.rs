//! resolve command - Resolve a reference, with cache write-through and
//! fallback on failure.

use super::{open_hub, Context, Hub};
use crate::cache::ComponentCache;
use crate::cli::args::FormatArg;
use crate::fallback::{FallbackManager, FallbackSource, FallbackStore, HttpProbe, NetworkState};
use crate::resolver::{ResolveError, ResolveOptions, Resolved, Resolver, ResolverConfig};
use anyhow::{Context as _, Result};
use chrono::Duration;
use tracing::warn;

/// Flags accepted by `refhub resolve`.
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    pub submodule: bool,
    pub format: Option<FormatArg>,
    pub nested: bool,
    pub no_cache: bool,
    pub offline_template: bool,
}

/// Resolve a reference and print its content.
///
/// On success the content is written through to the persistent cache and
/// the fallback store (both best-effort). When the content is unavailable,
/// the fallback layer serves degraded content instead.
pub fn resolve(ctx: &Context, reference: &str, args: ResolveArgs) -> Result<()> {
    let hub = open_hub(ctx)?;
    let mut resolver = build_resolver(&hub);
    let options = build_options(&hub, &args);

    match resolver.resolve(reference, &options) {
        Ok(resolved) => {
            write_through(&hub, reference, &resolved, options.use_submodule);
            print_resolved(ctx, &resolved)
        }
        Err(err @ ResolveError::ContentUnavailable { .. }) => {
            serve_fallback(ctx, &hub, reference, &args, err)
        }
        Err(err) => Err(err).context(format!("failed to resolve '{reference}'")),
    }
}

pub(crate) fn build_resolver(hub: &Hub) -> Resolver {
    Resolver::new(
        ResolverConfig::new(&hub.root)
            .with_policy(hub.config.security_policy())
            .with_memo_capacity(hub.config.memo_capacity()),
    )
}

fn build_options(hub: &Hub, args: &ResolveArgs) -> ResolveOptions {
    ResolveOptions {
        use_submodule: args.submodule,
        extract: args.format.map(Into::into),
        resolve_nested: args.nested,
        max_depth: hub.config.max_depth(),
        use_cache: !args.no_cache,
        cache_ttl: Duration::seconds(hub.config.memo_ttl_secs()),
    }
}

/// Record a successful resolution in the persistent cache and the fallback
/// store. Both are optimizations; failures are logged and never surface.
///
/// `cache_enabled` gates only the component cache; a fallback entry is
/// written on every successful resolution. The metadata records which
/// local-path layout produced the content, so `fallback sync` can replay it.
fn write_through(hub: &Hub, reference: &str, resolved: &Resolved, use_submodule: bool) {
    let metadata = serde_json::json!({
        "local_path": resolved.local_path,
        "repository": resolved.reference.repository(),
        "branch": resolved.reference.branch(),
        "submodule": use_submodule,
    });

    if hub.config.cache_enabled() {
        let cache = ComponentCache::new(hub.config.cache_dir(&hub.root)).with_limits(
            hub.config.cache_max_size_mb(),
            Duration::seconds(hub.config.cache_ttl_secs()),
        );
        if let Err(err) = cache.store(reference, &resolved.content, None, metadata.clone()) {
            warn!(%reference, %err, "cache write-through failed");
        }
    }

    let store = FallbackStore::new(hub.config.fallback_dir(&hub.root));
    if let Err(err) = store.write_through(reference, &resolved.content, metadata) {
        warn!(%reference, %err, "fallback write-through failed");
    }
}

fn print_resolved(ctx: &Context, resolved: &Resolved) -> Result<()> {
    if let Some(parsed) = &resolved.parsed {
        println!("{}", serde_json::to_string_pretty(parsed)?);
    } else if let Some(substituted) = &resolved.resolved {
        println!("{substituted}");
    } else {
        println!("{}", resolved.content);
    }

    if resolved.from_cache && !ctx.quiet {
        eprintln!("(served from resolution cache)");
    }
    Ok(())
}

/// Serve degraded content after a live resolution failure.
fn serve_fallback(
    ctx: &Context,
    hub: &Hub,
    reference: &str,
    args: &ResolveArgs,
    live_error: ResolveError,
) -> Result<()> {
    let manager = FallbackManager::new(
        FallbackStore::new(hub.config.fallback_dir(&hub.root)),
        Box::new(HttpProbe::new(hub.config.probe_url())),
        hub.config.enable_network_check(),
    );

    match manager.fallback_content(reference, args.offline_template) {
        Ok(content) => {
            if !ctx.quiet {
                let state = match manager.network_state() {
                    NetworkState::Online => "online",
                    NetworkState::Offline => "offline",
                };
                let source = match content.source {
                    FallbackSource::Store => "fallback store",
                    FallbackSource::Template => "default template",
                };
                eprintln!(
                    "warning: live resolution failed ({live_error}); serving {source} ({state})"
                );
            }
            println!("{}", content.content);
            Ok(())
        }
        Err(_) => Err(live_error)
            .context(format!("failed to resolve '{reference}' and no fallback is available")),
    }
}
