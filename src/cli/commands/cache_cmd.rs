//! cache command - Inspect and maintain the persistent component cache.

use super::{open_hub, Context};
use crate::cache::ComponentCache;
use crate::cli::args::CacheCommand;
use anyhow::Result;
use chrono::Duration;

/// Dispatch `refhub cache` subcommands.
pub fn cache(ctx: &Context, command: CacheCommand) -> Result<()> {
    let hub = open_hub(ctx)?;
    let cache = ComponentCache::new(hub.config.cache_dir(&hub.root)).with_limits(
        hub.config.cache_max_size_mb(),
        Duration::seconds(hub.config.cache_ttl_secs()),
    );

    match command {
        CacheCommand::Stats => {
            let stats = cache.stats()?;
            println!("entries: {}", stats.entries);
            println!("size: {}", human_bytes(stats.total_bytes));
            println!("budget: {} MB", hub.config.cache_max_size_mb());
            Ok(())
        }
        CacheCommand::Prune => {
            let report = cache.evict_if_needed()?;
            println!(
                "removed {} entries, {} remaining",
                report.removed,
                human_bytes(report.remaining_bytes)
            );
            Ok(())
        }
        CacheCommand::Clear => {
            let removed = cache.clear()?;
            println!("removed {removed} entries");
            Ok(())
        }
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
