//! scan command - List references across a file tree.

use super::{open_hub, Context};
use crate::core::scan::{scan_references, ScanOptions};
use anyhow::Result;
use std::path::PathBuf;

/// Scan for references and print them with file:line provenance.
///
/// Only grammar-valid references print by default; `--all` includes rejected
/// matches with the rejection reason.
pub fn scan(ctx: &Context, root: Option<PathBuf>, ext: Vec<String>, all: bool) -> Result<()> {
    let hub = open_hub(ctx)?;
    let root = root.unwrap_or_else(|| hub.root.clone());
    let policy = hub.config.security_policy();

    let options = if ext.is_empty() {
        ScanOptions::default()
    } else {
        ScanOptions { extensions: ext }
    };

    let mut valid = 0usize;
    let mut rejected = 0usize;
    for m in scan_references(&root, &options, &policy) {
        match &m.reference {
            Ok(_) => {
                valid += 1;
                println!("{}:{}: {}", m.file.display(), m.line, m.raw);
            }
            Err(err) => {
                rejected += 1;
                if all {
                    println!("{}:{}: {} [invalid: {}]", m.file.display(), m.line, m.raw, err);
                }
            }
        }
    }

    if !ctx.quiet {
        eprintln!("{valid} valid, {rejected} rejected");
    }
    Ok(())
}
