//! submodule command - Manage shared-repository submodules.

use super::{open_hub, Context};
use crate::cli::args::SubmoduleCommand;
use crate::vcs::{SubmoduleState, Submodules};
use anyhow::Result;

/// Dispatch `refhub submodule` subcommands.
pub fn submodule(ctx: &Context, command: SubmoduleCommand) -> Result<()> {
    let hub = open_hub(ctx)?;
    let submodules = Submodules::new(&hub.root);

    match command {
        SubmoduleCommand::Add { url, path, branch } => {
            submodules.add(&url, &path, branch.as_deref())?;
            if !ctx.quiet {
                println!("added submodule at {path}");
            }
            Ok(())
        }
        SubmoduleCommand::Update { name } => {
            submodules.update(&name)?;
            if !ctx.quiet {
                println!("updated {name}");
            }
            Ok(())
        }
        SubmoduleCommand::Init => {
            submodules.init()?;
            if !ctx.quiet {
                println!("initialized submodules");
            }
            Ok(())
        }
        SubmoduleCommand::Status => {
            let infos = submodules.status()?;
            if infos.is_empty() {
                println!("no submodules registered");
                return Ok(());
            }
            for info in infos {
                let state = match info.state {
                    SubmoduleState::UpToDate => "up-to-date",
                    SubmoduleState::NotInitialized => "not-initialized",
                    SubmoduleState::DifferentCommit => "different-commit",
                };
                match info.branch {
                    Some(branch) => {
                        println!("{:<16} {} {} ({branch})", state, info.commit, info.name)
                    }
                    None => println!("{:<16} {} {}", state, info.commit, info.name),
                }
            }
            Ok(())
        }
        SubmoduleCommand::Remove { name } => {
            submodules.remove(&name)?;
            if !ctx.quiet {
                println!("removed {name}");
            }
            Ok(())
        }
    }
}
