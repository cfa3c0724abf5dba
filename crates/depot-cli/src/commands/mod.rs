//! Command dispatch and handler modules.

mod compare;
mod descriptor;
mod resolve;
mod versions;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve {
            file,
            no_tree,
            depth,
            json,
        } => resolve::exec(&file, no_tree, depth, json).await,
        Command::Versions { module, repos } => versions::exec(&module, &repos).await,
        Command::Compare { a, b } => compare::exec(&a, &b),
        Command::Descriptor { module, repos } => descriptor::exec(&module, &repos).await,
    }
}
