//! CLI argument definitions for depot.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depot",
    version,
    about = "Resolve Maven dependency trees",
    long_about = "depot resolves module requests against Maven repositories, applying \
                  exclusion and rewrite rules and highest-version-wins conflict resolution."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the modules in a request file
    Resolve {
        /// Request file (TOML)
        file: PathBuf,
        /// Print only the resolved and unresolved lists
        #[arg(long)]
        no_tree: bool,
        /// Maximum tree depth
        #[arg(long)]
        depth: Option<usize>,
        /// Print a JSON summary
        #[arg(long)]
        json: bool,
    },

    /// List the published versions of a module
    Versions {
        /// Module coordinate (group:name)
        module: String,
        /// Repository URI, repeatable; defaults to Maven Central
        #[arg(long = "repo")]
        repos: Vec<String>,
    },

    /// Compare two versions, printing -1, 0, or 1
    Compare {
        /// First version
        a: String,
        /// Second version
        b: String,
    },

    /// Show the dependencies a module declares
    Descriptor {
        /// Module coordinate (group:name:version)
        module: String,
        /// Repository URI, repeatable; defaults to Maven Central
        #[arg(long = "repo")]
        repos: Vec<String>,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
