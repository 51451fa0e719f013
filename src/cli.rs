//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resolve bibliographic records to document URLs.
///
/// Doclink maps each record's journal to a publisher, fills the publisher's
/// URL template and optionally verifies the result with a single request.
/// Results are written to stdout as JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "doclink")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (defaults to $XDG_CONFIG_HOME/doclink/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a single record given on the command line
    Resolve(ResolveArgs),
    /// Resolve JSON-lines records from stdin (or --input), one result per line
    Batch(BatchArgs),
    /// Validate a catalogue file and print its size
    Check(CatalogueArgs),
}

/// Catalogue selection shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CatalogueArgs {
    /// Catalogue JSON file (overrides `catalogue` in the config file)
    #[arg(long, value_name = "PATH")]
    pub catalogue: Option<PathBuf>,
}

/// Network and verification flags shared by `resolve` and `batch`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Verify each candidate with one bounded request
    #[arg(long, conflicts_with = "no_verify")]
    pub verify: bool,

    /// Skip verification even if the config file enables it
    #[arg(long)]
    pub no_verify: bool,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout_secs: Option<u64>,

    /// Per-check request timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub request_timeout_secs: Option<u64>,

    /// Maximum redirect hops per check (0-20)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=20))]
    pub max_redirects: Option<u8>,
}

impl NetworkArgs {
    /// Returns the explicit verify choice, if either flag was given.
    #[must_use]
    pub fn verify_override(&self) -> Option<bool> {
        if self.verify {
            Some(true)
        } else if self.no_verify {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub catalogue: CatalogueArgs,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// Record identifier echoed in the output
    #[arg(long, default_value = "cli")]
    pub record_id: String,

    /// Journal name, abbreviation or ISSN
    #[arg(long)]
    pub journal: Option<String>,

    #[arg(long)]
    pub doi: Option<String>,

    #[arg(long)]
    pub volume: Option<String>,

    #[arg(long)]
    pub issue: Option<String>,

    #[arg(long)]
    pub first_page: Option<String>,

    /// Publisher-assigned item identifier
    #[arg(long)]
    pub item_id: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub catalogue: CatalogueArgs,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// Read records from this file instead of stdin
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Maximum concurrent resolutions (1-64)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub concurrency: Option<u8>,
}
