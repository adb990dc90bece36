//! Command-line argument parsing for the transport cache
//!
//! This module defines the CLI structure using clap derive macros: global
//! flags mirror the cache session settings, subcommands resolve URIs
//! through the cache or report on its state.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Transport Cache - persistent HTTP cache for repository artifacts
#[derive(Parser, Debug)]
#[command(
    name = "transport_cache",
    version,
    about = "Fetch HTTP resources through a persistent, revalidating local cache",
    long_about = "Resolves URLs through a local cache directory. Cached copies are revalidated
with conditional requests, redirects and missing resources are remembered, and
offline mode answers purely from what was fetched before."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Answer from the cache only, never touching the network
    #[arg(long, global = true)]
    pub offline: bool,

    /// Revalidate every cached resource
    #[arg(long, global = true)]
    pub update: bool,

    /// Serve cached copies younger than this without revalidation
    #[arg(long, global = true, value_name = "MINUTES")]
    pub min_cache_period: Option<u64>,

    /// Maximum number of cache lines kept in memory
    #[arg(long, global = true, value_name = "N")]
    pub max_entries: Option<usize>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve URLs through the cache and print the local file paths
    Fetch(FetchArgs),

    /// Print the last-modified time of a URL (epoch millis, -1 if unknown)
    LastModified(LastModifiedArgs),

    /// Show the persisted headers of a URL without network access
    Inspect(InspectArgs),

    /// Cache information
    Cache(CacheArgs),

    /// Authentication and proxy settings
    Auth(AuthArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URLs to resolve
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,
}

/// Arguments for the last-modified command
#[derive(Args, Debug, Clone)]
pub struct LastModifiedArgs {
    /// URL to query
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Arguments for the inspect command
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// URL to inspect
    #[arg(value_name = "URL")]
    pub url: String,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for cache information
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache location, file counts and size
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Show which credential variables are configured
    Status,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
