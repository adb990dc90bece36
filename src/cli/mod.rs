//! Command-line interface components
//!
//! This module contains CLI-specific code for the transport cache binary:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    AuthAction, AuthArgs, CacheAction, CacheArgs, Cli, Commands, FetchArgs, GlobalArgs,
    InspectArgs, LastModifiedArgs,
};
pub use commands::{
    apply_overrides, handle_auth, handle_cache, handle_fetch, handle_inspect,
    handle_last_modified, open_store,
};
