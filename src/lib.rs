//! Transport Cache Library
//!
//! A persistent HTTP cache for remote repository artifacts. Fetched
//! resources live in a local directory next to their response headers,
//! are revalidated with conditional requests, and stay available offline.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
