//! Persistent HTTP transport cache
//!
//! Every fetched URI is stored as a content file plus a `.headers`
//! properties file under the cache root. Later lookups are answered from
//! disk while the persisted headers say the copy is fresh, and otherwise
//! revalidated with a conditional request (`If-None-Match` /
//! `If-Modified-Since`).
//!
//! # Key Features
//!
//! - **Deterministic layout**: a URI always maps onto the same cache path
//! - **Conditional revalidation**: 304 responses refresh headers only
//! - **Redirect tracking**: 301/302 hops are persisted and loop-checked
//! - **Negative caching**: 404/410 outcomes are remembered
//! - **Offline mode**: lookups answered purely from persisted state
//! - **Stale fallback**: transient network failures serve the last good copy
//! - **Atomic writes**: temp file + rename for content and headers
//!
//! # Module Organization
//!
//! - [`config`] - Session flags and freshness knobs
//! - [`path`] - URI normalization and cache path generation
//! - [`headers`] - The `.headers` file model
//! - [`freshness`] - Revalidation rules
//! - [`redirect`] - Per-lookup redirect chain
//! - [`line`] - Per-URI state and conditional requests
//! - [`lru`] - Bounded in-memory line index
//! - [`store`] - The cache store
//! - [`entry`] - Lookup handles and stale fallback
//! - [`stats`] - Activity counters and disk usage
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transport_cache::app::cache::{CacheConfig, CacheStore};
//! use transport_cache::app::transport::{ClientConfig, ReqwestTransport};
//! use transport_cache::auth::NoCredentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Arc::new(NoCredentials);
//! let transport = Arc::new(ReqwestTransport::new(&ClientConfig::default(), credentials.clone())?);
//! let store = CacheStore::new(CacheConfig::default(), transport, credentials).await?;
//!
//! let entry = store
//!     .get_cache_entry("https://repo.example.org/p2/plugins/org.example_1.0.jar")
//!     .await?;
//! let file = entry.get_cache_file().await?;
//! println!("Cached at {}", file.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod freshness;
pub mod headers;
pub mod line;
pub mod lru;
pub mod path;
pub mod redirect;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export main public API
pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use freshness::{CacheControl, Freshness, FreshnessPolicy};
pub use headers::CachedHeaders;
pub use path::PathGenerator;
pub use redirect::RedirectChain;
pub use stats::{CacheStats, CacheStatsSnapshot, DiskUsage};
pub use store::CacheStore;
