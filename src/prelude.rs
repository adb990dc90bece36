//! Prelude module for the Transport Cache Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use transport_cache::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use transport_cache::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let credentials: Arc<dyn CredentialsProvider> = Arc::new(StaticCredentials::from_env()?);
//!     let client_config = ClientConfig::default();
//!     let transport = client_config.backend.build(&client_config, credentials.clone())?;
//!     let store = CacheStore::new(CacheConfig::default(), transport, credentials).await?;
//!
//!     let file = store
//!         .get_cache_entry("https://repo.example.org/content.jar")
//!         .await?
//!         .get_cache_file()
//!         .await?;
//!     println!("{}", file.display());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CacheError, CacheResult, Result};

// Cache and transport components used in most integrations
pub use crate::app::{
    CacheConfig, CacheEntry, CacheStatsSnapshot, CacheStore, CachedHeaders, ClientConfig,
    ReqwestTransport, Transport, TransportBackend,
};

// Credentials
pub use crate::auth::{Credentials, CredentialsProvider, NoCredentials, StaticCredentials};

// Configuration
pub use crate::config::AppConfig;
