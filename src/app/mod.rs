//! Core application logic for the transport cache
//!
//! This module contains the persistent cache and the network transport it
//! revalidates through.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transport_cache::app::{CacheConfig, CacheStore, ClientConfig, TransportBackend};
//! use transport_cache::auth::StaticCredentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Arc::new(StaticCredentials::from_env()?);
//! let transport = TransportBackend::Pooled.build(&ClientConfig::default(), credentials.clone())?;
//! let store = CacheStore::new(CacheConfig::default(), transport, credentials).await?;
//!
//! let entry = store.get_cache_entry("https://repo.example.org/p2/content.xml.xz").await?;
//! println!("Last modified: {}", entry.get_last_modified().await?);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod transport;

// Re-export main public API
pub use cache::{CacheConfig, CacheEntry, CacheStatsSnapshot, CachedHeaders, CacheStore};
pub use transport::{
    ClientConfig, ReqwestTransport, Transport, TransportBackend, TransportRequest,
    TransportResponse,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);
        assert_eq!(TransportBackend::default(), TransportBackend::Pooled);
        assert!(!CacheConfig::default().is_offline());
    }
}
