//! Cache configuration types and defaults
//!
//! Mirrors the session flags the cache consults on every lookup
//! (offline, update, interactive) plus the freshness and sizing knobs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::cache;

/// Configuration for the transport cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache storage (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Never issue network requests
    pub offline: bool,
    /// Force revalidation of every cached line
    pub update: bool,
    /// Render download progress
    pub interactive: bool,
    /// Lines younger than this are served without revalidation
    pub min_cache_period: Duration,
    /// Soft cap of in-memory cache lines
    pub max_entries: usize,
    /// Conventional `Expires` semantics (past date means stale)
    pub strict_expires: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            offline: false,
            update: false,
            interactive: false,
            min_cache_period: cache::DEFAULT_MIN_CACHE_PERIOD,
            max_entries: cache::DEFAULT_MAX_ENTRIES,
            strict_expires: false,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Enable or disable offline mode
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Enable or disable forced revalidation
    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Enable or disable progress rendering
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Set the minimum cache period
    pub fn with_min_cache_period(mut self, period: Duration) -> Self {
        self.min_cache_period = period;
        self
    }

    /// Set the in-memory line cap
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Select conventional `Expires` semantics
    pub fn with_strict_expires(mut self, strict: bool) -> Self {
        self.strict_expires = strict;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn is_update(&self) -> bool {
        self.update
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Resolved cache root: configured path or `<os cache dir>/transport-cache`
    pub fn cache_location(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(cache::CACHE_DIR_NAME)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_root, None);
        assert!(!config.is_offline());
        assert!(!config.is_update());
        assert!(!config.is_interactive());
        assert_eq!(config.min_cache_period, Duration::from_secs(3600));
        assert_eq!(config.max_entries, 1000);
        assert!(!config.strict_expires);
        assert!(config.cache_location().ends_with(cache::CACHE_DIR_NAME));
    }

    #[test]
    fn test_config_builder() {
        let cache_root = PathBuf::from("/tmp/test");
        let config = CacheConfig::with_cache_root(cache_root.clone())
            .with_offline(true)
            .with_update(true)
            .with_interactive(true)
            .with_min_cache_period(Duration::ZERO)
            .with_max_entries(4)
            .with_strict_expires(true);

        assert_eq!(config.cache_location(), cache_root);
        assert!(config.is_offline());
        assert!(config.is_update());
        assert!(config.is_interactive());
        assert_eq!(config.min_cache_period, Duration::ZERO);
        assert_eq!(config.max_entries, 4);
        assert!(config.strict_expires);
    }
}
