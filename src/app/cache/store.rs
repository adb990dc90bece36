//! Cache store: the in-memory index of cache lines
//!
//! The store maps normalized URIs onto lines (one per content file) and
//! hands out [`CacheEntry`] views. It owns the transport, the credentials
//! provider and the session configuration every line consults.
//!
//! Known outcomes are short-circuited before a line is touched: a
//! persisted 404/410 fails immediately and a persisted permanent redirect
//! without content of its own is followed to its target. Neither applies in
//! update mode.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use super::config::CacheConfig;
use super::entry::CacheEntry;
use super::freshness::FreshnessPolicy;
use super::headers::CachedHeaders;
use super::line::CacheLine;
use super::lru::LruIndex;
use super::path::PathGenerator;
use super::redirect::RedirectChain;
use super::stats::{CacheStats, CacheStatsSnapshot, DirectoryScanner};
use crate::app::transport::Transport;
use crate::auth::CredentialsProvider;
use crate::errors::{CacheError, CacheResult};

/// Persistent HTTP cache rooted at a local directory
pub struct CacheStore {
    config: CacheConfig,
    cache_root: PathBuf,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialsProvider>,
    policy: FreshnessPolicy,
    stats: Arc<CacheStats>,
    /// Lines keyed by content file path
    lines: Mutex<LruIndex<PathBuf, Arc<CacheLine>>>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("cache_root", &self.cache_root)
            .field("offline", &self.config.offline)
            .field("update", &self.config.update)
            .field("lines", &self.lines.lock().len())
            .finish()
    }
}

impl CacheStore {
    /// Create a store, creating the cache directory if necessary
    ///
    /// # Errors
    ///
    /// Returns `CacheError::DirectoryNotAccessible` if the cache root
    /// cannot be created
    pub async fn new(
        config: CacheConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> CacheResult<Self> {
        let cache_root = config.cache_location();
        Self::ensure_directory_exists(&cache_root).await?;

        info!(
            "Initialized transport cache at {} (offline: {}, update: {})",
            cache_root.display(),
            config.is_offline(),
            config.is_update()
        );

        Ok(Self {
            policy: FreshnessPolicy::from_config(&config),
            lines: Mutex::new(LruIndex::new(config.max_entries)),
            stats: Arc::new(CacheStats::default()),
            cache_root,
            config,
            transport,
            credentials,
        })
    }

    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        if tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(());
        }
        tokio::fs::create_dir_all(path).await.map_err(|e| {
            error!("Failed to create cache directory {}: {}", path.display(), e);
            CacheError::DirectoryNotAccessible {
                path: path.to_path_buf(),
            }
        })?;
        debug!("Created cache directory: {}", path.display());
        Ok(())
    }

    /// Look up the entry for a URI
    ///
    /// Nothing is fetched yet; the entry resolves lazily through
    /// [`CacheEntry::get_cache_file`] or [`CacheEntry::get_last_modified`].
    ///
    /// # Errors
    ///
    /// * `InvalidUrl` if the URI cannot be normalized
    /// * `NotFound` if the URI is known to be absent
    /// * `RedirectLoop` / `TooManyRedirects` when following known redirects
    pub async fn get_cache_entry(&self, uri: &str) -> CacheResult<CacheEntry<'_>> {
        let url = PathGenerator::normalize(uri)?;
        self.stats.record_lookup();

        let mut chain = RedirectChain::new(&url);
        let (url, line) = self.resolve_line(url, &mut chain).await?;
        Ok(CacheEntry::new(self, url, line, chain))
    }

    /// Persisted headers of a URI, without any network access
    pub async fn inspect(&self, uri: &str) -> CacheResult<Option<CachedHeaders>> {
        let url = PathGenerator::normalize(uri)?;
        self.line_for(&url).persisted_headers().await
    }

    /// Find the line serving `url`, following known permanent redirects
    async fn resolve_line(
        &self,
        mut url: Url,
        chain: &mut RedirectChain,
    ) -> CacheResult<(Url, Arc<CacheLine>)> {
        loop {
            let line = self.line_for(&url);
            if self.config.is_update() {
                return Ok((url, line));
            }

            let Some(headers) = line.persisted_headers().await? else {
                return Ok((url, line));
            };

            match headers.response_code {
                Some(status @ (404 | 410)) => {
                    debug!("{} is known to be absent (HTTP {})", url, status);
                    return Err(CacheError::NotFound {
                        url: url.to_string(),
                        status,
                    });
                }
                Some(301) if !line.has_content().await => {
                    let location =
                        headers
                            .location()
                            .ok_or_else(|| CacheError::MissingLocation {
                                url: url.to_string(),
                                status: 301,
                            })?;
                    let target = PathGenerator::resolve_location(&url, location)?;
                    chain.follow(&url, &target)?;
                    debug!("Following known redirect {} -> {}", url, target);
                    url = target;
                }
                _ => return Ok((url, line)),
            }
        }
    }

    /// Get or create the line for a normalized URI
    fn line_for(&self, url: &Url) -> Arc<CacheLine> {
        let content_file = PathGenerator::get_file_path(&self.cache_root, url);
        let mut lines = self.lines.lock();

        if let Some(line) = lines.get(&content_file) {
            return Arc::clone(line);
        }

        let line = Arc::new(CacheLine::new(url.clone(), content_file.clone()));
        lines.insert(content_file, Arc::clone(&line));

        while lines.is_over_capacity() {
            // Lines still referenced by an entry or an in-flight fetch stay
            match lines.evict_lru_where(|_, line| Arc::strong_count(line) == 1) {
                Some((path, _)) => {
                    self.stats.record_eviction();
                    debug!("Evicted cache line {}", path.display());
                }
                None => {
                    warn!(
                        "Cache index holds {} lines (capacity {}), all in use",
                        lines.len(),
                        lines.capacity()
                    );
                    break;
                }
            }
        }

        line
    }

    /// Resolve the content file of a redirect target within an existing chain
    pub(crate) fn redirect_file<'a>(
        &'a self,
        target: Url,
        chain: &'a mut RedirectChain,
        force_offline: bool,
    ) -> BoxFuture<'a, CacheResult<PathBuf>> {
        Box::pin(async move {
            let (url, line) = self.resolve_line(target, chain).await?;
            let entry = CacheEntry::new(self, url, line, chain.clone());
            entry.resolve_file(chain, force_offline).await
        })
    }

    /// Resolve the last-modified time of a redirect target within an existing chain
    pub(crate) fn redirect_last_modified<'a>(
        &'a self,
        target: Url,
        chain: &'a mut RedirectChain,
        force_offline: bool,
    ) -> BoxFuture<'a, CacheResult<i64>> {
        Box::pin(async move {
            let (url, line) = self.resolve_line(target, chain).await?;
            let entry = CacheEntry::new(self, url, line, chain.clone());
            entry.resolve_last_modified(chain, force_offline).await
        })
    }

    /// Number of lines currently held in memory
    pub fn line_count(&self) -> usize {
        self.lines.lock().len()
    }

    /// Activity counters plus a scan of the cache directory
    pub async fn statistics(&self) -> CacheStatsSnapshot {
        let mut snapshot = self
            .stats
            .snapshot(self.cache_root.clone(), self.line_count());
        snapshot.disk = DirectoryScanner::scan_cache_directory(&self.cache_root).await;
        snapshot
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn credentials(&self) -> &dyn CredentialsProvider {
        self.credentials.as_ref()
    }

    /// Live activity counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
