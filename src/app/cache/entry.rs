//! Per-lookup view of a cache line
//!
//! Outside offline and update modes, a transient failure (network error,
//! unexpected status, unreadable redirect) falls back to the persisted
//! state of a line that has completed a request before. Not-found,
//! authentication and redirect-loop failures always reach the caller.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use super::line::CacheLine;
use super::redirect::RedirectChain;
use super::store::CacheStore;
use crate::errors::{CacheError, CacheResult};

/// Handle on one URI, returned by [`CacheStore::get_cache_entry`]
#[derive(Debug)]
pub struct CacheEntry<'a> {
    store: &'a CacheStore,
    url: Url,
    line: Arc<CacheLine>,
    /// Redirects already followed to reach this entry
    chain: RedirectChain,
}

impl<'a> CacheEntry<'a> {
    pub(super) fn new(
        store: &'a CacheStore,
        url: Url,
        line: Arc<CacheLine>,
        chain: RedirectChain,
    ) -> Self {
        Self {
            store,
            url,
            line,
            chain,
        }
    }

    /// URI this entry resolves, after known redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Local path the content is (or will be) stored at
    pub fn content_path(&self) -> PathBuf {
        self.line.content_file().to_path_buf()
    }

    /// Last modification time of the remote resource
    ///
    /// Milliseconds since the epoch, or -1 when the server sent no
    /// `Last-Modified`.
    pub async fn get_last_modified(&self) -> CacheResult<i64> {
        let mut chain = self.chain.clone();
        self.resolve_last_modified(&mut chain, false).await
    }

    /// Local file holding the current content of the resource
    pub async fn get_cache_file(&self) -> CacheResult<PathBuf> {
        let mut chain = self.chain.clone();
        self.resolve_file(&mut chain, false).await
    }

    pub(super) async fn resolve_file(
        &self,
        chain: &mut RedirectChain,
        force_offline: bool,
    ) -> CacheResult<PathBuf> {
        if force_offline || self.store.config().is_offline() {
            return self.line.offline_file(self.store, chain).await;
        }

        let mut attempt = chain.clone();
        match self.line.fetch_file(self.store, &mut attempt).await {
            Ok(path) => {
                *chain = attempt;
                Ok(path)
            }
            Err(e) if self.can_fall_back(&e).await => {
                warn!("Using cached copy of {} after error: {}", self.url, e);
                self.store.stats().record_stale_fallback();
                match self.line.offline_file(self.store, chain).await {
                    Ok(path) => Ok(path),
                    Err(fallback) => {
                        debug!("No cached copy of {}: {}", self.url, fallback);
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    pub(super) async fn resolve_last_modified(
        &self,
        chain: &mut RedirectChain,
        force_offline: bool,
    ) -> CacheResult<i64> {
        if force_offline || self.store.config().is_offline() {
            return self.line.offline_last_modified(self.store, chain).await;
        }

        let mut attempt = chain.clone();
        match self.line.fetch_last_modified(self.store, &mut attempt).await {
            Ok(millis) => {
                *chain = attempt;
                Ok(millis)
            }
            Err(e) if self.can_fall_back(&e).await => {
                warn!("Using cached headers of {} after error: {}", self.url, e);
                self.store.stats().record_stale_fallback();
                match self.line.offline_last_modified(self.store, chain).await {
                    Ok(millis) => Ok(millis),
                    Err(fallback) => {
                        debug!("No cached headers for {}: {}", self.url, fallback);
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Transient errors on a line with a completed earlier request
    async fn can_fall_back(&self, error: &CacheError) -> bool {
        if !error.is_transient() || self.store.config().is_update() {
            return false;
        }
        matches!(self.line.response_code().await, Ok(Some(code)) if code > 0)
    }
}
