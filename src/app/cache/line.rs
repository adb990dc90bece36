//! Cache line: persisted state and conditional requests for one URI
//!
//! A line owns a content file and its `.headers` sibling. All
//! read-modify-write sequences (freshness check, conditional request,
//! header and content update) run under the line's async mutex, which is
//! held across the network call so concurrent lookups of the same URI
//! wait for the first one and then see its result.
//!
//! While a redirect target is resolved the source line stays locked.
//! Cycles within one lookup are caught by [`RedirectChain`]; two lookups
//! resolving `A -> B` and `B -> A` concurrently can still block each other.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};
use url::Url;

use super::freshness::Freshness;
use super::headers::CachedHeaders;
use super::path::PathGenerator;
use super::redirect::RedirectChain;
use super::store::CacheStore;
use crate::app::transport::{TransportRequest, TransportResponse};
use crate::auth::apply_preemptive_auth;
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

#[derive(Debug, Default)]
struct LineState {
    loaded: bool,
    headers: Option<CachedHeaders>,
}

/// Cached state of one normalized URI
#[derive(Debug)]
pub struct CacheLine {
    url: Url,
    content_file: PathBuf,
    header_file: PathBuf,
    state: Mutex<LineState>,
}

impl CacheLine {
    pub fn new(url: Url, content_file: PathBuf) -> Self {
        let header_file = PathGenerator::header_path(&content_file);
        Self {
            url,
            content_file,
            header_file,
            state: Mutex::new(LineState::default()),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn content_file(&self) -> &Path {
        &self.content_file
    }

    pub fn header_file(&self) -> &Path {
        &self.header_file
    }

    /// Lock the line and load the header file on first use
    async fn lock(&self) -> CacheResult<MutexGuard<'_, LineState>> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            state.headers = CachedHeaders::load(&self.header_file).await?;
            state.loaded = true;
        }
        Ok(state)
    }

    /// Persisted headers, if any request has completed for this line
    pub async fn persisted_headers(&self) -> CacheResult<Option<CachedHeaders>> {
        Ok(self.lock().await?.headers.clone())
    }

    /// Persisted response code, if any request has completed
    pub async fn response_code(&self) -> CacheResult<Option<u16>> {
        Ok(self
            .lock()
            .await?
            .headers
            .as_ref()
            .and_then(|headers| headers.response_code))
    }

    pub async fn has_content(&self) -> bool {
        content_exists(&self.content_file).await
    }

    /// Resolve the content file, revalidating or downloading as needed
    pub async fn fetch_file(
        &self,
        store: &CacheStore,
        chain: &mut RedirectChain,
    ) -> CacheResult<PathBuf> {
        let mut state = self.lock().await?;
        let has_content = content_exists(&self.content_file).await;

        if has_content {
            let freshness = self.freshness(store, state.headers.as_ref());
            if !freshness.must_revalidate() {
                debug!("Serving {} from cache ({})", self.url, freshness.reason());
                store.stats().record_fresh_hit();
                return Ok(self.content_file.clone());
            }
            debug!("Revalidating {} ({})", self.url, freshness.reason());
        }

        let validators = state.headers.as_ref().filter(|_| has_content);
        let request = self.build_request(store, validators);
        store.stats().record_network_request();
        let response = store.transport().get(request).await?;
        let status = response.status;

        match status {
            304 if has_content => {
                self.refresh_headers(&mut state, &response.header_map()).await?;
                store.stats().record_not_modified();
                debug!("{} not modified", self.url);
                Ok(self.content_file.clone())
            }
            401 | 407 => Err(CacheError::AuthenticationFailed {
                url: self.url.to_string(),
                status,
            }),
            301 | 302 => {
                let target = self.record_redirect(&mut state, response, chain).await?;
                store.stats().record_redirect();

                let resolved = store.redirect_file(target, chain, false).await?;
                copy_atomic(&resolved, &self.content_file).await?;
                Ok(self.content_file.clone())
            }
            404 | 410 => {
                self.record_not_found(&mut state, response).await?;
                Err(CacheError::NotFound {
                    url: self.url.to_string(),
                    status,
                })
            }
            200..=299 => {
                self.download(&mut state, store, response).await?;
                store.stats().record_download();
                Ok(self.content_file.clone())
            }
            400..=599 => {
                self.record_failure(&mut state, response).await?;
                Err(CacheError::HttpStatus {
                    url: self.url.to_string(),
                    status,
                })
            }
            _ => Err(CacheError::HttpStatus {
                url: self.url.to_string(),
                status,
            }),
        }
    }

    /// Resolve the last-modified time (epoch millis, -1 if unknown) via HEAD
    pub async fn fetch_last_modified(
        &self,
        store: &CacheStore,
        chain: &mut RedirectChain,
    ) -> CacheResult<i64> {
        let mut state = self.lock().await?;

        if let Some(headers) = state.headers.as_ref() {
            let completed_ok = matches!(headers.response_code, Some(200..=299));
            if completed_ok && !self.freshness(store, Some(headers)).must_revalidate() {
                store.stats().record_fresh_hit();
                return Ok(headers.last_modified_millis());
            }
        }

        let request = self.build_request(store, state.headers.as_ref());
        store.stats().record_network_request();
        let response = store.transport().head(request).await?;
        let status = response.status;

        match status {
            304 if state.headers.is_some() => {
                self.refresh_headers(&mut state, &response.header_map()).await?;
                store.stats().record_not_modified();
                Ok(state
                    .headers
                    .as_ref()
                    .map(CachedHeaders::last_modified_millis)
                    .unwrap_or(-1))
            }
            401 | 407 => Err(CacheError::AuthenticationFailed {
                url: self.url.to_string(),
                status,
            }),
            301 | 302 => {
                let target = self.record_redirect(&mut state, response, chain).await?;
                store.stats().record_redirect();
                store.redirect_last_modified(target, chain, false).await
            }
            404 | 410 => {
                self.record_not_found(&mut state, response).await?;
                Err(CacheError::NotFound {
                    url: self.url.to_string(),
                    status,
                })
            }
            200..=299 => {
                let headers = CachedHeaders::from_response(
                    status,
                    &response.status_line,
                    &response.header_map(),
                    Utc::now().timestamp_millis(),
                );

                if self.content_outdated_by(state.headers.as_ref(), &headers)
                    && content_exists(&self.content_file).await
                {
                    debug!("{} changed on server, dropping cached content", self.url);
                    remove_if_exists(&self.content_file).await?;
                }

                headers.save(&self.header_file).await?;
                let last_modified = headers.last_modified_millis();
                state.headers = Some(headers);
                Ok(last_modified)
            }
            400..=599 => {
                self.record_failure(&mut state, response).await?;
                Err(CacheError::HttpStatus {
                    url: self.url.to_string(),
                    status,
                })
            }
            _ => Err(CacheError::HttpStatus {
                url: self.url.to_string(),
                status,
            }),
        }
    }

    /// Resolve the content file from persisted state only
    pub async fn offline_file(
        &self,
        store: &CacheStore,
        chain: &mut RedirectChain,
    ) -> CacheResult<PathBuf> {
        let state = self.lock().await?;
        let has_content = content_exists(&self.content_file).await;

        match self.offline_redirect_target(state.headers.as_ref(), has_content)? {
            Some(target) => {
                chain.follow(&self.url, &target)?;
                store.redirect_file(target, chain, true).await
            }
            None if has_content => Ok(self.content_file.clone()),
            None => Err(CacheError::Unavailable {
                url: self.url.to_string(),
            }),
        }
    }

    /// Resolve the last-modified time from persisted state only
    pub async fn offline_last_modified(
        &self,
        store: &CacheStore,
        chain: &mut RedirectChain,
    ) -> CacheResult<i64> {
        let state = self.lock().await?;

        match self.offline_redirect_target(state.headers.as_ref(), false)? {
            Some(target) => {
                chain.follow(&self.url, &target)?;
                store.redirect_last_modified(target, chain, true).await
            }
            None => Ok(state
                .headers
                .as_ref()
                .map(CachedHeaders::last_modified_millis)
                .unwrap_or(-1)),
        }
    }

    /// Classify persisted state for offline use; `Some` is a redirect to follow
    fn offline_redirect_target(
        &self,
        headers: Option<&CachedHeaders>,
        has_content: bool,
    ) -> CacheResult<Option<Url>> {
        let Some(headers) = headers.filter(|h| h.response_code.is_some()) else {
            return Err(CacheError::Unavailable {
                url: self.url.to_string(),
            });
        };

        match headers.response_code {
            Some(status @ (404 | 410)) => Err(CacheError::NotFound {
                url: self.url.to_string(),
                status,
            }),
            Some(status @ (401 | 407)) => Err(CacheError::AuthenticationFailed {
                url: self.url.to_string(),
                status,
            }),
            Some(status @ (301 | 302)) if !has_content => {
                let location = headers.location().ok_or_else(|| CacheError::MissingLocation {
                    url: self.url.to_string(),
                    status,
                })?;
                Ok(Some(PathGenerator::resolve_location(&self.url, location)?))
            }
            _ => Ok(None),
        }
    }

    fn freshness(&self, store: &CacheStore, headers: Option<&CachedHeaders>) -> Freshness {
        let update = store.config().is_update();
        match headers {
            Some(headers) => store.policy().evaluate(headers, update, Utc::now()),
            None => Freshness::Revalidate("no persisted headers"),
        }
    }

    fn build_request(
        &self,
        store: &CacheStore,
        validators: Option<&CachedHeaders>,
    ) -> TransportRequest {
        let mut request = TransportRequest::new(self.url.clone());
        apply_preemptive_auth(&mut request, store.credentials());

        if let Some(headers) = validators {
            if let Some(etag) = headers.etag() {
                request.set_header("If-None-Match", etag);
            }
            if let Some(last_modified) = headers.last_modified() {
                request.set_header("If-Modified-Since", last_modified);
            }
        }

        request.set_header("Accept-Encoding", "gzip");
        request
    }

    /// Merge a 304's headers over the persisted ones and restart the clock
    async fn refresh_headers(
        &self,
        state: &mut LineState,
        response_headers: &BTreeMap<String, String>,
    ) -> CacheResult<()> {
        let mut headers = state.headers.clone().unwrap_or_default();
        if headers.is_failure() {
            // validated content outlives the failed request recorded before
            headers.response_code = Some(200);
            headers.status_line = None;
        }
        headers.merge(response_headers);
        headers.last_updated = Some(Utc::now().timestamp_millis());
        headers.save(&self.header_file).await?;
        state.headers = Some(headers);
        Ok(())
    }

    /// Persist a 301/302 and return its resolved, loop-checked target
    async fn record_redirect(
        &self,
        state: &mut LineState,
        response: TransportResponse,
        chain: &mut RedirectChain,
    ) -> CacheResult<Url> {
        let status = response.status;
        let location = response
            .header("location")
            .map(str::to_string)
            .ok_or_else(|| CacheError::MissingLocation {
                url: self.url.to_string(),
                status,
            })?;

        let headers = CachedHeaders::from_response(
            status,
            &response.status_line,
            &response.header_map(),
            Utc::now().timestamp_millis(),
        );
        drop(response.into_body());

        headers.save(&self.header_file).await?;
        state.headers = Some(headers);

        let target = PathGenerator::resolve_location(&self.url, &location)?;
        chain.follow(&self.url, &target)?;
        info!("{} redirects ({}) to {}", self.url, status, target);
        Ok(target)
    }

    /// Persist an unexpected error status over the existing headers
    async fn record_failure(
        &self,
        state: &mut LineState,
        response: TransportResponse,
    ) -> CacheResult<()> {
        let status = response.status;
        let mut headers = state.headers.clone().unwrap_or_default();
        headers.record_failure(
            status,
            &response.status_line,
            &response.header_map(),
            Utc::now().timestamp_millis(),
        );
        drop(response.into_body());

        headers.save(&self.header_file).await?;
        state.headers = Some(headers);
        debug!("Recorded HTTP {} for {}", status, self.url);
        Ok(())
    }

    /// Persist a 404/410 and drop any content left from earlier fetches
    async fn record_not_found(
        &self,
        state: &mut LineState,
        response: TransportResponse,
    ) -> CacheResult<()> {
        let headers = CachedHeaders::from_response(
            response.status,
            &response.status_line,
            &response.header_map(),
            Utc::now().timestamp_millis(),
        );
        drop(response.into_body());

        headers.save(&self.header_file).await?;
        state.headers = Some(headers);
        remove_if_exists(&self.content_file).await
    }

    /// Stream a 2xx body into place, then persist its headers
    async fn download(
        &self,
        state: &mut LineState,
        store: &CacheStore,
        response: TransportResponse,
    ) -> CacheResult<()> {
        let headers = CachedHeaders::from_response(
            response.status,
            &response.status_line,
            &response.header_map(),
            Utc::now().timestamp_millis(),
        );
        let content_length = response
            .header("content-length")
            .and_then(|value| value.trim().parse::<u64>().ok());

        let dir = self
            .content_file
            .parent()
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: self.content_file.clone(),
            })?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| CacheError::io(dir, e))?;

        let temp = tempfile::Builder::new()
            .prefix(files::TEMP_FILE_PREFIX)
            .suffix(files::TEMP_FILE_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| CacheError::io(dir, e))?;
        let (file, temp_path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let progress = store
            .config()
            .is_interactive()
            .then(|| self.progress_bar(content_length));
        info!("Downloading {}", self.url);

        let mut body = response.into_body();
        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| CacheError::io(self.content_file.clone(), e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CacheError::io(temp_path.to_path_buf(), e))?;
            written += chunk.len() as u64;
            if let Some(ref bar) = progress {
                bar.set_position(written);
            }
        }
        file.flush()
            .await
            .map_err(|e| CacheError::io(temp_path.to_path_buf(), e))?;
        drop(file);

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        temp_path.persist(&self.content_file).map_err(|e| {
            error!(
                "Failed to move download into {}: {}",
                self.content_file.display(),
                e.error
            );
            CacheError::io(self.content_file.clone(), e.error)
        })?;

        headers.save(&self.header_file).await?;
        state.headers = Some(headers);
        debug!("Stored {} bytes for {}", written, self.url);
        Ok(())
    }

    fn progress_bar(&self, content_length: Option<u64>) -> ProgressBar {
        let name = self
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(self.url.as_str())
            .to_string();

        let bar = match content_length {
            Some(length) => {
                let bar = ProgressBar::new(length);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}")
                {
                    bar.set_style(style.tick_strings(&["◐", "◓", "◑", "◒"]));
                }
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        bar.set_message(name);
        bar
    }

    /// Whether new validators show the cached content is no longer current
    fn content_outdated_by(&self, old: Option<&CachedHeaders>, new: &CachedHeaders) -> bool {
        let Some(old) = old else {
            return false;
        };
        (old.etag().is_some() && old.etag() != new.etag())
            || (old.last_modified().is_some() && old.last_modified() != new.last_modified())
    }
}

async fn content_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

async fn remove_if_exists(path: &Path) -> CacheResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

/// Copy `source` over `target` through a temp file next to `target`
async fn copy_atomic(source: &Path, target: &Path) -> CacheResult<()> {
    if source == target {
        return Ok(());
    }

    let dir = target
        .parent()
        .ok_or_else(|| CacheError::DirectoryNotAccessible {
            path: target.to_path_buf(),
        })?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CacheError::io(dir, e))?;

    let temp_path = tempfile::Builder::new()
        .prefix(files::TEMP_FILE_PREFIX)
        .suffix(files::TEMP_FILE_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| CacheError::io(dir, e))?
        .into_temp_path();

    tokio::fs::copy(source, &temp_path)
        .await
        .map_err(|e| CacheError::io(source, e))?;
    temp_path
        .persist(target)
        .map_err(|e| CacheError::io(target, e.error))?;
    Ok(())
}
