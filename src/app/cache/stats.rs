//! Cache statistics and disk usage monitoring
//!
//! Runtime counters are lock-free atomics bumped on the lookup path;
//! disk usage is computed on demand by scanning the cache directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::warn;

use crate::constants::{files, headers};

/// Counters describing cache activity since the store was created
#[derive(Debug, Default)]
pub struct CacheStats {
    lookups: AtomicU64,
    network_requests: AtomicU64,
    fresh_hits: AtomicU64,
    not_modified: AtomicU64,
    downloads: AtomicU64,
    redirects: AtomicU64,
    stale_fallbacks: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_request(&self) {
        self.network_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fresh_hit(&self) {
        self.fresh_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_modified(&self) {
        self.not_modified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redirect(&self) {
        self.redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_fallback(&self) {
        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters into a snapshot without disk usage
    pub fn snapshot(&self, cache_root: PathBuf, lines_in_memory: usize) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            cache_root,
            lines_in_memory,
            lookups: self.lookups.load(Ordering::Relaxed),
            network_requests: self.network_requests.load(Ordering::Relaxed),
            fresh_hits: self.fresh_hits.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            redirects: self.redirects.load(Ordering::Relaxed),
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            disk: DiskUsage::default(),
        }
    }
}

/// On-disk usage of the cache directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    /// Content files
    pub content_files: usize,
    /// `.headers` files
    pub header_files: usize,
    /// Total bytes of content and header files
    pub total_bytes: u64,
}

/// Point-in-time view of cache activity and disk usage
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub cache_root: PathBuf,
    pub lines_in_memory: usize,
    pub lookups: u64,
    pub network_requests: u64,
    pub fresh_hits: u64,
    pub not_modified: u64,
    pub downloads: u64,
    pub redirects: u64,
    pub stale_fallbacks: u64,
    pub evictions: u64,
    pub disk: DiskUsage,
}

impl CacheStatsSnapshot {
    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.disk.total_bytes)
    }
}

/// Directory scanner for cache statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Scan the cache directory off the async runtime
    pub async fn scan_cache_directory(cache_root: &Path) -> DiskUsage {
        let cache_root = cache_root.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan_directory_sync(&cache_root))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to scan cache directory: {}", e);
                DiskUsage::default()
            })
    }

    /// Recursively scan a directory; orphaned temp files are skipped
    pub fn scan_directory_sync(dir: &Path) -> DiskUsage {
        let mut usage = DiskUsage::default();
        Self::scan_directory_recursive(dir, &mut usage);
        usage
    }

    fn scan_directory_recursive(dir: &Path, usage: &mut DiskUsage) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                Self::scan_directory_recursive(&path, usage);
            } else if file_type.is_file() && !Self::is_temp_file(&path) {
                if Self::is_header_file(&path) {
                    usage.header_files += 1;
                } else {
                    usage.content_files += 1;
                }
                if let Ok(metadata) = entry.metadata() {
                    usage.total_bytes += metadata.len();
                }
            }
        }
    }

    fn is_header_file(path: &Path) -> bool {
        path.to_string_lossy()
            .ends_with(headers::HEADER_FILE_SUFFIX)
    }

    fn is_temp_file(path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                name.starts_with(files::TEMP_FILE_PREFIX) && name.ends_with(files::TEMP_FILE_SUFFIX)
            })
            .unwrap_or(false)
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    #[test]
    fn test_counters_snapshot() {
        let stats = CacheStats::default();
        stats.record_lookup();
        stats.record_lookup();
        stats.record_network_request();
        stats.record_fresh_hit();
        stats.record_stale_fallback();

        let snapshot = stats.snapshot(PathBuf::from("/cache"), 3);
        assert_eq!(snapshot.lookups, 2);
        assert_eq!(snapshot.network_requests, 1);
        assert_eq!(snapshot.fresh_hits, 1);
        assert_eq!(snapshot.stale_fallbacks, 1);
        assert_eq!(snapshot.downloads, 0);
        assert_eq!(snapshot.lines_in_memory, 3);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024_u64.pow(4)), "1.00 TB");
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let usage = DirectoryScanner::scan_cache_directory(temp_dir.path()).await;
        assert_eq!(usage, DiskUsage::default());
    }

    #[tokio::test]
    async fn test_scan_splits_content_and_headers() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("https").join("repo.example.org");
        fs::create_dir_all(&subdir).await.unwrap();

        fs::write(subdir.join("a.jar"), b"0123456789").await.unwrap();
        fs::write(subdir.join("a.jar.headers"), b"HTTP_RESPONSE_CODE=200\n")
            .await
            .unwrap();
        fs::write(subdir.join("missing.jar.headers"), b"HTTP_RESPONSE_CODE=404\n")
            .await
            .unwrap();
        fs::write(subdir.join(".download-abc.tmp"), b"partial")
            .await
            .unwrap();

        let usage = DirectoryScanner::scan_cache_directory(temp_dir.path()).await;
        assert_eq!(usage.content_files, 1);
        assert_eq!(usage.header_files, 2);
        assert_eq!(usage.total_bytes, 10 + 23 + 23);
    }
}
