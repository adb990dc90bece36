//! Application constants for the transport cache
//!
//! This module centralizes the constants used throughout the crate,
//! organized by functional domain. Header-file keys in [`headers`] are part
//! of the on-disk format and must not change between releases.

use std::time::Duration;

/// Environment variable names for credentials and proxy selection
pub mod env {
    /// Username used for preemptive basic authentication
    pub const USERNAME: &str = "TRANSPORT_CACHE_USERNAME";

    /// Password used for preemptive basic authentication
    pub const PASSWORD: &str = "TRANSPORT_CACHE_PASSWORD";

    /// URL prefix the credentials apply to (all servers when unset)
    pub const SERVER: &str = "TRANSPORT_CACHE_SERVER";

    /// Proxy URL applied to outgoing requests
    pub const PROXY: &str = "TRANSPORT_CACHE_PROXY";

    /// Proxy username
    pub const PROXY_USERNAME: &str = "TRANSPORT_CACHE_PROXY_USERNAME";

    /// Proxy password
    pub const PROXY_PASSWORD: &str = "TRANSPORT_CACHE_PROXY_PASSWORD";

    /// Comma separated hosts that bypass the proxy (`*.example.com` allowed)
    pub const NON_PROXY_HOSTS: &str = "TRANSPORT_CACHE_NON_PROXY_HOSTS";
}

/// Keys and file naming of the persisted header file
pub mod headers {
    /// Suffix appended to the content file name to get the header file
    pub const HEADER_FILE_SUFFIX: &str = ".headers";

    /// Persisted HTTP response code
    pub const RESPONSE_CODE: &str = "HTTP_RESPONSE_CODE";

    /// Epoch millis of the last completed request for the line
    pub const LAST_UPDATED: &str = "FILE-LAST_UPDATED";

    /// Persisted HTTP status line
    pub const STATUS_LINE: &str = "HTTP_STATUS_LINE";

    /// Header names that are never written to disk
    pub const NEVER_PERSISTED: &[&str] = &[
        "authorization",
        "proxy-authorization",
        "www-authenticate",
        "proxy-authenticate",
        "content-encoding",
    ];

    /// Prefix of vendor headers that are never written to disk
    pub const VENDOR_PREFIX: &str = "x-";
}

/// Cache defaults
pub mod cache {
    use super::Duration;

    /// Cache lines younger than this are served without revalidation
    pub const DEFAULT_MIN_CACHE_PERIOD: Duration = Duration::from_secs(60 * 60);

    /// Soft cap of cache lines held in memory
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;

    /// Leaf name used when a URI maps onto a directory-like path
    pub const INDEX_LEAF_NAME: &str = ".idx";

    /// Directory name below the OS cache directory
    pub const CACHE_DIR_NAME: &str = "transport-cache";
}

/// File handling constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Prefix of temporary files created next to content files
    pub const TEMP_FILE_PREFIX: &str = ".download-";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("transport-cache/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Maximum number of redirects followed for one lookup
    pub const MAX_REDIRECTS: usize = 10;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for repository requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;

    /// Maximum retry attempts for throttled or failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "transport-cache.toml";

    /// Directory below the user config directory
    pub const CONFIG_DIR_NAME: &str = "transport-cache";

    /// File name inside the user config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

pub use cache::{DEFAULT_MAX_ENTRIES, DEFAULT_MIN_CACHE_PERIOD};
pub use http::{MAX_REDIRECTS, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
