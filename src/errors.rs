//! Error types for the transport cache
//!
//! The cache distinguishes outcomes that must always reach the caller
//! (resource absent, not authorized, redirect loop, broken configuration)
//! from transient transport failures, which are the only class allowed to
//! degrade to previously cached data. [`CacheError::is_transient`] encodes
//! that split.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`Transport`](crate::app::transport::Transport) backend
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error while reading a response body
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Header name or value rejected by the client
    #[error("Invalid request header: {name}")]
    InvalidHeader { name: String },

    /// Proxy URL rejected by the client
    #[error("Invalid proxy configuration: {reason}")]
    InvalidProxy { reason: String },

    /// Client configuration the backend cannot use
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for request")]
    MaxRetriesExceeded { max_retries: u32 },
}

/// Cache errors, following the cache's failure taxonomy
#[derive(Error, Debug)]
pub enum CacheError {
    /// Resource is known to be absent (404/410)
    #[error("Resource not found (HTTP {status}): {url}")]
    NotFound { url: String, status: u16 },

    /// Server or proxy refused the supplied credentials (401/407)
    #[error("Authentication failed (HTTP {status}) for {url}")]
    AuthenticationFailed { url: String, status: u16 },

    /// Redirect points back to a URI already visited in this lookup
    #[error("Redirect loop detected: {url} redirects to {location}")]
    RedirectLoop { url: String, location: String },

    /// Redirect chain exceeded the hop limit
    #[error("Too many redirects (more than {max}) starting at {url}")]
    TooManyRedirects { url: String, max: usize },

    /// Redirect response without a usable Location header
    #[error("HTTP {status} redirect without Location header from {url}")]
    MissingLocation { url: String, status: u16 },

    /// Server answered with an error status that is not otherwise classified
    #[error("Server error: HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Offline lookup of a URI that was never fetched
    #[error("Not available locally (offline): {url}")]
    Unavailable { url: String },

    /// Transport-level failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Filesystem failure on a cache file
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache directory not found or inaccessible
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// URI cannot be mapped onto the cache
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl CacheError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure may be masked by previously cached data
    ///
    /// Not-found, authentication, redirect-loop, offline-miss and
    /// configuration failures are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CacheError::Transport(_)
                | CacheError::Io { .. }
                | CacheError::HttpStatus { .. }
                | CacheError::MissingLocation { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            CacheError::NotFound { .. } => "not-found",
            CacheError::AuthenticationFailed { .. } => "authentication",
            CacheError::RedirectLoop { .. } | CacheError::TooManyRedirects { .. } => "redirect",
            CacheError::Unavailable { .. } => "offline",
            CacheError::DirectoryNotAccessible { .. } | CacheError::InvalidUrl { .. } => {
                "configuration"
            }
            CacheError::Transport(_)
            | CacheError::Io { .. }
            | CacheError::HttpStatus { .. }
            | CacheError::MissingLocation { .. } => "transient",
        }
    }
}

/// Credential and proxy errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Credential variables missing
    #[error("Missing credentials. Set {username_var} and {password_var}")]
    MissingCredentials {
        username_var: &'static str,
        password_var: &'static str,
    },

    /// Proxy URL could not be parsed
    #[error("Invalid proxy URL {url}: {reason}")]
    InvalidProxyUrl { url: String, reason: String },

    /// Server prefix could not be parsed
    #[error("Invalid server URL {url}: {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format in {path}: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDirectory,

    /// I/O error reading or writing a config file
    #[error("Configuration file I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Credential error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Cache(e) => e.is_transient(),
            AppError::Transport(TransportError::InvalidUrl { .. })
            | AppError::Transport(TransportError::InvalidHeader { .. })
            | AppError::Transport(TransportError::InvalidProxy { .. })
            | AppError::Transport(TransportError::InvalidConfig { .. }) => false,
            AppError::Transport(_) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Cache(e) => e.category(),
            AppError::Transport(_) => "transport",
            AppError::Auth(_) => "authentication",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Transport result type alias
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
