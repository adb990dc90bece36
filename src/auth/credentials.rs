//! Credential and proxy selection for repository requests
//!
//! Credentials are resolved per URI and sent preemptively, so the first
//! request to a protected repository already carries `Authorization`.
//! Proxy selection is also per URI and honours a non-proxy host list.

use std::env;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use crate::app::transport::TransportRequest;
use crate::constants::env as env_constants;
use crate::errors::{AuthError, AuthResult};

/// Username and password for basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of a basic `Authorization` / `Proxy-Authorization` header
    pub fn basic_authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {}", token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Proxy server selection
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Proxy server URL
    pub url: Url,
    /// Proxy credentials, sent as `Proxy-Authorization`
    pub credentials: Option<Credentials>,
    /// Hosts that are contacted directly; `*.example.com` matches subdomains
    pub non_proxy_hosts: Vec<String>,
}

impl ProxySettings {
    /// Create proxy settings without credentials or exclusions
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            non_proxy_hosts: Vec::new(),
        }
    }

    /// Attach proxy credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Add a host that bypasses the proxy
    pub fn with_non_proxy_host(mut self, host: impl Into<String>) -> Self {
        self.non_proxy_hosts.push(host.into());
        self
    }

    /// Whether requests to `url` skip this proxy
    pub fn bypasses(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        let host = host.to_ascii_lowercase();

        self.non_proxy_hosts.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_lowercase();
            match pattern.strip_prefix("*.") {
                Some(suffix) => host == suffix || host.ends_with(&format!(".{}", suffix)),
                None => host == pattern,
            }
        })
    }
}

/// Supplies credentials and proxy selection per request URI
pub trait CredentialsProvider: Send + Sync {
    /// Credentials for the server hosting `url`
    fn credentials_for(&self, url: &Url) -> Option<Credentials>;

    /// Proxy to use for `url`, if any
    fn proxy_for(&self, url: &Url) -> Option<ProxySettings>;
}

/// Provider that never supplies credentials or a proxy
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialsProvider for NoCredentials {
    fn credentials_for(&self, _url: &Url) -> Option<Credentials> {
        None
    }

    fn proxy_for(&self, _url: &Url) -> Option<ProxySettings> {
        None
    }
}

/// Fixed credential table keyed by URL prefix, plus an optional proxy
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    servers: Vec<(String, Credentials)>,
    proxy: Option<ProxySettings>,
}

impl StaticCredentials {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register credentials for every URL starting with `prefix`
    pub fn with_server(mut self, prefix: impl Into<String>, credentials: Credentials) -> Self {
        self.servers.push((prefix.into(), credentials));
        self
    }

    /// Route requests through a proxy
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Build the table from `TRANSPORT_CACHE_*` environment variables
    ///
    /// Missing variables simply leave the corresponding entry out; only
    /// malformed URLs are errors.
    pub fn from_env() -> AuthResult<Self> {
        let mut table = Self::new();

        if let (Ok(username), Ok(password)) = (
            env::var(env_constants::USERNAME),
            env::var(env_constants::PASSWORD),
        ) {
            let prefix = match env::var(env_constants::SERVER) {
                Ok(server) => {
                    Url::parse(&server).map_err(|e| AuthError::InvalidServerUrl {
                        url: server.clone(),
                        reason: e.to_string(),
                    })?;
                    server
                }
                Err(_) => String::new(),
            };
            table = table.with_server(prefix, Credentials::new(username, password));
        }

        if let Ok(proxy_url) = env::var(env_constants::PROXY) {
            let url = Url::parse(&proxy_url).map_err(|e| AuthError::InvalidProxyUrl {
                url: proxy_url.clone(),
                reason: e.to_string(),
            })?;
            let mut proxy = ProxySettings::new(url);

            if let (Ok(username), Ok(password)) = (
                env::var(env_constants::PROXY_USERNAME),
                env::var(env_constants::PROXY_PASSWORD),
            ) {
                proxy = proxy.with_credentials(Credentials::new(username, password));
            }

            if let Ok(hosts) = env::var(env_constants::NON_PROXY_HOSTS) {
                for host in hosts.split(',').map(str::trim).filter(|h| !h.is_empty()) {
                    proxy = proxy.with_non_proxy_host(host);
                }
            }

            table = table.with_proxy(proxy);
        }

        Ok(table)
    }
}

impl CredentialsProvider for StaticCredentials {
    fn credentials_for(&self, url: &Url) -> Option<Credentials> {
        let target = url.as_str();
        self.servers
            .iter()
            .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, credentials)| credentials.clone())
    }

    fn proxy_for(&self, url: &Url) -> Option<ProxySettings> {
        self.proxy
            .as_ref()
            .filter(|proxy| !proxy.bypasses(url))
            .cloned()
    }
}

/// Set `Authorization` and `Proxy-Authorization` before the first attempt
pub fn apply_preemptive_auth(request: &mut TransportRequest, provider: &dyn CredentialsProvider) {
    let url = request.url().clone();

    if let Some(credentials) = provider.credentials_for(&url) {
        request.set_header("Authorization", credentials.basic_authorization());
    }

    if let Some(credentials) = provider.proxy_for(&url).and_then(|proxy| proxy.credentials) {
        request.set_header("Proxy-Authorization", credentials.basic_authorization());
    }
}

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the username variable is set
    pub username_set: bool,
    /// Whether the password variable is set
    pub password_set: bool,
    /// Server prefix the credentials are restricted to
    pub server: Option<String>,
    /// Configured proxy URL
    pub proxy: Option<String>,
    /// Whether a .env file exists in the current directory
    pub dotenv_file_exists: bool,
}

impl AuthStatus {
    /// Check if both credentials are available in environment
    pub fn has_credentials(&self) -> bool {
        self.username_set && self.password_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.has_credentials(), &self.server) {
            (false, _) => "No repository credentials configured".to_string(),
            (true, None) => "Credentials configured for all servers".to_string(),
            (true, Some(server)) => format!("Credentials configured for {}", server),
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        username_set: env::var(env_constants::USERNAME).is_ok(),
        password_set: env::var(env_constants::PASSWORD).is_ok(),
        server: env::var(env_constants::SERVER).ok(),
        proxy: env::var(env_constants::PROXY).ok(),
        dotenv_file_exists: std::path::Path::new(".env").exists(),
    }
}
