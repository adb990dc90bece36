//! Credential and proxy providers for repository access
//!
//! This module supplies per-URI basic-auth credentials and proxy selection,
//! consulted before every request so authentication is preemptive.
//!
//! # Examples
//!
//! ```rust
//! use transport_cache::auth::{Credentials, CredentialsProvider, StaticCredentials};
//! use url::Url;
//!
//! let provider = StaticCredentials::new()
//!     .with_server("https://repo.example.org/", Credentials::new("deploy", "secret"));
//!
//! let url = Url::parse("https://repo.example.org/p2/content.jar").unwrap();
//! assert!(provider.credentials_for(&url).is_some());
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    apply_preemptive_auth, get_auth_status, AuthStatus, Credentials, CredentialsProvider,
    NoCredentials, ProxySettings, StaticCredentials,
};
