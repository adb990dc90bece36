//! Command handlers for the transport cache CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! with the cache store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::app::{CacheConfig, CacheStore, CachedHeaders};
use crate::auth::{get_auth_status, CredentialsProvider, StaticCredentials};
use crate::cli::{
    AuthAction, AuthArgs, CacheAction, CacheArgs, FetchArgs, GlobalArgs, InspectArgs,
    LastModifiedArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Apply command-line overrides on top of the file configuration
pub fn apply_overrides(mut config: CacheConfig, global: &GlobalArgs) -> CacheConfig {
    if let Some(ref dir) = global.cache_dir {
        config.cache_root = Some(dir.clone());
    }
    if global.offline {
        config.offline = true;
    }
    if global.update {
        config.update = true;
    }
    if let Some(minutes) = global.min_cache_period {
        config.min_cache_period = std::time::Duration::from_secs(minutes * 60);
    }
    if let Some(max_entries) = global.max_entries {
        config.max_entries = max_entries;
    }
    config.interactive = !global.quiet && atty::is(atty::Stream::Stderr);
    config
}

/// Build the cache store for this invocation
///
/// Credentials and proxy settings come from the environment (after `.env`
/// loading in the binary).
pub async fn open_store(global: &GlobalArgs, app_config: &AppConfig) -> Result<CacheStore> {
    let (cache_config, client_config) = app_config.to_runtime_config();
    let cache_config = apply_overrides(cache_config, global);

    if cache_config.max_entries == 0 {
        return Err(AppError::generic("--max-entries must be greater than 0"));
    }

    let credentials: Arc<dyn CredentialsProvider> = Arc::new(StaticCredentials::from_env()?);
    let transport = client_config
        .backend
        .build(&client_config, Arc::clone(&credentials))?;

    debug!("Opening cache with {:?}", cache_config);
    Ok(CacheStore::new(cache_config, transport, credentials).await?)
}

/// Handle the fetch command
///
/// All URLs are resolved concurrently; every outcome is reported and the
/// first failure is returned.
pub async fn handle_fetch(args: FetchArgs, store: &CacheStore) -> Result<()> {
    info!("Resolving {} URL(s)", args.urls.len());

    let results = join_all(args.urls.iter().map(|url| async move {
        let entry = store.get_cache_entry(url).await?;
        entry.get_cache_file().await
    }))
    .await;

    let mut first_error = None;
    for (url, result) in args.urls.iter().zip(results) {
        match result {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                warn!("Failed to resolve {} ({})", url, e.category());
                eprintln!("❌ {}: {}", url, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Handle the last-modified command
pub async fn handle_last_modified(args: LastModifiedArgs, store: &CacheStore) -> Result<()> {
    let entry = store.get_cache_entry(&args.url).await?;
    let millis = entry.get_last_modified().await?;

    println!("{}", millis);
    if let Some(date) = format_millis(millis) {
        info!("{} last modified {}", entry.url(), date);
    }
    Ok(())
}

/// Handle the inspect command
pub async fn handle_inspect(args: InspectArgs, store: &CacheStore) -> Result<()> {
    let headers = store.inspect(&args.url).await?;

    if args.json {
        let value = inspect_json(&args.url, headers.as_ref());
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| AppError::generic(format!("Failed to encode JSON: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    let Some(headers) = headers else {
        println!("ℹ️  Not cached: {}", args.url);
        return Ok(());
    };

    println!("📄 {}", args.url);
    println!(
        "Status: {}",
        headers.status_line.as_deref().unwrap_or("(unknown)")
    );
    if let Some(updated) = headers.last_updated.and_then(format_millis) {
        println!("Last updated: {}", updated);
    }
    if headers.last_modified().is_some() {
        println!("Last modified: {}", headers.last_modified_millis());
    }
    for (name, value) in headers.headers() {
        println!("  {}: {}", name, value);
    }

    Ok(())
}

fn inspect_json(url: &str, headers: Option<&CachedHeaders>) -> serde_json::Value {
    match headers {
        None => serde_json::json!({ "url": url, "cached": false }),
        Some(headers) => serde_json::json!({
            "url": url,
            "cached": true,
            "response_code": headers.response_code,
            "status_line": headers.status_line,
            "last_updated": headers.last_updated,
            "headers": headers.headers(),
        }),
    }
}

/// Handle cache commands
pub async fn handle_cache(args: CacheArgs, store: &CacheStore) -> Result<()> {
    match args.action {
        CacheAction::Info { json } => handle_cache_info(store, json).await,
    }
}

async fn handle_cache_info(store: &CacheStore, json: bool) -> Result<()> {
    let stats = store.statistics().await;

    if json {
        let text = serde_json::to_string_pretty(&stats)
            .map_err(|e| AppError::generic(format!("Failed to encode JSON: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("💾 Cache Information");
    println!("===================");
    println!("Location: {}", stats.cache_root.display());
    println!("Cached resources: {}", stats.disk.content_files);
    println!("Header files: {}", stats.disk.header_files);
    println!("Cache size: {}", stats.format_cache_size());

    Ok(())
}

/// Handle authentication commands
pub async fn handle_auth(args: AuthArgs) -> Result<()> {
    match args.action {
        AuthAction::Status => {
            let status = get_auth_status();

            println!("🔐 Authentication Status");
            println!("========================");
            println!("{}", status.status_message());
            println!(
                "Username: {}",
                if status.username_set { "set" } else { "not set" }
            );
            println!(
                "Password: {}",
                if status.password_set { "set" } else { "not set" }
            );
            if let Some(ref proxy) = status.proxy {
                println!("Proxy: {}", proxy);
            }
            if status.dotenv_file_exists {
                println!("Loaded variables from .env");
            }
        }
    }

    Ok(())
}

fn format_millis(millis: i64) -> Option<String> {
    if millis < 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|date| date.to_rfc2822())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_overrides_take_precedence() {
        let global = GlobalArgs {
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            offline: true,
            min_cache_period: Some(5),
            max_entries: Some(10),
            quiet: true,
            ..Default::default()
        };

        let config = apply_overrides(CacheConfig::default(), &global);
        assert_eq!(config.cache_root, Some(PathBuf::from("/tmp/cache")));
        assert!(config.is_offline());
        assert!(!config.is_update());
        assert!(!config.is_interactive());
        assert_eq!(config.min_cache_period, Duration::from_secs(300));
        assert_eq!(config.max_entries, 10);
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let file_config = CacheConfig::default()
            .with_update(true)
            .with_max_entries(42);
        let global = GlobalArgs {
            quiet: true,
            ..Default::default()
        };

        let config = apply_overrides(file_config, &global);
        assert!(config.is_update());
        assert_eq!(config.max_entries, 42);
    }

    #[test]
    fn test_inspect_json_shape() {
        let value = inspect_json("https://repo.example.org/a", None);
        assert_eq!(value["cached"], false);

        let headers = CachedHeaders::parse("HTTP_RESPONSE_CODE=200\netag=\"x\"\n");
        let value = inspect_json("https://repo.example.org/a", Some(&headers));
        assert_eq!(value["response_code"], 200);
        assert_eq!(value["headers"]["etag"], "\"x\"");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(-1), None);
        assert_eq!(
            format_millis(1_445_412_480_000).as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 +0000")
        );
    }
}
