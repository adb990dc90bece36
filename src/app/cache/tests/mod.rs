//! Scenario tests for the cache store
//!
//! A scripted transport stands in for the network: replies are queued per
//! method and URL, and every request is recorded so tests can assert on
//! what actually went over the wire.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::app::cache::{CacheConfig, CacheStore, PathGenerator};
use crate::app::transport::{Transport, TransportRequest, TransportResponse};
use crate::auth::{Credentials, CredentialsProvider, NoCredentials, StaticCredentials};
use crate::errors::{CacheError, TransportError, TransportResult};

const BASE: &str = "https://repo.example.org";

fn uri(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn http_date(date: chrono::DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

enum Reply {
    Response {
        status: u16,
        headers: Vec<(String, String)>,
        body: Bytes,
    },
    Fail,
}

impl Reply {
    fn status(status: u16) -> Self {
        Reply::Response {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    fn ok(body: &'static str) -> Self {
        Reply::Response {
            status: 200,
            headers: Vec::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn header(mut self, name: &str, value: &str) -> Self {
        if let Reply::Response { ref mut headers, .. } = self {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    request: TransportRequest,
}

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<Recorded>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency: Some(latency),
            ..Default::default()
        })
    }

    fn reply(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .entry(format!("{} {}", method, uri(path)))
            .or_default()
            .push_back(reply);
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    async fn respond(
        &self,
        method: &'static str,
        request: TransportRequest,
    ) -> TransportResult<TransportResponse> {
        let key = format!("{} {}", method, request.url());
        self.requests.lock().push(Recorded { method, request });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = self
            .replies
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Response {
                status,
                headers,
                body,
            }) => {
                let mut response = TransportResponse::new(status);
                for (name, value) in headers {
                    response = response.with_header(name, value);
                }
                Ok(response.with_body(body))
            }
            Some(Reply::Fail) | None => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no route for {}", key),
            ))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        self.respond("GET", request).await
    }

    async fn head(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        self.respond("HEAD", request).await
    }
}

fn config(dir: &TempDir) -> CacheConfig {
    CacheConfig::with_cache_root(dir.path().to_path_buf())
}

async fn store(
    config: CacheConfig,
    transport: &Arc<ScriptedTransport>,
    credentials: Arc<dyn CredentialsProvider>,
) -> CacheStore {
    CacheStore::new(config, transport.clone(), credentials)
        .await
        .unwrap()
}

async fn fetch(store: &CacheStore, path: &str) -> Result<Vec<u8>, CacheError> {
    let file = store.get_cache_entry(&uri(path)).await?.get_cache_file().await?;
    Ok(tokio::fs::read(file).await.unwrap())
}

#[tokio::test]
async fn test_fresh_line_is_served_without_network() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "GET",
        "/p2/content.jar",
        Reply::ok("artifact").header("Cache-Control", "max-age=3600"),
    );
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    assert_eq!(fetch(&store, "/p2/content.jar").await.unwrap(), b"artifact");
    assert_eq!(fetch(&store, "/p2/content.jar").await.unwrap(), b"artifact");
    assert_eq!(transport.request_count(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.request.header("accept-encoding"), Some("gzip"));

    let stats = store.statistics().await;
    assert_eq!(stats.downloads, 1);
    assert_eq!(stats.fresh_hits, 1);
    assert_eq!(stats.disk.content_files, 1);
    assert_eq!(stats.disk.header_files, 1);
}

#[tokio::test]
async fn test_etag_revalidation_keeps_content() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/index.xml", Reply::ok("v1").header("ETag", "\"v1\""));
    transport.reply(
        "GET",
        "/index.xml",
        Reply::status(304).header("Cache-Control", "max-age=600"),
    );
    let store = store(
        config(&dir).with_min_cache_period(Duration::ZERO),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    assert_eq!(fetch(&store, "/index.xml").await.unwrap(), b"v1");
    let before = store.inspect(&uri("/index.xml")).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(fetch(&store, "/index.xml").await.unwrap(), b"v1");

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].request.header("if-none-match"), Some("\"v1\""));

    let after = store.inspect(&uri("/index.xml")).await.unwrap().unwrap();
    assert_eq!(after.response_code, Some(200));
    assert_eq!(after.etag(), Some("\"v1\""));
    assert_eq!(after.get("cache-control"), Some("max-age=600"));
    assert!(after.last_updated > before.last_updated);
}

#[tokio::test]
async fn test_max_age_zero_always_revalidates() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    let last_modified = "Wed, 21 Oct 2015 07:28:00 GMT";
    transport.reply(
        "GET",
        "/volatile.xml",
        Reply::ok("data")
            .header("Cache-Control", "max-age=0")
            .header("Last-Modified", last_modified),
    );
    transport.reply("GET", "/volatile.xml", Reply::status(304));
    transport.reply("GET", "/volatile.xml", Reply::status(304));
    let store = store(
        config(&dir).with_min_cache_period(Duration::ZERO),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    for _ in 0..3 {
        assert_eq!(fetch(&store, "/volatile.xml").await.unwrap(), b"data");
    }

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[2].request.header("if-modified-since"),
        Some(last_modified)
    );
}

#[tokio::test]
async fn test_redirect_keeps_original_extension() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "GET",
        "/plugins/bundle.jar",
        Reply::status(302).header("Location", "/storage/blob-4711"),
    );
    transport.reply("GET", "/storage/blob-4711", Reply::ok("jar bytes"));
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let entry = store.get_cache_entry(&uri("/plugins/bundle.jar")).await.unwrap();
    let file = entry.get_cache_file().await.unwrap();

    assert_eq!(file.extension().and_then(|e| e.to_str()), Some("jar"));
    assert_eq!(tokio::fs::read(&file).await.unwrap(), b"jar bytes");

    let redirect = store
        .inspect(&uri("/plugins/bundle.jar"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(redirect.response_code, Some(302));
    assert_eq!(redirect.location(), Some("/storage/blob-4711"));
    assert_eq!(store.statistics().await.redirects, 1);
}

#[tokio::test]
async fn test_permanent_redirect_without_content_is_short_circuited() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "HEAD",
        "/old/artifacts.xml",
        Reply::status(301).header("Location", "/new/artifacts.xml"),
    );
    transport.reply(
        "HEAD",
        "/new/artifacts.xml",
        Reply::status(200).header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
    );
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let entry = store.get_cache_entry(&uri("/old/artifacts.xml")).await.unwrap();
    assert_eq!(entry.get_last_modified().await.unwrap(), 1_445_412_480_000);

    let entry = store.get_cache_entry(&uri("/old/artifacts.xml")).await.unwrap();
    assert_eq!(entry.url().as_str(), uri("/new/artifacts.xml"));
    assert_eq!(entry.get_last_modified().await.unwrap(), 1_445_412_480_000);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_self_redirect_is_reported_as_loop() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "GET",
        "/loop",
        Reply::status(301).header("Location", "/loop"),
    );
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let err = fetch(&store, "/loop").await.unwrap_err();
    assert!(matches!(err, CacheError::RedirectLoop { .. }), "{:?}", err);

    let err = store.get_cache_entry(&uri("/loop")).await.unwrap_err();
    assert!(matches!(err, CacheError::RedirectLoop { .. }), "{:?}", err);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_redirect_onto_shared_cache_path_is_a_loop() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "GET",
        "/a:b.jar",
        Reply::status(302).header("Location", "/a/b.jar"),
    );
    transport.reply("GET", "/a/b.jar", Reply::ok("b"));
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let result = tokio::time::timeout(Duration::from_secs(3), fetch(&store, "/a:b.jar"))
        .await
        .expect("lookup must not wait on its own line");
    let err = result.unwrap_err();
    assert!(matches!(err, CacheError::RedirectLoop { .. }), "{:?}", err);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_offline_redirect_onto_shared_cache_path_is_a_loop() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "GET",
        "/dir?",
        Reply::status(302).header("Location", "/dir/"),
    );
    let online = store(config(&dir), &transport, Arc::new(NoCredentials)).await;
    let err = fetch(&online, "/dir?").await.unwrap_err();
    assert!(matches!(err, CacheError::RedirectLoop { .. }), "{:?}", err);
    drop(online);

    let offline = store(
        config(&dir).with_offline(true),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;
    let result = tokio::time::timeout(Duration::from_secs(3), fetch(&offline, "/dir?"))
        .await
        .expect("offline lookup must not wait on its own line");
    assert!(matches!(result, Err(CacheError::RedirectLoop { .. })));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_redirect_without_location_fails() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/moved", Reply::status(302));
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let err = fetch(&store, "/moved").await.unwrap_err();
    assert!(matches!(err, CacheError::MissingLocation { status: 302, .. }));
}

#[tokio::test]
async fn test_offline_never_touches_network() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/a.jar", Reply::ok("a"));

    let online = store(config(&dir), &transport, Arc::new(NoCredentials)).await;
    fetch(&online, "/a.jar").await.unwrap();
    drop(online);

    let offline_transport = ScriptedTransport::new();
    let offline = store(
        config(&dir).with_offline(true).with_update(true),
        &offline_transport,
        Arc::new(NoCredentials),
    )
    .await;

    assert_eq!(fetch(&offline, "/a.jar").await.unwrap(), b"a");
    let err = fetch(&offline, "/never-fetched.jar").await.unwrap_err();
    assert!(matches!(err, CacheError::Unavailable { .. }));
    assert_eq!(offline_transport.request_count(), 0);
}

#[tokio::test]
async fn test_offline_follows_persisted_redirects() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "HEAD",
        "/mirror/index.xml",
        Reply::status(302).header("Location", "https://cdn.example.org/index.xml"),
    );
    let store_online = store(config(&dir), &transport, Arc::new(NoCredentials)).await;
    let err = store_online
        .get_cache_entry(&uri("/mirror/index.xml"))
        .await
        .unwrap()
        .get_last_modified()
        .await
        .unwrap_err();
    assert!(err.is_transient());
    drop(store_online);

    let offline = store(
        config(&dir).with_offline(true),
        &ScriptedTransport::new(),
        Arc::new(NoCredentials),
    )
    .await;
    let err = offline
        .get_cache_entry(&uri("/mirror/index.xml"))
        .await
        .unwrap()
        .get_cache_file()
        .await
        .unwrap_err();

    match err {
        CacheError::Unavailable { url } => assert_eq!(url, "https://cdn.example.org/index.xml"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_sensitive_headers_never_persisted() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply(
        "GET",
        "/secure/content.jar",
        Reply::ok("secret bytes")
            .header("WWW-Authenticate", "Basic realm=\"repo\"")
            .header("Proxy-Authenticate", "Basic")
            .header("X-Request-Id", "abc-123")
            .header("Content-Encoding", "gzip")
            .header("ETag", "\"s1\""),
    );
    let credentials = StaticCredentials::new()
        .with_server(uri("/secure/"), Credentials::new("deploy", "hunter2"));
    let store = store(config(&dir), &transport, Arc::new(credentials)).await;

    let file = store
        .get_cache_entry(&uri("/secure/content.jar"))
        .await
        .unwrap()
        .get_cache_file()
        .await
        .unwrap();

    let request = &transport.requests()[0].request;
    assert!(request
        .header("authorization")
        .is_some_and(|value| value.starts_with("Basic ")));

    let text = tokio::fs::read_to_string(PathGenerator::header_path(&file))
        .await
        .unwrap()
        .to_ascii_lowercase();
    assert!(text.contains("etag"));
    for forbidden in [
        "authorization",
        "authenticate",
        "x-request-id",
        "content-encoding",
        "hunter2",
    ] {
        assert!(!text.contains(forbidden), "{} leaked into {}", forbidden, text);
    }
}

#[tokio::test]
async fn test_authentication_failure_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/private.jar", Reply::status(401));
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let err = fetch(&store, "/private.jar").await.unwrap_err();
    assert!(matches!(err, CacheError::AuthenticationFailed { status: 401, .. }));
    assert!(store.inspect(&uri("/private.jar")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_download() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::with_latency(Duration::from_millis(50));
    transport.reply("GET", "/big.zip", Reply::ok("zip"));
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let results = join_all((0..8).map(|_| fetch(&store, "/big.zip"))).await;

    for result in results {
        assert_eq!(result.unwrap(), b"zip");
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_transient_failure_falls_back_to_cached_copy() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/a.jar", Reply::ok("cached"));
    transport.reply("GET", "/a.jar", Reply::Fail);
    transport.reply("GET", "/a.jar", Reply::status(503));
    let store = store(
        config(&dir).with_min_cache_period(Duration::ZERO),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");
    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");
    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");
    assert_eq!(store.statistics().await.stale_fallbacks, 2);
}

#[tokio::test]
async fn test_server_error_is_persisted_and_falls_back() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/a.jar", Reply::ok("cached").header("ETag", "\"v1\""));
    transport.reply("GET", "/a.jar", Reply::status(500));
    transport.reply("GET", "/a.jar", Reply::Fail);
    transport.reply("GET", "/a.jar", Reply::status(304));
    let store = store(
        config(&dir).with_min_cache_period(Duration::ZERO),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");
    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");

    let headers = store.inspect(&uri("/a.jar")).await.unwrap().unwrap();
    assert_eq!(headers.response_code, Some(500));
    assert_eq!(headers.etag(), Some("\"v1\""));
    let header_file = PathGenerator::header_path(
        &store.get_cache_entry(&uri("/a.jar")).await.unwrap().content_path(),
    );
    let text = tokio::fs::read_to_string(header_file).await.unwrap();
    assert!(text.contains("HTTP_RESPONSE_CODE=500\n"));

    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");
    assert_eq!(store.statistics().await.stale_fallbacks, 2);

    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"cached");
    let requests = transport.requests();
    assert_eq!(
        requests[3].request.header("If-None-Match"),
        Some("\"v1\"")
    );
    let headers = store.inspect(&uri("/a.jar")).await.unwrap().unwrap();
    assert_eq!(headers.response_code, Some(200));
}

#[tokio::test]
async fn test_server_error_without_content_is_recorded() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/broken.jar", Reply::status(502));
    let store = store(config(&dir), &transport, Arc::new(NoCredentials)).await;

    let err = fetch(&store, "/broken.jar").await.unwrap_err();
    assert!(matches!(err, CacheError::HttpStatus { status: 502, .. }), "{:?}", err);

    let headers = store.inspect(&uri("/broken.jar")).await.unwrap().unwrap();
    assert_eq!(headers.response_code, Some(502));
    assert!(headers.last_updated.is_some());
}

#[tokio::test]
async fn test_update_mode_does_not_fall_back() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/a.jar", Reply::ok("cached"));
    let first = store(config(&dir), &transport, Arc::new(NoCredentials)).await;
    fetch(&first, "/a.jar").await.unwrap();
    drop(first);

    let updating = store(
        config(&dir).with_update(true),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;
    let err = fetch(&updating, "/a.jar").await.unwrap_err();
    assert!(matches!(err, CacheError::Transport(_)));
}

#[tokio::test]
async fn test_gone_resource_is_remembered() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/a.jar", Reply::ok("old"));
    transport.reply("GET", "/a.jar", Reply::status(410));
    let store_a = store(
        config(&dir).with_min_cache_period(Duration::ZERO),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    let file = store_a
        .get_cache_entry(&uri("/a.jar"))
        .await
        .unwrap()
        .get_cache_file()
        .await
        .unwrap();
    let err = fetch(&store_a, "/a.jar").await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound { status: 410, .. }));
    assert!(!file.exists());

    let err = store_a.get_cache_entry(&uri("/a.jar")).await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound { status: 410, .. }));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_expires_polarity() {
    let in_a_day = http_date(Utc::now() + ChronoDuration::days(1));

    for (strict, expected_requests) in [(false, 2), (true, 1)] {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.reply(
            "GET",
            "/site.xml",
            Reply::ok("site").header("Expires", &in_a_day),
        );
        transport.reply("GET", "/site.xml", Reply::status(304));
        let store = store(
            config(&dir)
                .with_min_cache_period(Duration::ZERO)
                .with_strict_expires(strict),
            &transport,
            Arc::new(NoCredentials),
        )
        .await;

        fetch(&store, "/site.xml").await.unwrap();
        fetch(&store, "/site.xml").await.unwrap();
        assert_eq!(transport.request_count(), expected_requests, "strict={}", strict);
    }
}

#[tokio::test]
async fn test_head_change_drops_stale_content() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.reply("GET", "/a.jar", Reply::ok("v1").header("ETag", "\"v1\""));
    transport.reply("HEAD", "/a.jar", Reply::status(200).header("ETag", "\"v2\""));
    transport.reply("GET", "/a.jar", Reply::ok("v2").header("ETag", "\"v2\""));
    let store = store(
        config(&dir).with_min_cache_period(Duration::ZERO),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"v1");
    let entry = store.get_cache_entry(&uri("/a.jar")).await.unwrap();
    assert_eq!(entry.get_last_modified().await.unwrap(), -1);
    assert!(!entry.content_path().exists());

    assert_eq!(fetch(&store, "/a.jar").await.unwrap(), b"v2");
    let last = transport.requests().pop().unwrap();
    assert_eq!(last.request.header("if-none-match"), None);
}

#[tokio::test]
async fn test_line_index_is_bounded() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    let store = store(
        config(&dir).with_max_entries(2),
        &transport,
        Arc::new(NoCredentials),
    )
    .await;

    let held = [
        store.get_cache_entry(&uri("/1")).await.unwrap(),
        store.get_cache_entry(&uri("/2")).await.unwrap(),
        store.get_cache_entry(&uri("/3")).await.unwrap(),
    ];
    assert_eq!(store.line_count(), 3);
    drop(held);

    store.get_cache_entry(&uri("/4")).await.unwrap();
    assert_eq!(store.line_count(), 2);
    assert_eq!(store.statistics().await.evictions, 2);
}
