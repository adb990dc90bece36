//! Pooled reqwest transport with rate limiting and retry logic
//!
//! Every request waits on a governor rate limiter (with jitter to avoid a
//! thundering herd), then retries 429, 503 and connection failures with
//! exponential backoff. Redirects are never followed here.

use std::io;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use tracing::{debug, error, warn};

use super::config::ClientConfig;
use super::{Transport, TransportRequest, TransportResponse};
use crate::auth::CredentialsProvider;
use crate::errors::{TransportError, TransportResult};

/// Transport backed by a pooled reqwest client
pub struct ReqwestTransport {
    client: Client,
    rate_limiter: DefaultDirectRateLimiter,
    config: ClientConfig,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a new transport from client configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the rate limit is zero or the client
    /// cannot be built
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> TransportResult<Self> {
        let client = config.build_http_client(credentials)?;
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            config: config.clone(),
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> TransportResult<DefaultDirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| TransportError::InvalidConfig {
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    fn header_map(request: &TransportRequest) -> TransportResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in request.headers() {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                    TransportError::InvalidHeader { name: name.clone() }
                })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    /// Sends the request, retrying throttling and connection failures
    async fn send(&self, method: Method, request: &TransportRequest) -> TransportResult<Response> {
        let headers = Self::header_map(request)?;
        let url = request.url();
        let max_retries = self.config.max_retries;

        let mut retries = 0;
        loop {
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
                .await;

            let result = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone())
                .send()
                .await;

            match result {
                Ok(response) if response.status() == 429 || response.status() == 503 => {
                    let status = response.status().as_u16();
                    if retries >= max_retries {
                        return Err(if status == 429 {
                            TransportError::RateLimitExceeded
                        } else {
                            TransportError::ServerOverloaded
                        });
                    }
                    retries += 1;
                    let delay = self.config.retry_delay(retries);
                    warn!(
                        "Server answered {} for {}. Backing off for {}ms",
                        status,
                        url,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    debug!("{} {} -> {}", method, url, response.status());
                    return Ok(response);
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && retries < max_retries => {
                    retries += 1;
                    let delay = self.config.retry_delay(retries);
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    error!("Request to {} failed after {} retries: {}", url, max_retries, e);
                    return Err(TransportError::MaxRetriesExceeded { max_retries });
                }
                Err(e) => return Err(TransportError::Http(e)),
            }
        }
    }

    fn into_transport_response(response: Response) -> TransportResponse {
        let status = response.status();
        let status_line = format!(
            "{:?} {} {}",
            response.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string();

        let mut transport_response =
            TransportResponse::new(status.as_u16()).with_status_line(status_line);
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                transport_response = transport_response.with_header(name.as_str(), value);
            }
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e)))
            .boxed();
        transport_response.with_body_stream(body)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        let response = self.send(Method::GET, &request).await?;
        Ok(Self::into_transport_response(response))
    }

    async fn head(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        let response = self.send(Method::HEAD, &request).await?;
        Ok(Self::into_transport_response(response))
    }
}
