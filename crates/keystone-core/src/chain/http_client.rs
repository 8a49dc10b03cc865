use reqwest::{Client, ClientBuilder};
use std::{sync::Arc, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::chain::RpcError;

/// Configuration for HTTP client concurrency and retry behavior.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum number of concurrent HTTP requests allowed
    pub concurrent_limit: usize,
    /// Permit acquisition timeout in milliseconds
    pub permit_timeout_ms: u64,
    /// Retries for connection failures and 5xx responses
    pub max_retries: u32,
    /// Base backoff between retries, doubled on each attempt
    pub retry_backoff_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { concurrent_limit: 32, permit_timeout_ms: 2_000, max_retries: 2, retry_backoff_ms: 100 }
    }
}

/// HTTP client with semaphore-based concurrency control.
///
/// Deployment probes fan out one request per contract, so the semaphore keeps a large
/// registry from flooding a rate-limited public endpoint.
pub struct HttpClient {
    client: Client,
    concurrent_limit: Arc<Semaphore>,
    config: HttpClientConfig,
}

/// RAII guard ensuring semaphore permits are always released.
struct PermitGuard {
    _permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
}

impl PermitGuard {
    fn new(permit: OwnedSemaphorePermit, semaphore: Arc<Semaphore>) -> Self {
        Self { _permit: permit, semaphore }
    }

    fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, RpcError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Sanitizes network errors so endpoint URLs (which often embed API keys) never
    /// reach logs or user-facing messages.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else {
            "network error".to_string()
        }
    }

    /// Creates a new HTTP client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, RpcError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("keystone/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                RpcError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            concurrent_limit: Arc::new(Semaphore::new(config.concurrent_limit.max(1))),
            config,
        })
    }

    /// Sends an HTTP POST request with semaphore-based concurrency control.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Timeout`] if permit acquisition or the request times out
    /// - [`RpcError::ConcurrencyLimit`] if the semaphore is closed
    /// - [`RpcError::HttpError`] for non-success HTTP status codes
    /// - [`RpcError::ConnectionFailed`] for network-related failures
    pub async fn send_request(
        &self,
        url: &str,
        body: bytes::Bytes,
        timeout: Duration,
    ) -> Result<bytes::Bytes, RpcError> {
        let permit = tokio::time::timeout(
            Duration::from_millis(self.config.permit_timeout_ms),
            Arc::clone(&self.concurrent_limit).acquire_owned(),
        )
        .await
        .map_err(|_| {
            tracing::warn!(
                available_permits = self.concurrent_limit.available_permits(),
                "http client semaphore acquisition timeout"
            );
            RpcError::Timeout
        })?
        .map_err(|_| RpcError::ConcurrencyLimit("http client semaphore closed".to_string()))?;

        let permit_guard = PermitGuard::new(permit, Arc::clone(&self.concurrent_limit));
        tracing::trace!(available_permits = permit_guard.available_permits(), "http request started");

        let mut retries = 0;

        loop {
            let result = self
                .client
                .post(url)
                .header("content-type", "application/json")
                .body(body.clone())
                .timeout(timeout)
                .send()
                .await;

            match result {
                Ok(response) => {
                    if response.status().is_success() {
                        return response.bytes().await.map_err(|e| {
                            RpcError::ConnectionFailed(Self::sanitize_network_error(&e))
                        });
                    } else if response.status().is_server_error() && retries < self.config.max_retries {
                        retries += 1;
                        self.backoff(retries).await;
                        continue;
                    }

                    let status = response.status().as_u16();
                    let raw_text = response.text().await.unwrap_or_default();
                    let sanitized_text = if raw_text.len() > 256 {
                        let cut = (0..=256).rev().find(|i| raw_text.is_char_boundary(*i)).unwrap_or(0);
                        format!("{}... (truncated)", &raw_text[..cut])
                    } else {
                        raw_text
                    };
                    tracing::debug!(status = status, "http request failed");
                    return Err(RpcError::HttpError(status, sanitized_text));
                }
                Err(e) if retries < self.config.max_retries && !e.is_timeout() => {
                    retries += 1;
                    tracing::debug!(retry = retries, error = %Self::sanitize_network_error(&e), "retrying http request");
                    self.backoff(retries).await;
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(RpcError::Timeout);
                    }
                    return Err(RpcError::ConnectionFailed(Self::sanitize_network_error(&e)));
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.config.retry_backoff_ms.saturating_mul(1 << attempt.min(6));
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    #[cfg(test)]
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.concurrent_limit.available_permits()
    }
}
