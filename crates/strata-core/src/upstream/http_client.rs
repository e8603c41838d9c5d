use bytes::Bytes;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Semaphore,
    time::{timeout_at, Instant},
};

use crate::upstream::UpstreamError;

/// Connection pool and concurrency settings shared by every chain.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Upper bound on in-flight upstream requests across all chains.
    pub concurrent_limit: usize,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            concurrent_limit: 512,
            connect_timeout: Duration::from_millis(1500),
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 16,
        }
    }
}

/// Status and body of a completed upstream exchange.
///
/// Every status is returned as-is; deciding what a 404 or a 500 means is the router's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP client for REST, Tendermint RPC and Web3 endpoints.
///
/// One instance is built by the gateway and shared by the router and the prober. It never
/// retries: failover across ranked endpoints belongs to the router. The timeout handed to
/// [`get`](Self::get) / [`post_json`](Self::post_json) is the whole attempt budget, so time
/// spent waiting for a concurrency permit is taken out of it.
pub struct HttpClient {
    client: Client,
    in_flight: Arc<Semaphore>,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, UpstreamError> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("strata-gateway/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                UpstreamError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client, in_flight: Arc::new(Semaphore::new(config.concurrent_limit)) })
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Timeout`] if the budget runs out, waiting for a permit included
    /// - [`UpstreamError::ConcurrencyLimit`] if the semaphore is closed
    /// - [`UpstreamError::ConnectionFailed`] for other network failures
    pub async fn get(&self, url: &str, budget: Duration) -> Result<HttpReply, UpstreamError> {
        self.execute(self.client.get(url), url, budget).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn post_json(
        &self,
        url: &str,
        body: Bytes,
        budget: Duration,
    ) -> Result<HttpReply, UpstreamError> {
        let request = self.client.post(url).header("content-type", "application/json").body(body);
        self.execute(request, url, budget).await
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        url: &str,
        budget: Duration,
    ) -> Result<HttpReply, UpstreamError> {
        let deadline = Instant::now() + budget;

        let _permit = timeout_at(deadline, Arc::clone(&self.in_flight).acquire_owned())
            .await
            .map_err(|_| {
                tracing::warn!(
                    available_permits = self.in_flight.available_permits(),
                    "no http permit within attempt budget"
                );
                UpstreamError::Timeout
            })?
            .map_err(|_| UpstreamError::ConcurrencyLimit(url.to_string()))?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(UpstreamError::Timeout);
        }

        tracing::trace!(permit_wait_ms = (budget - remaining).as_millis() as u64, "http request started");

        // reqwest's own timeout covers headers and body together
        let response = request.timeout(remaining).send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;

        Ok(HttpReply { status, body })
    }

    #[cfg(test)]
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.in_flight.available_permits()
    }
}

/// Maps a transport failure without echoing the node URL, which may carry an API key.
fn network_error(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        return UpstreamError::Timeout;
    }
    let kind = if error.is_connect() {
        "connection refused or unreachable"
    } else if error.is_body() || error.is_decode() {
        "response body error"
    } else if error.is_redirect() {
        "unexpected redirect"
    } else {
        "request failed"
    };
    UpstreamError::ConnectionFailed(kind.to_string())
}
