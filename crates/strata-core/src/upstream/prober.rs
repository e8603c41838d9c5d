//! One-shot endpoint prober.
//!
//! Probes every candidate URL of a chain and class, ranks the live ones and publishes the best
//! `top_k` to the directory. Scheduling is left to the caller (a cron, the CLI `probe` command).
//!
//! | Class | Probe | Height source |
//! |-------|-------|---------------|
//! | rest | `GET /cosmos/base/tendermint/v1beta1/blocks/latest` | `block.header.height` |
//! | jrpc | `GET /status` | `result.sync_info.latest_block_height` |
//! | web3 | `POST eth_blockNumber` | hex `result` |
//!
//! Ranking: highest height first, ties broken by lowest latency. Endpoints that fail or answer
//! with an unparsable height are never published.

use crate::{
    chain::responses::{HeightResponse, JsonRpcQuantity},
    config::ProberConfig,
    metrics,
    types::{chain_key, EndpointClass},
    upstream::{HttpClient, MemoryDirectory, UpstreamError},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

const ETH_BLOCK_NUMBER: &[u8] = br#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}"#;

/// Write side of the directory, as used by the prober.
pub trait EndpointPublisher: Send + Sync {
    /// Replaces the ranking of `(chain, class)`; `urls[0]` becomes rank 1.
    fn publish(&self, chain: &str, class: EndpointClass, urls: Vec<String>);
}

impl EndpointPublisher for MemoryDirectory {
    fn publish(&self, chain: &str, class: EndpointClass, urls: Vec<String>) {
        self.replace(chain, class, urls);
    }
}

/// Result of probing one URL.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub url: String,
    pub height: Option<u64>,
    #[serde(with = "duration_millis")]
    pub latency: Option<Duration>,
    pub error: Option<String>,
    pub probed_at: DateTime<Utc>,
}

impl ProbeReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.height.is_some() && self.latency.is_some()
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }
}

pub struct EndpointProber {
    http: Arc<HttpClient>,
    publisher: Arc<dyn EndpointPublisher>,
    config: ProberConfig,
}

impl EndpointProber {
    #[must_use]
    pub fn new(
        http: Arc<HttpClient>,
        publisher: Arc<dyn EndpointPublisher>,
        config: ProberConfig,
    ) -> Self {
        Self { http, publisher, config }
    }

    /// Probes `candidates`, publishes the top-K healthy endpoints and returns every report in
    /// rank order (healthy first).
    ///
    /// When no candidate is healthy the existing ranking is left untouched.
    pub async fn probe_and_publish(
        &self,
        chain: &str,
        class: EndpointClass,
        candidates: &[String],
    ) -> Vec<ProbeReport> {
        let reports = self.probe(class, candidates).await;
        let healthy: Vec<String> = reports
            .iter()
            .filter(|r| r.is_healthy())
            .take(self.config.top_k)
            .map(|r| r.url.clone())
            .collect();

        let chain = chain_key(chain);
        metrics::record_healthy_endpoints(&chain, class, healthy.len());

        if healthy.is_empty() {
            warn!(chain = %chain, class = %class, candidates = candidates.len(), "no healthy endpoints, keeping previous ranking");
        } else {
            info!(chain = %chain, class = %class, published = healthy.len(), best = %healthy[0], "publishing endpoint ranking");
            self.publisher.publish(&chain, class, healthy);
        }

        reports
    }

    /// Probes `candidates` concurrently and returns ranked reports without publishing.
    pub async fn probe(&self, class: EndpointClass, candidates: &[String]) -> Vec<ProbeReport> {
        let mut reports: Vec<ProbeReport> = stream::iter(candidates.iter().cloned())
            .map(|url| self.probe_one(class, url))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        rank_reports(&mut reports);
        reports
    }

    async fn probe_one(&self, class: EndpointClass, url: String) -> ProbeReport {
        let timeout = self.config.timeout();
        let started = tokio::time::Instant::now();
        let base = url.trim_end_matches('/');

        let reply = match class {
            EndpointClass::Rest => {
                self.http
                    .get(&format!("{base}/cosmos/base/tendermint/v1beta1/blocks/latest"), timeout)
                    .await
            }
            EndpointClass::Jrpc => self.http.get(&format!("{base}/status"), timeout).await,
            EndpointClass::Web3 => {
                self.http.post_json(base, Bytes::from_static(ETH_BLOCK_NUMBER), timeout).await
            }
        };
        let latency = started.elapsed();

        let height = reply.and_then(|reply| {
            if !reply.is_success() {
                return Err(UpstreamError::HttpError(reply.status, String::new()));
            }
            parse_probe_height(class, &reply.body)
                .ok_or_else(|| UpstreamError::HttpError(reply.status, "unparsable height".into()))
        });

        match height {
            Ok(height) => {
                debug!(url = %url, height = height, latency_ms = latency.as_millis() as u64, "probe ok");
                ProbeReport {
                    url,
                    height: Some(height),
                    latency: Some(latency),
                    error: None,
                    probed_at: Utc::now(),
                }
            }
            Err(e) => {
                debug!(url = %url, error = %e, "probe failed");
                ProbeReport {
                    url,
                    height: None,
                    latency: None,
                    error: Some(e.to_string()),
                    probed_at: Utc::now(),
                }
            }
        }
    }
}

fn parse_probe_height(class: EndpointClass, body: &str) -> Option<u64> {
    match class {
        EndpointClass::Rest | EndpointClass::Jrpc => {
            let response: HeightResponse = serde_json::from_str(body).ok()?;
            response.raw_height().parse().ok()
        }
        EndpointClass::Web3 => {
            let response: JsonRpcQuantity = serde_json::from_str(body).ok()?;
            let hex = response.result?;
            u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()
        }
    }
}

/// Sorts healthy reports by height (desc) then latency (asc); unhealthy reports go last.
fn rank_reports(reports: &mut [ProbeReport]) {
    reports.sort_by(|a, b| match (a.is_healthy(), b.is_healthy()) {
        (true, true) => b.height.cmp(&a.height).then(a.latency.cmp(&b.latency)),
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => a.url.cmp(&b.url),
    });
}
