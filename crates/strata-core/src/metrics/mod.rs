//! # Metrics
//!
//! Thin recording layer over the [`metrics`] facade. The library only records; installing an
//! exporter (Prometheus or otherwise) is left to the embedding binary.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `strata_endpoint_requests_total` | counter | `chain`, `class`, `outcome` |
//! | `strata_endpoint_latency_seconds` | histogram | `chain`, `class` |
//! | `strata_cache_lookups_total` | counter | `tier`, `result` |
//! | `strata_all_endpoints_down_total` | counter | `chain`, `class` |
//! | `strata_broadcast_total` | counter | `chain`, `outcome` |
//! | `strata_probe_healthy_endpoints` | gauge | `chain`, `class` |

use crate::types::{CacheTier, EndpointClass};
use metrics::{counter, gauge, histogram};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Globally enables or disables metric recording.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

#[inline]
fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Records one endpoint attempt made by the router.
pub fn record_endpoint_attempt(
    chain: &str,
    class: EndpointClass,
    outcome: &'static str,
    latency: Duration,
) {
    if !enabled() {
        return;
    }
    counter!(
        "strata_endpoint_requests_total",
        "chain" => chain.to_string(),
        "class" => class.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "strata_endpoint_latency_seconds",
        "chain" => chain.to_string(),
        "class" => class.as_str()
    )
    .record(latency.as_secs_f64());
}

pub fn record_cache_lookup(tier: CacheTier, hit: bool) {
    if !enabled() {
        return;
    }
    counter!(
        "strata_cache_lookups_total",
        "tier" => tier.as_str(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// Records exhaustion of every ranked endpoint for a chain and class.
pub fn record_all_endpoints_down(chain: &str, class: EndpointClass) {
    if !enabled() {
        return;
    }
    counter!(
        "strata_all_endpoints_down_total",
        "chain" => chain.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}

pub fn record_broadcast(chain: &str, outcome: &'static str) {
    if !enabled() {
        return;
    }
    counter!("strata_broadcast_total", "chain" => chain.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_healthy_endpoints(chain: &str, class: EndpointClass, healthy: usize) {
    if !enabled() {
        return;
    }
    gauge!(
        "strata_probe_healthy_endpoints",
        "chain" => chain.to_string(),
        "class" => class.as_str()
    )
    .set(healthy as f64);
}
