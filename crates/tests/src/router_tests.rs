//! Request router behaviour across ranked endpoints and cache tiers.

use crate::mock_infrastructure::{
    router_with_endpoints, CosmosMockBuilder, EVMOS, SLOW_RESPONSE, TEST_READ_TIMEOUT,
};
use bytes::Bytes;
use std::time::{Duration, Instant};
use strata_core::{
    cache::{cache_key, TieredCache},
    types::{CacheTier, EndpointClass},
    upstream::ResponseSource,
    GatewayError,
};

const HEIGHT_PATH: &str = "/height";

#[tokio::test]
async fn test_failover_past_timeouts_populates_both_tiers() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let mut third = CosmosMockBuilder::new().await;
    let _slow1 = first.mock_slow_get(HEIGHT_PATH, SLOW_RESPONSE).await;
    let _slow2 = second.mock_slow_get(HEIGHT_PATH, SLOW_RESPONSE).await;
    let live = third.mock_get(HEIGHT_PATH, 200, r#"{"height":"100"}"#).await;

    let test = router_with_endpoints(
        EVMOS,
        EndpointClass::Rest,
        vec![first.url(), second.url(), third.url()],
    );

    let started = Instant::now();
    let response = test.router.get("evmos", EndpointClass::Rest, HEIGHT_PATH).await.unwrap();
    assert_eq!(response.body, r#"{"height":"100"}"#);
    assert_eq!(response.source, ResponseSource::Endpoint { rank: 3 });
    assert!(started.elapsed() < SLOW_RESPONSE + TEST_READ_TIMEOUT * 2);
    live.assert_async().await;

    let key = cache_key(EVMOS, HEIGHT_PATH);
    for tier in [CacheTier::Primary, CacheTier::Fallback] {
        assert_eq!(
            test.cache.get(&key, tier).await.unwrap().as_deref(),
            Some(r#"{"height":"100"}"#)
        );
    }
}

#[tokio::test]
async fn test_first_success_stops_iteration() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let _ok = first.mock_get(HEIGHT_PATH, 200, r#"{"height":"7"}"#).await;
    let untouched = second.mock_never("GET", HEIGHT_PATH).await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![first.url(), second.url()]);
    let response = test.router.get(EVMOS, EndpointClass::Rest, HEIGHT_PATH).await.unwrap();

    assert_eq!(response.source, ResponseSource::Endpoint { rank: 1 });
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_chain_not_found_is_final() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let path = "/cosmos/auth/v1beta1/accounts/evmos1missing";
    let _missing = first
        .mock_get(path, 404, r#"{"code":5,"message":"rpc error: code = NotFound desc = account not found"}"#)
        .await;
    let untouched = second.mock_never("GET", path).await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![first.url(), second.url()]);
    let response = test.router.get(EVMOS, EndpointClass::Rest, path).await.unwrap();

    assert!(response.is_not_found());
    untouched.assert_async().await;
    assert_eq!(test.cache.get(&cache_key(EVMOS, path), CacheTier::Primary).await.unwrap(), None);
}

#[tokio::test]
async fn test_route_not_served_falls_through() {
    let mut express = CosmosMockBuilder::new().await;
    let mut gateway_stub = CosmosMockBuilder::new().await;
    let mut live = CosmosMockBuilder::new().await;
    let _express = express.mock_get(HEIGHT_PATH, 404, "Cannot GET /height").await;
    let _stub =
        gateway_stub.mock_get(HEIGHT_PATH, 404, r#"{"code":12,"message":"Not Implemented"}"#).await;
    let _live = live.mock_get(HEIGHT_PATH, 200, r#"{"height":"55"}"#).await;

    let test = router_with_endpoints(
        EVMOS,
        EndpointClass::Rest,
        vec![express.url(), gateway_stub.url(), live.url()],
    );
    let response = test.router.get(EVMOS, EndpointClass::Rest, HEIGHT_PATH).await.unwrap();

    assert_eq!(response.body, r#"{"height":"55"}"#);
    assert_eq!(response.source, ResponseSource::Endpoint { rank: 3 });
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let _rejected = first
        .mock_get(HEIGHT_PATH, 400, r#"{"code":3,"message":"invalid address: decoding bech32 failed"}"#)
        .await;
    let untouched = second.mock_never("GET", HEIGHT_PATH).await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![first.url(), second.url()]);
    let err = test.router.get(EVMOS, EndpointClass::Rest, HEIGHT_PATH).await.unwrap_err();

    match err {
        GatewayError::BadRequest(message) => {
            assert_eq!(message, "invalid address: decoding bech32 failed");
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_only_max_ranks_are_contacted() {
    let mut nodes = Vec::new();
    let mut mocks = Vec::new();
    for _ in 0..3 {
        let mut node = CosmosMockBuilder::new().await;
        mocks.push(node.mock_get(HEIGHT_PATH, 503, "unavailable").await);
        nodes.push(node);
    }
    let mut fourth = CosmosMockBuilder::new().await;
    let untouched = fourth.mock_never("GET", HEIGHT_PATH).await;

    let mut urls: Vec<String> = nodes.iter().map(CosmosMockBuilder::url).collect();
    urls.push(fourth.url());
    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, urls);

    let err = test.router.get(EVMOS, EndpointClass::Rest, HEIGHT_PATH).await.unwrap_err();
    assert!(matches!(err, GatewayError::AllEndpointsDown { .. }));
    assert_eq!(err.user_message(), "all endpoints are down");
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_fallback_tier_serves_when_all_endpoints_fail() {
    let mut node = CosmosMockBuilder::new().await;
    let _down = node.mock_get(HEIGHT_PATH, 502, "bad gateway").await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![node.url()]);
    test.cache
        .set(
            &cache_key(EVMOS, HEIGHT_PATH),
            r#"{"height":"90"}"#,
            Duration::from_secs(60),
            CacheTier::Fallback,
        )
        .await
        .unwrap();

    let response = test.router.get(EVMOS, EndpointClass::Rest, HEIGHT_PATH).await.unwrap();
    assert!(response.is_stale());
    assert_eq!(response.body, r#"{"height":"90"}"#);
}

#[tokio::test]
async fn test_writes_never_fall_back_to_cache() {
    let mut node = CosmosMockBuilder::new().await;
    let failing = node.mock_broadcast_status(503).await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![node.url()]);
    let path = "/cosmos/tx/v1beta1/txs";
    for tier in [CacheTier::Primary, CacheTier::Fallback] {
        test.cache
            .set(&cache_key(EVMOS, path), "{}", Duration::from_secs(60), tier)
            .await
            .unwrap();
    }

    let err = test
        .router
        .post(EVMOS, EndpointClass::Rest, path, Bytes::from_static(b"{}"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::AllEndpointsDown { .. }));
    failing.assert_async().await;
}

#[tokio::test]
async fn test_broadcast_server_error_is_sequence_mismatch_without_replay() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let _failing = first.mock_broadcast_status(500).await;
    let untouched = second.mock_never("POST", "/cosmos/tx/v1beta1/txs").await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![first.url(), second.url()]);
    let err = test
        .router
        .broadcast(EVMOS, EndpointClass::Rest, "/cosmos/tx/v1beta1/txs", Bytes::from_static(b"{}"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::SequenceMismatch));
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_read_server_error_tries_next_rank() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let _panic = first.mock_get(HEIGHT_PATH, 500, "panic").await;
    let _ok = second.mock_get(HEIGHT_PATH, 200, r#"{"height":"3"}"#).await;

    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, vec![first.url(), second.url()]);
    let response = test.router.get(EVMOS, EndpointClass::Rest, HEIGHT_PATH).await.unwrap();
    assert_eq!(response.source, ResponseSource::Endpoint { rank: 2 });
}
