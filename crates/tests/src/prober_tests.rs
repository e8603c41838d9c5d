//! Endpoint probing, ranking and publication.

use crate::mock_infrastructure::{CosmosMockBuilder, EVMOS, EVMOS_CHAIN_ID};
use std::sync::Arc;
use strata_core::{
    config::ProberConfig,
    types::EndpointClass,
    upstream::{EndpointDirectory, EndpointProber, HttpClient, MemoryDirectory},
};

fn prober(directory: &Arc<MemoryDirectory>, top_k: usize) -> EndpointProber {
    let http = Arc::new(HttpClient::new().unwrap());
    let config = ProberConfig { timeout_ms: 500, top_k, concurrency: 4 };
    EndpointProber::new(http, directory.clone(), config)
}

async fn published(directory: &MemoryDirectory, class: EndpointClass) -> Vec<String> {
    directory.list_endpoints(EVMOS, class).await.unwrap()
}

#[tokio::test]
async fn test_publishes_highest_nodes_first() {
    let mut lagging = CosmosMockBuilder::new().await;
    let mut tip = CosmosMockBuilder::new().await;
    let mut near_tip = CosmosMockBuilder::new().await;
    let mut dead = CosmosMockBuilder::new().await;
    let _a = lagging.mock_latest_block(100, EVMOS_CHAIN_ID).await;
    let _b = tip.mock_latest_block(105, EVMOS_CHAIN_ID).await;
    let _c = near_tip.mock_latest_block(103, EVMOS_CHAIN_ID).await;
    let _d = dead.mock_get("/cosmos/base/tendermint/v1beta1/blocks/latest", 503, "down").await;

    let directory = Arc::new(MemoryDirectory::new());
    let candidates = vec![lagging.url(), dead.url(), near_tip.url(), tip.url()];
    let reports =
        prober(&directory, 2).probe_and_publish("evmos", EndpointClass::Rest, &candidates).await;

    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].url, tip.url());
    assert_eq!(reports[0].height, Some(105));
    assert!(!reports[3].is_healthy());
    assert!(reports[3].error.is_some());

    assert_eq!(published(&directory, EndpointClass::Rest).await, vec![tip.url(), near_tip.url()]);
}

#[tokio::test]
async fn test_jrpc_and_web3_heights() {
    let mut rpc = CosmosMockBuilder::new().await;
    let mut evm = CosmosMockBuilder::new().await;
    let _status = rpc.mock_status(2_000, EVMOS_CHAIN_ID).await;
    let _block = evm.mock_block_number(0x1f4).await;

    let directory = Arc::new(MemoryDirectory::new());
    let prober = prober(&directory, 3);

    let jrpc = prober.probe_and_publish(EVMOS, EndpointClass::Jrpc, &[rpc.url()]).await;
    assert_eq!(jrpc[0].height, Some(2_000));

    let web3 = prober.probe_and_publish(EVMOS, EndpointClass::Web3, &[evm.url()]).await;
    assert_eq!(web3[0].height, Some(500));

    assert_eq!(published(&directory, EndpointClass::Jrpc).await, vec![rpc.url()]);
    assert_eq!(published(&directory, EndpointClass::Web3).await, vec![evm.url()]);
}

#[tokio::test]
async fn test_all_unhealthy_keeps_previous_ranking() {
    let mut broken = CosmosMockBuilder::new().await;
    let _garbage =
        broken.mock_get("/cosmos/base/tendermint/v1beta1/blocks/latest", 200, "<html>").await;

    let directory = Arc::new(MemoryDirectory::new());
    directory.replace(EVMOS, EndpointClass::Rest, vec!["https://known-good.example.com".into()]);

    let reports =
        prober(&directory, 3).probe_and_publish(EVMOS, EndpointClass::Rest, &[broken.url()]).await;
    assert!(reports.iter().all(|r| !r.is_healthy()));
    assert_eq!(
        published(&directory, EndpointClass::Rest).await,
        vec!["https://known-good.example.com".to_string()]
    );
}
