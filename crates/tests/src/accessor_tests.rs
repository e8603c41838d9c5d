//! Chain state reads through a failing-over router.

use crate::mock_infrastructure::{
    evmos_profile, router_with_endpoints, CosmosMockBuilder, TestRouter, EVMOS, SENDER,
    SLOW_RESPONSE,
};
use mockito::Matcher;
use strata_core::{
    cache::{cache_key, TieredCache},
    chain::{AccountNumbers, ChainHeight, ChainStateAccessor, IbcClientStatus},
    types::{CacheTier, EndpointClass},
    GatewayError,
};

const LATEST_BLOCK: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";

fn accessor(rest: Vec<String>, web3: Vec<String>) -> (ChainStateAccessor, TestRouter) {
    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, rest.clone());
    test.directory.replace(EVMOS, EndpointClass::Web3, web3.clone());
    let accessor = ChainStateAccessor::new(test.router.clone(), vec![evmos_profile(rest, web3)]);
    (accessor, test)
}

#[tokio::test]
async fn test_height_after_two_timeouts() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let mut third = CosmosMockBuilder::new().await;
    let _slow1 = first.mock_slow_get(LATEST_BLOCK, SLOW_RESPONSE).await;
    let _slow2 = second.mock_slow_get(LATEST_BLOCK, SLOW_RESPONSE).await;
    let _live = third.mock_get(LATEST_BLOCK, 200, r#"{"height":"100"}"#).await;

    let (accessor, test) = accessor(vec![first.url(), second.url(), third.url()], Vec::new());
    let height = accessor.get_height(EVMOS).await.unwrap();
    assert_eq!(height, ChainHeight { height: 100, revision_number: 2 });

    let key = cache_key(EVMOS, LATEST_BLOCK);
    for tier in [CacheTier::Primary, CacheTier::Fallback] {
        assert_eq!(
            test.cache.get(&key, tier).await.unwrap().as_deref(),
            Some(r#"{"height":"100"}"#)
        );
    }
}

#[tokio::test]
async fn test_height_prefers_reported_chain_id() {
    let mut node = CosmosMockBuilder::new().await;
    let _block = node.mock_latest_block(19_000_000, "evmos_9001-3").await;

    let (accessor, _test) = accessor(vec![node.url()], Vec::new());
    let height = accessor.get_height("evmos").await.unwrap();
    assert_eq!(height, ChainHeight { height: 19_000_000, revision_number: 3 });
}

#[tokio::test]
async fn test_account_read_is_cached() {
    let mut node = CosmosMockBuilder::new().await;
    let account = node.mock_eth_account(SENDER, 2_164_290, 43).await;

    let (accessor, _test) = accessor(vec![node.url()], Vec::new());
    let expected = AccountNumbers { account_number: 2_164_290, sequence: 43 };
    assert_eq!(accessor.get_account(SENDER, EVMOS).await.unwrap(), expected);
    assert_eq!(accessor.get_account(SENDER, EVMOS).await.unwrap(), expected);

    // second read is a primary tier hit
    account.assert_async().await;
}

#[tokio::test]
async fn test_missing_account_is_not_found() {
    let mut first = CosmosMockBuilder::new().await;
    let mut second = CosmosMockBuilder::new().await;
    let _missing = first.mock_missing_account(SENDER).await;
    let untouched =
        second.mock_never("GET", format!("/cosmos/auth/v1beta1/accounts/{SENDER}").as_str()).await;

    let (accessor, _test) = accessor(vec![first.url(), second.url()], Vec::new());
    let err = accessor.get_account(SENDER, EVMOS).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
    assert!(err.is_client_error());
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_fee_from_web3_gas_price() {
    let mut web3 = CosmosMockBuilder::new().await;
    let _price = web3.mock_gas_price(20_000_000_000, 2).await;

    let (accessor, _test) = accessor(Vec::new(), vec![web3.url()]);
    assert_eq!(accessor.get_gas_price_hint(EVMOS).await.unwrap().to_string(), "20000000000");

    let fee = accessor.estimate_fee(EVMOS, 10_500_000).await.unwrap();
    assert_eq!(fee.denom, "aevmos");
    assert_eq!(fee.amount, "241500000000000000");
}

#[tokio::test]
async fn test_gas_price_is_never_cached() {
    let mut web3 = CosmosMockBuilder::new().await;
    let price = web3.mock_gas_price(1_000, 2).await;

    let (accessor, _test) = accessor(Vec::new(), vec![web3.url()]);
    accessor.get_gas_price_hint(EVMOS).await.unwrap();
    accessor.get_gas_price_hint(EVMOS).await.unwrap();
    price.assert_async().await;
}

#[tokio::test]
async fn test_ibc_client_status() {
    let mut node = CosmosMockBuilder::new().await;
    let _active = node.mock_client_status("07-tendermint-0", "Active").await;
    let _expired = node.mock_client_status("07-tendermint-9", "Expired").await;

    let (accessor, _test) = accessor(vec![node.url()], Vec::new());
    assert_eq!(
        accessor.get_ibc_client_status(EVMOS, "07-tendermint-0").await.unwrap(),
        IbcClientStatus::Active
    );
    accessor.ensure_ibc_client_active(EVMOS, "07-tendermint-0").await.unwrap();

    let err = accessor.ensure_ibc_client_active(EVMOS, "07-tendermint-9").await.unwrap_err();
    assert!(err.to_string().contains("Expired"));
}

#[tokio::test]
async fn test_malformed_client_id_never_reaches_upstream() {
    let mut node = CosmosMockBuilder::new().await;
    let untouched = node.mock_never("GET", Matcher::Any).await;

    let (accessor, _test) = accessor(vec![node.url()], Vec::new());
    let err = accessor.get_ibc_client_status(EVMOS, "../../accounts").await.unwrap_err();
    assert!(matches!(err, GatewayError::BadRequest(_)));
    untouched.assert_async().await;
}
