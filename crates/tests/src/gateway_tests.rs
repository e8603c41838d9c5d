//! Gateway wiring and transaction preparation end to end.

use crate::mock_infrastructure::{
    cosmoshub_profile, evmos_profile, pub_key, test_config, CosmosMockBuilder, COSMOSHUB,
    COSMOS_RECEIVER, COSMOS_SENDER, EVMOS, EVMOS_CHAIN_ID, RECEIVER, SENDER, VALIDATOR,
};
use prost::Message;
use std::sync::Arc;
use strata_core::{
    config::GatewayConfig,
    runtime::{RuntimeError, TransactionRequest},
    tx::{
        assemble, proto, AssemblyError, Coin, CosmosMsg, Fee, LogicalTransaction, PubKeyType,
        Signer,
    },
    types::{chain_key, EndpointClass},
    upstream::MemoryDirectory,
    Gateway, GatewayBuilder, GatewayError,
};

fn gateway(rest: &CosmosMockBuilder, web3: &CosmosMockBuilder) -> Gateway {
    let config = test_config(evmos_profile(vec![rest.url()], vec![web3.url()]));
    GatewayBuilder::new().with_config(config).build().unwrap()
}

fn send_request(gas_limit: Option<u64>) -> TransactionRequest {
    TransactionRequest {
        chain: "evmos".to_string(),
        sender: Some(SENDER.to_string()),
        pub_key: pub_key(),
        key_type: None,
        messages: vec![CosmosMsg::Send {
            from_address: SENDER.to_string(),
            to_address: RECEIVER.to_string(),
            amount: vec![Coin::new("1", "aevmos").unwrap()],
        }],
        memo: String::new(),
        gas_limit,
    }
}

#[tokio::test]
async fn test_prepare_transaction_reads_account_and_fee() {
    let mut rest = CosmosMockBuilder::new().await;
    let mut web3 = CosmosMockBuilder::new().await;
    let _account = rest.mock_eth_account(SENDER, 2_164_290, 43).await;
    let _price = web3.mock_gas_price(20_000_000_000, 1).await;

    let prepared = gateway(&rest, &web3)
        .prepare_transaction(send_request(Some(10_500_000)))
        .await
        .unwrap();

    let expected = assemble(&LogicalTransaction {
        chain_id: EVMOS_CHAIN_ID.to_string(),
        messages: send_request(None).messages,
        memo: String::new(),
        fee: Fee {
            amount: Coin::new("241500000000000000", "aevmos").unwrap(),
            gas_limit: 10_500_000,
        },
        signer: Signer {
            address: SENDER.to_string(),
            pub_key: pub_key(),
            key_type: PubKeyType::EthSecp256k1,
            account_number: 2_164_290,
            sequence: 43,
        },
    })
    .unwrap();
    assert_eq!(prepared, expected);
    assert!(prepared.data_signing_amino.contains(r#""sequence":"43""#));
    assert_eq!(prepared.eip712.unwrap().typed_data.domain["chainId"], "0x2329");
}

#[tokio::test]
async fn test_prepare_transaction_default_gas_limit() {
    let mut rest = CosmosMockBuilder::new().await;
    let mut web3 = CosmosMockBuilder::new().await;
    let _account = rest.mock_eth_account(SENDER, 1, 0).await;
    let _price = web3.mock_gas_price(10, 1).await;

    let prepared =
        gateway(&rest, &web3).prepare_transaction(send_request(None)).await.unwrap();
    // 350000 gas * 10 * 1.15
    assert!(prepared.data_signing_amino.contains(
        r#""fee":{"amount":[{"amount":"4025000","denom":"aevmos"}],"gas":"350000"}"#
    ));
}

#[tokio::test]
async fn test_sender_derived_from_public_key() {
    let mut rest = CosmosMockBuilder::new().await;
    let mut web3 = CosmosMockBuilder::new().await;
    let account = rest.mock_eth_account(SENDER, 2_164_290, 43).await;
    let _price = web3.mock_gas_price(20_000_000_000, 2).await;
    let gateway = gateway(&rest, &web3);

    let mut request = send_request(Some(10_500_000));
    request.sender = None;
    let derived = gateway.prepare_transaction(request).await.unwrap();

    // account read again from the primary tier
    let explicit = gateway.prepare_transaction(send_request(Some(10_500_000))).await.unwrap();
    assert_eq!(derived, explicit);
    account.assert_async().await;
}

#[tokio::test]
async fn test_key_type_defaults_to_secp256k1_off_evmos() {
    let mut rest = CosmosMockBuilder::new().await;
    let _account = rest.mock_base_account(COSMOS_SENDER, 8_121, 5).await;
    let _params = rest.mock_fee_market("0.025000000000000000").await;

    let gateway = GatewayBuilder::new()
        .with_config(test_config(cosmoshub_profile(vec![rest.url()])))
        .build()
        .unwrap();
    let request: TransactionRequest = serde_json::from_value(serde_json::json!({
        "chain": "cosmoshub",
        "sender": COSMOS_SENDER,
        "pub_key": crate::mock_infrastructure::PUB_KEY_B64,
        "messages": [{
            "type": "send",
            "from_address": COSMOS_SENDER,
            "to_address": COSMOS_RECEIVER,
            "amount": [{"denom": "uatom", "amount": "10"}]
        }]
    }))
    .unwrap();
    assert_eq!(request.key_type, None);

    let prepared = gateway.prepare_transaction(request).await.unwrap();
    assert!(prepared.eip712.is_none());

    let auth_info = proto::AuthInfo::decode(prepared.sign_direct.auth_info_bytes.as_slice()).unwrap();
    let public_key = auth_info.signer_infos[0].public_key.as_ref().unwrap();
    assert_eq!(public_key.type_url, "/cosmos.crypto.secp256k1.PubKey");
    // 350000 gas at a price of 1 plus the margin
    assert!(prepared.data_signing_amino.contains(r#""amount":"402500","denom":"uatom""#));
}

#[tokio::test]
async fn test_invalid_message_is_a_client_error() {
    let mut rest = CosmosMockBuilder::new().await;
    let mut web3 = CosmosMockBuilder::new().await;
    let _account = rest.mock_eth_account(SENDER, 1, 0).await;
    let _price = web3.mock_gas_price(10, 1).await;

    let mut request = send_request(None);
    request.messages = vec![CosmosMsg::Delegate {
        delegator_address: SENDER.to_string(),
        validator_address: SENDER.to_string(),
        amount: Coin::new("1", "aevmos").unwrap(),
    }];

    let err = gateway(&rest, &web3).prepare_transaction(request).await.unwrap_err();
    assert!(matches!(err, GatewayError::Assembly(AssemblyError::InvalidAddress { .. })));
    assert!(err.is_client_error());

    let mut request = send_request(None);
    request.messages = vec![CosmosMsg::Delegate {
        delegator_address: SENDER.to_string(),
        validator_address: VALIDATOR.to_string(),
        amount: Coin::new("1", "aevmos").unwrap(),
    }];
    gateway(&rest, &web3).prepare_transaction(request).await.unwrap();
}

#[tokio::test]
async fn test_unknown_chain_is_rejected_before_network() {
    let mut rest = CosmosMockBuilder::new().await;
    let web3 = CosmosMockBuilder::new().await;
    let untouched = rest.mock_never("GET", mockito::Matcher::Any).await;

    let mut request = send_request(None);
    request.chain = "OSMOSIS".to_string();
    let err = gateway(&rest, &web3).prepare_transaction(request).await.unwrap_err();

    assert_eq!(err.to_string(), "unknown chain: OSMOSIS");
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_probe_chain_publishes_into_injected_directory() {
    let mut stale = CosmosMockBuilder::new().await;
    let mut fresh = CosmosMockBuilder::new().await;
    let _stale = stale.mock_latest_block(90, EVMOS_CHAIN_ID).await;
    let _fresh = fresh.mock_latest_block(120, EVMOS_CHAIN_ID).await;

    let config = test_config(evmos_profile(vec![stale.url(), fresh.url()], Vec::new()));
    let directory = Arc::new(MemoryDirectory::from_config(&config));
    let gateway =
        GatewayBuilder::new().with_config(config).with_directory(directory.clone()).build().unwrap();

    let reports = gateway.probe_chain(EVMOS).await.unwrap();
    assert_eq!(reports.keys().copied().collect::<Vec<_>>(), vec!["rest"]);

    let ranked = gateway.router().endpoints(EVMOS, EndpointClass::Rest).await.unwrap();
    let urls: Vec<&str> = ranked.iter().map(|r| r.base_url.as_str()).collect();
    assert_eq!(urls, vec![fresh.url(), stale.url()]);
    assert_eq!((ranked[0].rank, ranked[0].chain.as_str()), (1, EVMOS));

    let height = gateway.accessor().get_height(EVMOS).await.unwrap();
    assert_eq!(height.height, 120);
}

#[tokio::test]
async fn test_every_chain_reported_when_one_is_down() {
    let mut evmos = CosmosMockBuilder::new().await;
    let mut hub = CosmosMockBuilder::new().await;
    let _evmos = evmos.mock_latest_block(120, EVMOS_CHAIN_ID).await;
    let _down = hub.mock_get("/cosmos/base/tendermint/v1beta1/blocks/latest", 503, "{}").await;

    let mut config = test_config(evmos_profile(vec![evmos.url()], Vec::new()));
    config.chains.push(cosmoshub_profile(vec![hub.url()]));
    let gateway = GatewayBuilder::new().with_config(config).build().unwrap();

    let all = gateway.probe_all().await;
    assert_eq!(all.len(), 2);
    assert!(all[&chain_key(EVMOS)]["rest"][0].is_healthy());

    let hub_reports = &all[&chain_key(COSMOSHUB)]["rest"];
    assert_eq!(hub_reports.len(), 1);
    assert!(!hub_reports[0].is_healthy());
    assert!(hub_reports[0].error.is_some());
}

#[test]
fn test_builder_rejects_empty_configuration() {
    let err = GatewayBuilder::new().with_config(GatewayConfig::default()).build().err();
    assert!(matches!(err, Some(RuntimeError::NoChains)));

    let err = GatewayBuilder::new().build().err();
    assert!(matches!(err, Some(RuntimeError::ConfigValidation(_))));
}
