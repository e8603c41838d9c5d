//! Simulate and broadcast of assembled transactions.

use crate::mock_infrastructure::{
    evmos_profile, pub_key, router_with_endpoints, CosmosMockBuilder, EVMOS, EVMOS_CHAIN_ID,
    RECEIVER, SENDER,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use prost::Message;
use strata_core::{
    broadcast::{BroadcastPipeline, BroadcastReport, RejectionKind},
    tx::{
        assemble, join_eip712_signature, proto, AssembledTransaction, Coin, CosmosMsg, Fee,
        LogicalTransaction, PubKeyType, Signer,
    },
    types::EndpointClass,
    GatewayError,
};

fn pipeline(urls: Vec<String>) -> BroadcastPipeline {
    let test = router_with_endpoints(EVMOS, EndpointClass::Rest, urls.clone());
    BroadcastPipeline::new(test.router, &[evmos_profile(urls, Vec::new())])
}

fn assembled(sequence: u64) -> AssembledTransaction {
    let tx = LogicalTransaction {
        chain_id: EVMOS_CHAIN_ID.to_string(),
        messages: vec![CosmosMsg::Send {
            from_address: SENDER.to_string(),
            to_address: RECEIVER.to_string(),
            amount: vec![Coin::new("1", "aevmos").unwrap()],
        }],
        memo: String::new(),
        fee: Fee { amount: Coin::new("241500000000000000", "aevmos").unwrap(), gas_limit: 10_500_000 },
        signer: Signer {
            address: SENDER.to_string(),
            pub_key: pub_key(),
            key_type: PubKeyType::EthSecp256k1,
            account_number: 2_164_290,
            sequence,
        },
    };
    assemble(&tx).unwrap()
}

#[tokio::test]
async fn test_sign_direct_round_trip_to_hash() {
    let tx_raw = assembled(43).sign_direct.into_tx_raw(&[7u8; 65]);
    let encoded = STANDARD.encode(&tx_raw);

    let mut node = CosmosMockBuilder::new().await;
    let simulated = node.mock_simulate_ok(&encoded).await;
    let broadcast = node.mock_broadcast(&encoded, 0, "9F2A1C", "[]").await;

    let hash = pipeline(vec![node.url()]).broadcast(EVMOS, &tx_raw).await.unwrap();
    assert_eq!(hash, "9F2A1C");
    simulated.assert_async().await;
    broadcast.assert_async().await;
}

#[tokio::test]
async fn test_eip712_signature_is_carried_in_extension() {
    let eip712 = assembled(43).eip712.unwrap();
    let signature = format!("0x{}", "ab".repeat(65));
    let tx_raw = join_eip712_signature(&eip712, SENDER, &signature).unwrap();

    let decoded = proto::TxRaw::decode(tx_raw.as_slice()).unwrap();
    assert_eq!(decoded.signatures, vec![Vec::<u8>::new()]);
    let body = proto::TxBody::decode(decoded.body_bytes.as_slice()).unwrap();
    assert_eq!(body.extension_options.len(), 1);

    let encoded = STANDARD.encode(&tx_raw);
    let mut node = CosmosMockBuilder::new().await;
    let _simulated = node.mock_simulate_ok(&encoded).await;
    let _broadcast = node.mock_broadcast(&encoded, 0, "77EE", "[]").await;

    let result = pipeline(vec![node.url()]).broadcast(EVMOS, &tx_raw).await;
    assert_eq!(
        BroadcastReport::from_result(&result),
        BroadcastReport { error: None, tx_hash: Some("77EE".to_string()) }
    );
}

#[tokio::test]
async fn test_stale_sequence_is_stopped_at_simulation() {
    let tx_raw = assembled(42).sign_direct.into_tx_raw(&[1u8; 65]);

    let mut node = CosmosMockBuilder::new().await;
    let _rejected = node
        .mock_simulate_error(
            "account sequence mismatch, expected 43, got 42: incorrect account sequence",
        )
        .await;
    let untouched = node.mock_never("POST", "/cosmos/tx/v1beta1/txs").await;

    let pipeline = pipeline(vec![node.url()]);
    let outcome = pipeline.simulate(EVMOS, &tx_raw).await.unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.kind, Some(RejectionKind::SequenceMismatch));

    let result = pipeline.broadcast(EVMOS, &tx_raw).await;
    let report = BroadcastReport::from_result(&result);
    assert_eq!(report.error.as_deref(), Some("Sequence mismatch, please try again"));
    assert!(result.unwrap_err().is_retryable());
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_check_tx_rejection_is_classified() {
    let tx_raw = assembled(43).sign_direct.into_tx_raw(&[2u8; 65]);
    let encoded = STANDARD.encode(&tx_raw);

    let mut node = CosmosMockBuilder::new().await;
    let _simulated = node.mock_simulate_ok(&encoded).await;
    let _broadcast = node
        .mock_broadcast(
            &encoded,
            5,
            "",
            "spendable balance 10aevmos is smaller than 241500000000000000aevmos: insufficient funds",
        )
        .await;

    let err = pipeline(vec![node.url()]).broadcast(EVMOS, &tx_raw).await.unwrap_err();
    match err {
        GatewayError::ChainRejection { kind, .. } => {
            assert_eq!(kind, RejectionKind::InsufficientFunds);
            assert!(!kind.is_retryable());
        }
        other => panic!("expected ChainRejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_simulation_bad_request_is_propagated() {
    let mut node = CosmosMockBuilder::new().await;
    let _rejected = node
        .mock_simulate_status(400, r#"{"code":2,"message":"tx parse error","details":[]}"#)
        .await;
    let untouched = node.mock_never("POST", "/cosmos/tx/v1beta1/txs").await;

    let err = pipeline(vec![node.url()])
        .broadcast(EVMOS, &assembled(43).sign_direct.into_tx_raw(&[3u8; 65]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::BadRequest(ref message) if message == "tx parse error"));
    untouched.assert_async().await;
}
