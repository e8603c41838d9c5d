use super::{
    address::decode_prefix,
    amino::{coin_json, std_sign_doc, to_canonical_json},
    eip712::TypedData,
    messages::CosmosMsg,
    proto::{self, sign_mode},
    AssemblyError, Coin, LogicalTransaction, Signer, PUB_KEY_LEN,
};
use crate::chain::chain_id::EvmChainId;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use prost::Message;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Body and auth info bytes of one sign mode plus the base64 digest the wallet signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignEncoding {
    #[serde(serialize_with = "as_base64")]
    pub body_bytes: Vec<u8>,
    #[serde(serialize_with = "as_base64")]
    pub auth_info_bytes: Vec<u8>,
    pub sign_bytes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eip712Encoding {
    #[serde(serialize_with = "as_base64")]
    pub body_bytes: Vec<u8>,
    #[serde(serialize_with = "as_base64")]
    pub auth_info_bytes: Vec<u8>,
    pub typed_data: TypedData,
    pub sign_bytes: String,
    pub evm_chain_id: u64,
}

/// All sign encodings of one logical transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledTransaction {
    pub legacy_amino: SignEncoding,
    pub sign_direct: SignEncoding,
    /// Present only for `eth_secp256k1` signers.
    pub eip712: Option<Eip712Encoding>,
    /// The canonical `StdSignDoc` JSON hashed into `legacy_amino.sign_bytes`.
    pub data_signing_amino: String,
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Assembles every sign encoding of `tx`.
///
/// Pure and deterministic: identical inputs produce byte-identical outputs. Before returning,
/// the protobuf encodings are decoded again and checked against the Amino and EIP-712 documents.
///
/// # Errors
///
/// - [`AssemblyError::EmptyMessages`] for a transaction without messages
/// - [`AssemblyError::InvalidAddress`], [`AssemblyError::InvalidAmount`],
///   [`AssemblyError::InvalidDenom`], [`AssemblyError::InvalidPubKey`] for bad inputs
/// - [`AssemblyError::Eip712MultiMessage`] / [`AssemblyError::InvalidChainId`] for
///   `eth_secp256k1` signers whose transaction cannot be expressed as EIP-712
/// - [`AssemblyError::InvariantViolation`] if the encodings disagree
pub fn assemble(tx: &LogicalTransaction) -> Result<AssembledTransaction, AssemblyError> {
    if tx.messages.is_empty() {
        return Err(AssemblyError::EmptyMessages);
    }
    validate_pub_key(&tx.signer.pub_key)?;

    let prefix = decode_prefix(&tx.signer.address)?;
    for msg in &tx.messages {
        msg.validate(&prefix)?;
    }
    tx.fee.amount.validate()?;

    let evm_chain = if tx.signer.key_type.supports_eip712() {
        if tx.messages.len() != 1 {
            return Err(AssemblyError::Eip712MultiMessage(tx.messages.len()));
        }
        Some(EvmChainId::parse(&tx.chain_id)?)
    } else {
        None
    };

    let key_type = tx.signer.key_type;
    let body_bytes = proto::TxBody {
        messages: tx.messages.iter().map(CosmosMsg::to_any).collect(),
        memo: tx.memo.clone(),
        ..Default::default()
    }
    .encode_to_vec();

    let direct_auth = auth_info(tx, sign_mode::DIRECT);
    let sign_doc = proto::SignDoc {
        body_bytes: body_bytes.clone(),
        auth_info_bytes: direct_auth.clone(),
        chain_id: tx.chain_id.clone(),
        account_number: tx.signer.account_number,
    };
    let sign_direct = SignEncoding {
        body_bytes: body_bytes.clone(),
        auth_info_bytes: direct_auth,
        sign_bytes: STANDARD.encode(key_type.hash(&sign_doc.encode_to_vec())),
    };

    let amino_doc = std_sign_doc(
        &tx.chain_id,
        tx.signer.account_number,
        tx.signer.sequence,
        &tx.fee,
        &tx.memo,
        tx.messages.iter().map(CosmosMsg::amino_json).collect(),
    );
    let data_signing_amino = to_canonical_json(&amino_doc);
    let amino_auth = auth_info(tx, sign_mode::LEGACY_AMINO_JSON);
    let legacy_amino = SignEncoding {
        body_bytes: body_bytes.clone(),
        auth_info_bytes: amino_auth.clone(),
        // Hash of the canonical StdSignDoc JSON, which is what SIGN_MODE_LEGACY_AMINO_JSON
        // verifies. Not the proto SignDoc over the amino auth info.
        sign_bytes: STANDARD.encode(key_type.hash(data_signing_amino.as_bytes())),
    };

    let eip712 = match (evm_chain, tx.messages.first()) {
        (Some(chain), Some(msg)) => {
            let fee_payer = msg.signer(&prefix)?;
            let typed_data = TypedData::for_cosmos_tx(&amino_doc, msg, &chain, &fee_payer);
            let digest = typed_data.digest()?;
            Some(Eip712Encoding {
                body_bytes,
                auth_info_bytes: amino_auth,
                typed_data,
                sign_bytes: STANDARD.encode(digest),
                evm_chain_id: chain.evm_chain_id,
            })
        }
        _ => None,
    };

    let assembled = AssembledTransaction { legacy_amino, sign_direct, eip712, data_signing_amino };
    verify_consistency(tx, &assembled, &amino_doc)?;
    Ok(assembled)
}

fn validate_pub_key(key: &[u8]) -> Result<(), AssemblyError> {
    if key.len() != PUB_KEY_LEN {
        return Err(AssemblyError::InvalidPubKey(format!(
            "expected {PUB_KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if !matches!(key[0], 0x02 | 0x03) {
        return Err(AssemblyError::InvalidPubKey("not a compressed secp256k1 key".into()));
    }
    Ok(())
}

fn auth_info(tx: &LogicalTransaction, mode: i32) -> Vec<u8> {
    let Signer { pub_key, key_type, sequence, .. } = &tx.signer;
    proto::AuthInfo {
        signer_infos: vec![proto::SignerInfo {
            public_key: Some(proto::Any {
                type_url: key_type.type_url().to_string(),
                value: proto::PubKey { key: pub_key.clone() }.encode_to_vec(),
            }),
            mode_info: Some(proto::ModeInfo { single: Some(proto::ModeInfoSingle { mode }) }),
            sequence: *sequence,
        }],
        fee: Some(proto::Fee {
            amount: vec![tx.fee.amount.to_proto()],
            gas_limit: tx.fee.gas_limit,
            ..Default::default()
        }),
    }
    .encode_to_vec()
}

/// Decodes the protobuf encodings back and requires them to describe the same transaction as
/// the Amino document and, when present, the EIP-712 message.
fn verify_consistency(
    tx: &LogicalTransaction,
    assembled: &AssembledTransaction,
    amino_doc: &Value,
) -> Result<(), AssemblyError> {
    let violation = |what: &str| Err(AssemblyError::InvariantViolation(what.to_string()));
    let direct = &assembled.sign_direct;
    let amino = &assembled.legacy_amino;

    if direct.body_bytes != amino.body_bytes {
        return violation("body bytes differ between sign modes");
    }

    let body = proto::TxBody::decode(direct.body_bytes.as_slice())?;
    let rederived: Vec<Value> = body
        .messages
        .iter()
        .map(|any| CosmosMsg::from_any(any).map(|msg| msg.amino_json()))
        .collect::<Result<_, _>>()?;
    if amino_doc["msgs"] != Value::Array(rederived) {
        return violation("messages differ between protobuf body and amino document");
    }
    if amino_doc["memo"] != Value::String(body.memo) {
        return violation("memo differs between protobuf body and amino document");
    }

    for (bytes, mode) in [
        (&direct.auth_info_bytes, sign_mode::DIRECT),
        (&amino.auth_info_bytes, sign_mode::LEGACY_AMINO_JSON),
    ] {
        let auth = proto::AuthInfo::decode(bytes.as_slice())?;
        let Some(fee) = auth.fee else {
            return violation("auth info carries no fee");
        };
        let fee_json = json!({
            "amount": fee.amount.into_iter().map(|c| coin_json(&Coin::from_proto(c))).collect::<Vec<_>>(),
            "gas": fee.gas_limit.to_string(),
        });
        if amino_doc["fee"] != fee_json {
            return violation("fee differs between auth info and amino document");
        }
        let [signer] = auth.signer_infos.as_slice() else {
            return violation("auth info must carry exactly one signer");
        };
        let signer_mode = signer.mode_info.as_ref().and_then(|m| m.single.as_ref()).map(|s| s.mode);
        if signer.sequence != tx.signer.sequence || signer_mode != Some(mode) {
            return violation("signer info differs from the signing account");
        }
    }

    if let Some(eip712) = &assembled.eip712 {
        if eip712.body_bytes != direct.body_bytes || eip712.auth_info_bytes != amino.auth_info_bytes
        {
            return violation("EIP-712 encoding does not share the amino bytes");
        }
        let mut message = eip712.typed_data.message.clone();
        let fee_payer = message
            .get_mut("fee")
            .and_then(Value::as_object_mut)
            .and_then(|fee| fee.remove("feePayer"));
        let prefix = decode_prefix(&tx.signer.address)?;
        let expected_payer =
            tx.messages.first().map(|m| m.signer(&prefix)).transpose()?.map(Value::String);
        if fee_payer != expected_payer {
            return violation("EIP-712 fee payer is not the message signer");
        }
        if &message != amino_doc {
            return violation("EIP-712 message differs from amino document");
        }
    }
    Ok(())
}
