//! EIP-712 typed data for ethermint's legacy web3 signing path.
//!
//! The typed message is the Amino `StdSignDoc` with `fee.feePayer` added, described by the fixed
//! `Tx` / `Fee` / `Coin` / `Msg` types plus the per-message `MsgValue` schema. Hashing goes
//! through `alloy-dyn-abi`'s resolver; [`TypedData::digest`] yields the 32 bytes wallets sign.

use super::{messages::CosmosMsg, AssemblyError};
use crate::chain::chain_id::EvmChainId;
use alloy_dyn_abi::eip712::{PropertyDef, Resolver, TypeDef};
use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const DOMAIN_NAME: &str = "Cosmos Web3";
pub const DOMAIN_VERSION: &str = "1.0.0";
pub const VERIFYING_CONTRACT: &str = "cosmos";
pub const SALT: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedField {
    #[must_use]
    pub fn new(name: &str, kind: &str) -> Self {
        Self { name: name.to_string(), kind: kind.to_string() }
    }
}

/// `eth_signTypedData_v4` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

impl TypedData {
    /// Builds the typed data for a single-message transaction.
    #[must_use]
    pub fn for_cosmos_tx(
        sign_doc: &Value,
        msg: &CosmosMsg,
        chain: &EvmChainId,
        fee_payer: &str,
    ) -> Self {
        let mut types = msg.eip712_types();
        types.insert(
            "EIP712Domain".into(),
            vec![
                TypedField::new("name", "string"),
                TypedField::new("version", "string"),
                TypedField::new("chainId", "uint256"),
                TypedField::new("verifyingContract", "string"),
                TypedField::new("salt", "string"),
            ],
        );
        types.insert(
            "Tx".into(),
            vec![
                TypedField::new("account_number", "string"),
                TypedField::new("chain_id", "string"),
                TypedField::new("fee", "Fee"),
                TypedField::new("memo", "string"),
                TypedField::new("msgs", "Msg[]"),
                TypedField::new("sequence", "string"),
            ],
        );
        types.insert(
            "Fee".into(),
            vec![
                TypedField::new("feePayer", "string"),
                TypedField::new("amount", "Coin[]"),
                TypedField::new("gas", "string"),
            ],
        );
        types.insert(
            "Coin".into(),
            vec![TypedField::new("denom", "string"), TypedField::new("amount", "string")],
        );
        types.insert(
            "Msg".into(),
            vec![TypedField::new("type", "string"), TypedField::new("value", "MsgValue")],
        );

        let mut message = sign_doc.clone();
        if let Some(fee) = message.get_mut("fee").and_then(Value::as_object_mut) {
            fee.insert("feePayer".into(), Value::String(fee_payer.to_string()));
        }

        Self {
            types,
            primary_type: "Tx".into(),
            domain: json!({
                "name": DOMAIN_NAME,
                "version": DOMAIN_VERSION,
                "chainId": chain.hex(),
                "verifyingContract": VERIFYING_CONTRACT,
                "salt": SALT,
            }),
            message,
        }
    }

    /// `keccak256(0x19 ‖ 0x01 ‖ hashStruct(domain) ‖ hashStruct(message))`.
    ///
    /// The domain is hashed through the declared `EIP712Domain` type rather than the standard
    /// one, since ethermint declares `verifyingContract` and `salt` as strings.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::Encode`] when a type is undefined or a value does not fit its type.
    pub fn digest(&self) -> Result<[u8; 32], AssemblyError> {
        let resolver = self.resolver()?;
        let domain = self.with_defaults("EIP712Domain", &self.domain);
        let message = self.with_defaults(&self.primary_type, &self.message);
        let domain_separator = hash_struct(&resolver, "EIP712Domain", &domain)?;
        let message_hash = hash_struct(&resolver, &self.primary_type, &message)?;

        let mut preimage = Vec::with_capacity(66);
        preimage.extend_from_slice(&[0x19, 0x01]);
        preimage.extend_from_slice(domain_separator.as_slice());
        preimage.extend_from_slice(message_hash.as_slice());
        Ok(keccak256(preimage).0)
    }

    /// `encodeType`: the primary type followed by its referenced types in alphabetical order.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::Encode`] when `primary` is undefined.
    pub fn encode_type(&self, primary: &str) -> Result<String, AssemblyError> {
        self.resolver()?.encode_type(primary).map_err(encode_error)
    }

    /// Amino JSON omits zero values (`timeout_timestamp: 0`, an empty `timeout_height`).
    /// Absent or null members take their type's zero value and undeclared members are dropped,
    /// so the value coerces against the declared schema.
    fn with_defaults(&self, kind: &str, value: &Value) -> Value {
        if let Some(item) = array_item(kind) {
            return match value {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|v| self.with_defaults(item, v)).collect())
                }
                _ => Value::Array(Vec::new()),
            };
        }
        let Some(fields) = self.types.get(kind) else {
            return match value {
                Value::Null => zero_value(kind),
                other => other.clone(),
            };
        };
        let object = value.as_object();
        let filled = fields
            .iter()
            .map(|field| {
                let member = object.and_then(|o| o.get(&field.name)).unwrap_or(&Value::Null);
                (field.name.clone(), self.with_defaults(&field.kind, member))
            })
            .collect();
        Value::Object(filled)
    }

    fn resolver(&self) -> Result<Resolver, AssemblyError> {
        let mut resolver = Resolver::default();
        for (name, fields) in &self.types {
            let props = fields
                .iter()
                .map(|f| PropertyDef::new(f.kind.as_str(), f.name.as_str()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(encode_error)?;
            resolver.ingest(TypeDef::new(name.as_str(), props).map_err(encode_error)?);
        }
        Ok(resolver)
    }
}

fn hash_struct(resolver: &Resolver, name: &str, value: &Value) -> Result<B256, AssemblyError> {
    let value =
        resolver.resolve(name).and_then(|ty| ty.coerce_json(value)).map_err(encode_error)?;
    let data = resolver
        .encode_data(&value)
        .map_err(encode_error)?
        .ok_or_else(|| AssemblyError::Encode(format!("EIP-712 type {name} is not a struct")))?;

    let mut encoded = resolver.type_hash(name).map_err(encode_error)?.to_vec();
    encoded.extend_from_slice(&data);
    Ok(keccak256(encoded))
}

fn array_item(kind: &str) -> Option<&str> {
    kind.strip_suffix(']').and_then(|k| k.rsplit_once('[')).map(|(item, _)| item)
}

fn zero_value(kind: &str) -> Value {
    match kind {
        "string" => Value::String(String::new()),
        "bool" => Value::Bool(false),
        "bytes" => Value::String("0x".into()),
        "address" => Value::String(Address::ZERO.to_string()),
        k if k.starts_with("uint") || k.starts_with("int") => Value::String("0".into()),
        k if k.starts_with("bytes") => {
            let len = k["bytes".len()..].parse::<usize>().unwrap_or(0);
            Value::String(format!("0x{}", "00".repeat(len)))
        }
        _ => Value::Null,
    }
}

fn encode_error(error: alloy_dyn_abi::Error) -> AssemblyError {
    AssemblyError::Encode(error.to_string())
}
