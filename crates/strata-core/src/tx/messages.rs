//! Supported transaction messages and their per-encoding renderings.
//!
//! Each variant knows its protobuf `Any`, its Amino JSON `{"type", "value"}` object and its
//! EIP-712 `MsgValue` schema. Field order in every rendering follows the `.proto` definition.

use super::{
    address::{evm_to_bech32, parse_evm_address, validate_address, PrefixRule},
    amino::{coin_json, insert_i64, insert_str, insert_u64},
    eip712::TypedField,
    proto::{self, type_url},
    validate_amount, AssemblyError, Coin,
};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Governance vote option. `UNSPECIFIED` is not a valid vote and is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes = 1,
    Abstain = 2,
    No = 3,
    NoWithVeto = 4,
}

impl TryFrom<i32> for VoteOption {
    type Error = AssemblyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Yes),
            2 => Ok(Self::Abstain),
            3 => Ok(Self::No),
            4 => Ok(Self::NoWithVeto),
            other => Err(AssemblyError::Decode(format!("invalid vote option {other}"))),
        }
    }
}

/// IBC timeout height on the counterparty chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IbcHeight {
    pub revision_number: u64,
    pub revision_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CosmosMsg {
    Send {
        from_address: String,
        to_address: String,
        amount: Vec<Coin>,
    },
    Delegate {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
    },
    Undelegate {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
    },
    BeginRedelegate {
        delegator_address: String,
        validator_src_address: String,
        validator_dst_address: String,
        amount: Coin,
    },
    WithdrawDelegatorReward {
        delegator_address: String,
        validator_address: String,
    },
    /// Returns tokens still unbonding since `creation_height` to the validator.
    CancelUnbondingDelegation {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
        creation_height: i64,
    },
    Vote {
        proposal_id: u64,
        voter: String,
        option: VoteOption,
    },
    /// ICS-20 fungible token transfer.
    Transfer {
        source_port: String,
        source_channel: String,
        token: Coin,
        sender: String,
        receiver: String,
        #[serde(default)]
        timeout_height: IbcHeight,
        #[serde(default)]
        timeout_timestamp: u64,
        #[serde(default)]
        memo: String,
    },
    /// Native coin to its ERC-20 token; `receiver` is a hex EVM address.
    ConvertCoin {
        coin: Coin,
        receiver: String,
        sender: String,
    },
    /// ERC-20 token back to the native coin; `sender` is a hex EVM address.
    ConvertErc20 {
        contract_address: String,
        amount: String,
        receiver: String,
        sender: String,
    },
}

impl CosmosMsg {
    #[must_use]
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Send { .. } => type_url::MSG_SEND,
            Self::Delegate { .. } => type_url::MSG_DELEGATE,
            Self::Undelegate { .. } => type_url::MSG_UNDELEGATE,
            Self::BeginRedelegate { .. } => type_url::MSG_BEGIN_REDELEGATE,
            Self::WithdrawDelegatorReward { .. } => type_url::MSG_WITHDRAW_DELEGATOR_REWARD,
            Self::CancelUnbondingDelegation { .. } => type_url::MSG_CANCEL_UNBONDING_DELEGATION,
            Self::Vote { .. } => type_url::MSG_VOTE,
            Self::Transfer { .. } => type_url::MSG_TRANSFER,
            Self::ConvertCoin { .. } => type_url::MSG_CONVERT_COIN,
            Self::ConvertErc20 { .. } => type_url::MSG_CONVERT_ERC20,
        }
    }

    /// Registered Amino name, the `type` of the Amino JSON object.
    #[must_use]
    pub fn amino_name(&self) -> &'static str {
        match self {
            Self::Send { .. } => "cosmos-sdk/MsgSend",
            Self::Delegate { .. } => "cosmos-sdk/MsgDelegate",
            Self::Undelegate { .. } => "cosmos-sdk/MsgUndelegate",
            Self::BeginRedelegate { .. } => "cosmos-sdk/MsgBeginRedelegate",
            Self::WithdrawDelegatorReward { .. } => "cosmos-sdk/MsgWithdrawDelegationReward",
            Self::CancelUnbondingDelegation { .. } => "cosmos-sdk/MsgCancelUnbondingDelegation",
            Self::Vote { .. } => "cosmos-sdk/MsgVote",
            Self::Transfer { .. } => "cosmos-sdk/MsgTransfer",
            Self::ConvertCoin { .. } => "evmos/MsgConvertCoin",
            Self::ConvertErc20 { .. } => "evmos/MsgConvertERC20",
        }
    }

    /// Bech32 account whose signature the message requires. A hex sender is mapped onto the
    /// account with the same bytes under `prefix`.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::InvalidAddress`] for a malformed hex sender.
    pub fn signer(&self, prefix: &str) -> Result<String, AssemblyError> {
        let signer = match self {
            Self::Send { from_address, .. } => from_address,
            Self::Delegate { delegator_address, .. }
            | Self::Undelegate { delegator_address, .. }
            | Self::BeginRedelegate { delegator_address, .. }
            | Self::WithdrawDelegatorReward { delegator_address, .. }
            | Self::CancelUnbondingDelegation { delegator_address, .. } => delegator_address,
            Self::Vote { voter, .. } => voter,
            Self::Transfer { sender, .. } | Self::ConvertCoin { sender, .. } => sender,
            Self::ConvertErc20 { sender, .. } => return evm_to_bech32(sender, prefix),
        };
        Ok(signer.clone())
    }

    /// Checks addresses and amounts. Account addresses must carry `prefix`, validator addresses
    /// `<prefix>valoper`; IBC receivers may use any prefix.
    ///
    /// # Errors
    ///
    /// The first invalid address, amount or denom found.
    pub fn validate(&self, prefix: &str) -> Result<(), AssemblyError> {
        let account = PrefixRule::Exact(prefix);
        let validator = PrefixRule::Validator(prefix);
        match self {
            Self::Send { from_address, to_address, amount } => {
                validate_address(from_address, account)?;
                validate_address(to_address, account)?;
                if amount.is_empty() {
                    return Err(AssemblyError::InvalidAmount(String::new()));
                }
                amount.iter().try_for_each(Coin::validate)
            }
            Self::Delegate { delegator_address, validator_address, amount }
            | Self::Undelegate { delegator_address, validator_address, amount } => {
                validate_address(delegator_address, account)?;
                validate_address(validator_address, validator)?;
                amount.validate()
            }
            Self::BeginRedelegate {
                delegator_address,
                validator_src_address,
                validator_dst_address,
                amount,
            } => {
                validate_address(delegator_address, account)?;
                validate_address(validator_src_address, validator)?;
                validate_address(validator_dst_address, validator)?;
                amount.validate()
            }
            Self::WithdrawDelegatorReward { delegator_address, validator_address } => {
                validate_address(delegator_address, account)?;
                validate_address(validator_address, validator)
            }
            Self::CancelUnbondingDelegation {
                delegator_address,
                validator_address,
                amount,
                creation_height,
            } => {
                validate_address(delegator_address, account)?;
                validate_address(validator_address, validator)?;
                if *creation_height <= 0 {
                    return Err(AssemblyError::InvalidHeight(*creation_height));
                }
                amount.validate()
            }
            Self::Vote { voter, .. } => validate_address(voter, account),
            Self::Transfer { token, sender, receiver, .. } => {
                validate_address(sender, account)?;
                validate_address(receiver, PrefixRule::Any)?;
                token.validate()
            }
            Self::ConvertCoin { coin, receiver, sender } => {
                validate_address(sender, account)?;
                parse_evm_address(receiver)?;
                coin.validate()
            }
            Self::ConvertErc20 { contract_address, amount, receiver, sender } => {
                parse_evm_address(contract_address)?;
                parse_evm_address(sender)?;
                validate_address(receiver, account)?;
                validate_amount(amount)
            }
        }
    }

    /// Protobuf encoding wrapped in `Any`.
    #[must_use]
    pub fn to_any(&self) -> proto::Any {
        let value = match self.clone() {
            Self::Send { from_address, to_address, amount } => proto::MsgSend {
                from_address,
                to_address,
                amount: amount.iter().map(Coin::to_proto).collect(),
            }
            .encode_to_vec(),
            Self::Delegate { delegator_address, validator_address, amount }
            | Self::Undelegate { delegator_address, validator_address, amount } => {
                proto::MsgDelegate {
                    delegator_address,
                    validator_address,
                    amount: Some(amount.to_proto()),
                }
                .encode_to_vec()
            }
            Self::BeginRedelegate {
                delegator_address,
                validator_src_address,
                validator_dst_address,
                amount,
            } => proto::MsgBeginRedelegate {
                delegator_address,
                validator_src_address,
                validator_dst_address,
                amount: Some(amount.to_proto()),
            }
            .encode_to_vec(),
            Self::WithdrawDelegatorReward { delegator_address, validator_address } => {
                proto::MsgWithdrawDelegatorReward { delegator_address, validator_address }
                    .encode_to_vec()
            }
            Self::CancelUnbondingDelegation {
                delegator_address,
                validator_address,
                amount,
                creation_height,
            } => proto::MsgCancelUnbondingDelegation {
                delegator_address,
                validator_address,
                amount: Some(amount.to_proto()),
                creation_height,
            }
            .encode_to_vec(),
            Self::Vote { proposal_id, voter, option } => {
                proto::MsgVote { proposal_id, voter, option: option as i32 }.encode_to_vec()
            }
            Self::Transfer {
                source_port,
                source_channel,
                token,
                sender,
                receiver,
                timeout_height,
                timeout_timestamp,
                memo,
            } => proto::MsgTransfer {
                source_port,
                source_channel,
                token: Some(token.to_proto()),
                sender,
                receiver,
                timeout_height: Some(proto::Height {
                    revision_number: timeout_height.revision_number,
                    revision_height: timeout_height.revision_height,
                }),
                timeout_timestamp,
                memo,
            }
            .encode_to_vec(),
            Self::ConvertCoin { coin, receiver, sender } => {
                proto::MsgConvertCoin { coin: Some(coin.to_proto()), receiver, sender }
                    .encode_to_vec()
            }
            Self::ConvertErc20 { contract_address, amount, receiver, sender } => {
                proto::MsgConvertErc20 { contract_address, amount, receiver, sender }.encode_to_vec()
            }
        };
        proto::Any { type_url: self.type_url().to_string(), value }
    }

    /// Inverse of [`to_any`](Self::to_any).
    ///
    /// # Errors
    ///
    /// [`AssemblyError::UnsupportedMessage`] for unknown type URLs, [`AssemblyError::Decode`]
    /// for malformed payloads.
    pub fn from_any(any: &proto::Any) -> Result<Self, AssemblyError> {
        let bytes = any.value.as_slice();
        let required = |coin: Option<proto::Coin>, field: &str| {
            coin.map(Coin::from_proto)
                .ok_or_else(|| AssemblyError::Decode(format!("{}: missing {field}", any.type_url)))
        };

        let msg = match any.type_url.as_str() {
            type_url::MSG_SEND => {
                let m = proto::MsgSend::decode(bytes)?;
                Self::Send {
                    from_address: m.from_address,
                    to_address: m.to_address,
                    amount: m.amount.into_iter().map(Coin::from_proto).collect(),
                }
            }
            type_url::MSG_DELEGATE => {
                let m = proto::MsgDelegate::decode(bytes)?;
                Self::Delegate {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                    amount: required(m.amount, "amount")?,
                }
            }
            type_url::MSG_UNDELEGATE => {
                let m = proto::MsgDelegate::decode(bytes)?;
                Self::Undelegate {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                    amount: required(m.amount, "amount")?,
                }
            }
            type_url::MSG_BEGIN_REDELEGATE => {
                let m = proto::MsgBeginRedelegate::decode(bytes)?;
                Self::BeginRedelegate {
                    delegator_address: m.delegator_address,
                    validator_src_address: m.validator_src_address,
                    validator_dst_address: m.validator_dst_address,
                    amount: required(m.amount, "amount")?,
                }
            }
            type_url::MSG_WITHDRAW_DELEGATOR_REWARD => {
                let m = proto::MsgWithdrawDelegatorReward::decode(bytes)?;
                Self::WithdrawDelegatorReward {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                }
            }
            type_url::MSG_CANCEL_UNBONDING_DELEGATION => {
                let m = proto::MsgCancelUnbondingDelegation::decode(bytes)?;
                Self::CancelUnbondingDelegation {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                    amount: required(m.amount, "amount")?,
                    creation_height: m.creation_height,
                }
            }
            type_url::MSG_VOTE => {
                let m = proto::MsgVote::decode(bytes)?;
                Self::Vote {
                    proposal_id: m.proposal_id,
                    voter: m.voter,
                    option: VoteOption::try_from(m.option)?,
                }
            }
            type_url::MSG_TRANSFER => {
                let m = proto::MsgTransfer::decode(bytes)?;
                let height = m.timeout_height.unwrap_or_default();
                Self::Transfer {
                    source_port: m.source_port,
                    source_channel: m.source_channel,
                    token: required(m.token, "token")?,
                    sender: m.sender,
                    receiver: m.receiver,
                    timeout_height: IbcHeight {
                        revision_number: height.revision_number,
                        revision_height: height.revision_height,
                    },
                    timeout_timestamp: m.timeout_timestamp,
                    memo: m.memo,
                }
            }
            type_url::MSG_CONVERT_COIN => {
                let m = proto::MsgConvertCoin::decode(bytes)?;
                Self::ConvertCoin {
                    coin: required(m.coin, "coin")?,
                    receiver: m.receiver,
                    sender: m.sender,
                }
            }
            type_url::MSG_CONVERT_ERC20 => {
                let m = proto::MsgConvertErc20::decode(bytes)?;
                Self::ConvertErc20 {
                    contract_address: m.contract_address,
                    amount: m.amount,
                    receiver: m.receiver,
                    sender: m.sender,
                }
            }
            other => return Err(AssemblyError::UnsupportedMessage(other.to_string())),
        };
        Ok(msg)
    }

    /// Amino JSON object `{"type": <amino name>, "value": {...}}` with Go `omitempty` semantics.
    #[must_use]
    pub fn amino_json(&self) -> Value {
        let mut value = Map::new();
        match self {
            Self::Send { from_address, to_address, amount } => {
                insert_str(&mut value, "from_address", from_address);
                insert_str(&mut value, "to_address", to_address);
                value.insert("amount".into(), amount.iter().map(coin_json).collect());
            }
            Self::Delegate { delegator_address, validator_address, amount }
            | Self::Undelegate { delegator_address, validator_address, amount } => {
                insert_str(&mut value, "delegator_address", delegator_address);
                insert_str(&mut value, "validator_address", validator_address);
                value.insert("amount".into(), coin_json(amount));
            }
            Self::BeginRedelegate {
                delegator_address,
                validator_src_address,
                validator_dst_address,
                amount,
            } => {
                insert_str(&mut value, "delegator_address", delegator_address);
                insert_str(&mut value, "validator_src_address", validator_src_address);
                insert_str(&mut value, "validator_dst_address", validator_dst_address);
                value.insert("amount".into(), coin_json(amount));
            }
            Self::WithdrawDelegatorReward { delegator_address, validator_address } => {
                insert_str(&mut value, "delegator_address", delegator_address);
                insert_str(&mut value, "validator_address", validator_address);
            }
            Self::CancelUnbondingDelegation {
                delegator_address,
                validator_address,
                amount,
                creation_height,
            } => {
                insert_str(&mut value, "delegator_address", delegator_address);
                insert_str(&mut value, "validator_address", validator_address);
                value.insert("amount".into(), coin_json(amount));
                insert_i64(&mut value, "creation_height", *creation_height);
            }
            Self::Vote { proposal_id, voter, option } => {
                insert_u64(&mut value, "proposal_id", *proposal_id);
                insert_str(&mut value, "voter", voter);
                value.insert("option".into(), json!(*option as i32));
            }
            Self::Transfer {
                source_port,
                source_channel,
                token,
                sender,
                receiver,
                timeout_height,
                timeout_timestamp,
                memo,
            } => {
                insert_str(&mut value, "source_port", source_port);
                insert_str(&mut value, "source_channel", source_channel);
                value.insert("token".into(), coin_json(token));
                insert_str(&mut value, "sender", sender);
                insert_str(&mut value, "receiver", receiver);
                // non-nullable: the key stays even when both numbers are zero
                let mut height = Map::new();
                insert_u64(&mut height, "revision_number", timeout_height.revision_number);
                insert_u64(&mut height, "revision_height", timeout_height.revision_height);
                value.insert("timeout_height".into(), Value::Object(height));
                insert_u64(&mut value, "timeout_timestamp", *timeout_timestamp);
                insert_str(&mut value, "memo", memo);
            }
            Self::ConvertCoin { coin, receiver, sender } => {
                value.insert("coin".into(), coin_json(coin));
                insert_str(&mut value, "receiver", receiver);
                insert_str(&mut value, "sender", sender);
            }
            Self::ConvertErc20 { contract_address, amount, receiver, sender } => {
                insert_str(&mut value, "contract_address", contract_address);
                insert_str(&mut value, "amount", amount);
                insert_str(&mut value, "receiver", receiver);
                insert_str(&mut value, "sender", sender);
            }
        }
        json!({ "type": self.amino_name(), "value": value })
    }

    /// EIP-712 types describing this message: `MsgValue` plus its nested `Type<Field>` structs.
    #[must_use]
    pub fn eip712_types(&self) -> BTreeMap<String, Vec<TypedField>> {
        let coin_type = || vec![TypedField::new("denom", "string"), TypedField::new("amount", "string")];
        let mut types = BTreeMap::new();

        let msg_value = match self {
            Self::Send { .. } => {
                types.insert("TypeAmount".to_string(), coin_type());
                vec![
                    TypedField::new("from_address", "string"),
                    TypedField::new("to_address", "string"),
                    TypedField::new("amount", "TypeAmount[]"),
                ]
            }
            Self::Delegate { .. } | Self::Undelegate { .. } => {
                types.insert("TypeAmount".to_string(), coin_type());
                vec![
                    TypedField::new("delegator_address", "string"),
                    TypedField::new("validator_address", "string"),
                    TypedField::new("amount", "TypeAmount"),
                ]
            }
            Self::BeginRedelegate { .. } => {
                types.insert("TypeAmount".to_string(), coin_type());
                vec![
                    TypedField::new("delegator_address", "string"),
                    TypedField::new("validator_src_address", "string"),
                    TypedField::new("validator_dst_address", "string"),
                    TypedField::new("amount", "TypeAmount"),
                ]
            }
            Self::WithdrawDelegatorReward { .. } => vec![
                TypedField::new("delegator_address", "string"),
                TypedField::new("validator_address", "string"),
            ],
            Self::CancelUnbondingDelegation { .. } => {
                types.insert("TypeAmount".to_string(), coin_type());
                vec![
                    TypedField::new("delegator_address", "string"),
                    TypedField::new("validator_address", "string"),
                    TypedField::new("amount", "TypeAmount"),
                    TypedField::new("creation_height", "int64"),
                ]
            }
            Self::Vote { .. } => vec![
                TypedField::new("proposal_id", "uint64"),
                TypedField::new("voter", "string"),
                TypedField::new("option", "int32"),
            ],
            Self::Transfer { memo, .. } => {
                types.insert("TypeToken".to_string(), coin_type());
                types.insert(
                    "TypeTimeoutHeight".to_string(),
                    vec![
                        TypedField::new("revision_number", "uint64"),
                        TypedField::new("revision_height", "uint64"),
                    ],
                );
                let mut fields = vec![
                    TypedField::new("source_port", "string"),
                    TypedField::new("source_channel", "string"),
                    TypedField::new("token", "TypeToken"),
                    TypedField::new("sender", "string"),
                    TypedField::new("receiver", "string"),
                    TypedField::new("timeout_height", "TypeTimeoutHeight"),
                    TypedField::new("timeout_timestamp", "uint64"),
                ];
                if !memo.is_empty() {
                    fields.push(TypedField::new("memo", "string"));
                }
                fields
            }
            Self::ConvertCoin { .. } => {
                types.insert("TypeCoin".to_string(), coin_type());
                vec![
                    TypedField::new("coin", "TypeCoin"),
                    TypedField::new("receiver", "string"),
                    TypedField::new("sender", "string"),
                ]
            }
            Self::ConvertErc20 { .. } => vec![
                TypedField::new("contract_address", "string"),
                TypedField::new("amount", "string"),
                TypedField::new("receiver", "string"),
                TypedField::new("sender", "string"),
            ],
        };
        types.insert("MsgValue".to_string(), msg_value);
        types
    }
}
