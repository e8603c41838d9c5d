//! Bech32 address checks, account derivation from public keys and EVM hex addresses.

use super::{AssemblyError, PubKeyType, PUB_KEY_LEN};
use alloy_primitives::{keccak256, Address};
use bech32::{Bech32, Hrp};
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Suffix appended to an account prefix to form the validator operator prefix.
pub const VALOPER_SUFFIX: &str = "valoper";

/// Which human-readable part an address must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRule<'a> {
    /// Exactly this prefix.
    Exact(&'a str),
    /// The validator operator prefix of this account prefix.
    Validator(&'a str),
    /// Any well-formed prefix (cross-chain receivers).
    Any,
}

/// Decodes `address` and returns its prefix.
///
/// # Errors
///
/// [`AssemblyError::InvalidAddress`] when the string is not lowercase bech32 or its payload is
/// not a 20 or 32 byte account.
pub fn decode_prefix(address: &str) -> Result<String, AssemblyError> {
    let invalid = |reason: String| AssemblyError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    if address.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(invalid("address must be lowercase".into()));
    }
    let (hrp, data) = bech32::decode(address).map_err(|e| invalid(e.to_string()))?;
    if data.len() != 20 && data.len() != 32 {
        return Err(invalid(format!("unexpected payload length {}", data.len())));
    }
    Ok(hrp.to_lowercase())
}

/// Validates `address` against `rule`.
///
/// # Errors
///
/// [`AssemblyError::InvalidAddress`] on malformed input or a prefix mismatch.
pub fn validate_address(address: &str, rule: PrefixRule<'_>) -> Result<(), AssemblyError> {
    let prefix = decode_prefix(address)?;
    let expected = match rule {
        PrefixRule::Any => return Ok(()),
        PrefixRule::Exact(prefix) => prefix.to_string(),
        PrefixRule::Validator(prefix) => format!("{prefix}{VALOPER_SUFFIX}"),
    };
    if prefix == expected {
        Ok(())
    } else {
        Err(AssemblyError::InvalidAddress {
            address: address.to_string(),
            reason: format!("expected prefix {expected}, got {prefix}"),
        })
    }
}

/// Bech32 account address of a compressed public key.
///
/// `secp256k1` accounts are `RIPEMD-160(SHA-256(key))`. `eth_secp256k1` accounts are the key's
/// EVM address: the last 20 bytes of Keccak-256 over the uncompressed point.
///
/// # Errors
///
/// [`AssemblyError::InvalidPubKey`] unless `pub_key` is a 33-byte point on the curve,
/// [`AssemblyError::InvalidAddress`] for an unusable prefix.
pub fn derive_address(
    pub_key: &[u8],
    key_type: PubKeyType,
    prefix: &str,
) -> Result<String, AssemblyError> {
    if pub_key.len() != PUB_KEY_LEN {
        return Err(AssemblyError::InvalidPubKey(format!(
            "expected {PUB_KEY_LEN} bytes, got {}",
            pub_key.len()
        )));
    }
    let point = PublicKey::from_sec1_bytes(pub_key)
        .map_err(|_| AssemblyError::InvalidPubKey("not a secp256k1 point".into()))?;

    let mut account = [0u8; 20];
    match key_type {
        PubKeyType::Secp256k1 => {
            account.copy_from_slice(&Ripemd160::digest(Sha256::digest(pub_key)));
        }
        PubKeyType::EthSecp256k1 => {
            let uncompressed = point.to_encoded_point(false);
            account.copy_from_slice(&keccak256(&uncompressed.as_bytes()[1..])[12..]);
        }
    }
    encode_account(prefix, &account)
}

/// Parses a 20-byte `0x` hex address as used by the ERC-20 module.
///
/// # Errors
///
/// [`AssemblyError::InvalidAddress`] for anything else.
pub fn parse_evm_address(address: &str) -> Result<Address, AssemblyError> {
    if !address.starts_with("0x") {
        return Err(AssemblyError::InvalidAddress {
            address: address.to_string(),
            reason: "expected 0x-prefixed hex".into(),
        });
    }
    address.parse::<Address>().map_err(|e| AssemblyError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// The bech32 account behind an EVM hex address; ethermint maps both onto the same 20 bytes.
///
/// # Errors
///
/// See [`parse_evm_address`].
pub fn evm_to_bech32(address: &str, prefix: &str) -> Result<String, AssemblyError> {
    encode_account(prefix, parse_evm_address(address)?.as_slice())
}

fn encode_account(prefix: &str, account: &[u8]) -> Result<String, AssemblyError> {
    let invalid =
        |reason: String| AssemblyError::InvalidAddress { address: prefix.to_string(), reason };
    let hrp = Hrp::parse(prefix).map_err(|e| invalid(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, account).map_err(|e| invalid(e.to_string()))
}
