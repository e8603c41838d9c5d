//! Cosmos chain id parsing.
//!
//! IBC chain ids end in `-<revision>` (`cosmoshub-4`, `osmosis-1`). Ethermint chains additionally
//! embed their EVM chain id: `<name>_<evmChainId>-<revision>` (`evmos_9001-2`).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid EVM chain id {chain_id:?}: expected <name>_<number>-<revision>")]
pub struct ChainIdError {
    pub chain_id: String,
}

/// Parsed ethermint-style chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmChainId {
    pub evm_chain_id: u64,
    pub revision: u64,
}

impl EvmChainId {
    /// Parses `<name>_<evmChainId>-<revision>`.
    ///
    /// `name` is one or more lowercase ASCII letters; both numbers are positive and written
    /// without leading zeros.
    ///
    /// # Errors
    ///
    /// Returns [`ChainIdError`] if `chain_id` does not follow that layout.
    pub fn parse(chain_id: &str) -> Result<Self, ChainIdError> {
        let err = || ChainIdError { chain_id: chain_id.to_string() };

        let (name, rest) = chain_id.split_once('_').ok_or_else(err)?;
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(err());
        }
        let (evm, revision) = rest.split_once('-').ok_or_else(err)?;

        Ok(Self {
            evm_chain_id: parse_positive(evm).ok_or_else(err)?,
            revision: parse_positive(revision).ok_or_else(err)?,
        })
    }

    /// EVM chain id as an EIP-712 `uint256` hex string (`9001` → `0x2329`).
    #[must_use]
    pub fn hex(&self) -> String {
        format!("0x{:x}", self.evm_chain_id)
    }
}

impl fmt::Display for EvmChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.evm_chain_id)
    }
}

fn parse_positive(digits: &str) -> Option<u64> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// IBC revision number of a chain id: the numeric suffix after the last `-`, or `0` when the id
/// carries none.
#[must_use]
pub fn revision_number(chain_id: &str) -> u64 {
    chain_id
        .rsplit_once('-')
        .and_then(|(_, suffix)| suffix.parse().ok())
        .unwrap_or(0)
}
