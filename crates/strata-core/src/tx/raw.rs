//! Joining wallet signatures into broadcastable `TxRaw` bytes.

use super::{
    assembler::{Eip712Encoding, SignEncoding},
    proto::{self, type_url},
    AssemblyError,
};
use prost::Message;

impl SignEncoding {
    /// Protobuf `TxRaw` carrying this encoding's body and auth info and `signature`.
    #[must_use]
    pub fn into_tx_raw(self, signature: &[u8]) -> Vec<u8> {
        proto::TxRaw {
            body_bytes: self.body_bytes,
            auth_info_bytes: self.auth_info_bytes,
            signatures: vec![signature.to_vec()],
        }
        .encode_to_vec()
    }
}

/// Builds the `TxRaw` for an EIP-712 signature.
///
/// Ethermint verifies web3 signatures through the `ExtensionOptionsWeb3Tx` extension rather than
/// the signature list, so the body gains the extension and the `TxRaw` carries a single empty
/// signature.
///
/// # Errors
///
/// [`AssemblyError::InvalidSignature`] if `signature_hex` is not a 65-byte hex signature,
/// [`AssemblyError::Decode`] if the body bytes are corrupt.
pub fn join_eip712_signature(
    eip712: &Eip712Encoding,
    fee_payer: &str,
    signature_hex: &str,
) -> Result<Vec<u8>, AssemblyError> {
    let signature = decode_signature(signature_hex)?;

    let mut body = proto::TxBody::decode(eip712.body_bytes.as_slice())?;
    body.extension_options.push(proto::Any {
        type_url: type_url::EXTENSION_OPTIONS_WEB3_TX.to_string(),
        value: proto::ExtensionOptionsWeb3Tx {
            typed_data_chain_id: eip712.evm_chain_id,
            fee_payer: fee_payer.to_string(),
            fee_payer_sig: signature,
        }
        .encode_to_vec(),
    });

    Ok(proto::TxRaw {
        body_bytes: body.encode_to_vec(),
        auth_info_bytes: eip712.auth_info_bytes.clone(),
        signatures: vec![Vec::new()],
    }
    .encode_to_vec())
}

fn decode_signature(signature_hex: &str) -> Result<Vec<u8>, AssemblyError> {
    let trimmed = signature_hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let signature =
        hex::decode(digits).map_err(|e| AssemblyError::InvalidSignature(e.to_string()))?;
    if signature.len() != 65 {
        return Err(AssemblyError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    Ok(signature)
}
