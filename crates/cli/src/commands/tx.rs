use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Subcommand;
use strata_core::{broadcast::BroadcastReport, runtime::TransactionRequest, Gateway};

use super::utils::{print_error, print_info, print_json, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum TxCommands {
    /// Build the sign-direct, Amino and EIP-712 encodings for a transaction request
    Prepare {
        /// JSON file holding the transaction request
        #[arg(short, long)]
        request: String,
    },

    /// Dry-run a signed transaction
    Simulate {
        #[arg(short, long)]
        chain: String,

        /// Base64 encoded TxRaw bytes
        tx_bytes: String,
    },

    /// Broadcast a signed transaction in sync mode
    Broadcast {
        #[arg(short, long)]
        chain: String,

        /// Base64 encoded TxRaw bytes
        tx_bytes: String,
    },
}

pub async fn handle_tx_command(command: TxCommands, gateway: &Gateway) -> CliResult<()> {
    match command {
        TxCommands::Prepare { request } => {
            let request = read_request(&request)?;
            print_info(&format!(
                "Preparing {} message(s) on {} for {}",
                request.messages.len(),
                request.chain,
                request.sender.as_deref().unwrap_or("the key's account")
            ));
            let assembled = gateway.prepare_transaction(request).await?;
            print_json(&assembled)?;
        }
        TxCommands::Simulate { chain, tx_bytes } => {
            let bytes = decode_tx_bytes(&tx_bytes)?;
            let outcome = gateway.pipeline().simulate(&chain, &bytes).await?;
            if outcome.ok {
                print_success(&outcome.message);
            } else {
                print_error(&outcome.message);
            }
        }
        TxCommands::Broadcast { chain, tx_bytes } => {
            let bytes = decode_tx_bytes(&tx_bytes)?;
            let result = gateway.pipeline().broadcast(&chain, &bytes).await;
            print_json(&BroadcastReport::from_result(&result))?;
            result?;
        }
    }
    Ok(())
}

fn read_request(path: &str) -> CliResult<TransactionRequest> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn decode_tx_bytes(encoded: &str) -> CliResult<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| CliError::General(format!("tx bytes are not valid base64: {e}")))
}
