use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Subcommand;
use prettytable::{row, Table};
use std::collections::BTreeMap;
use strata_core::{
    config::ChainProfile,
    tx::{address::derive_address, PubKeyType},
    types::{chain_key, EndpointClass},
    upstream::ProbeReport,
    Gateway, GatewayError,
};

use super::utils::{print_info, print_json, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ChainCommands {
    /// Show account number and sequence of an address
    Account {
        /// Chain name (e.g. EVMOS)
        #[arg(short, long)]
        chain: String,

        /// Bech32 account address
        address: String,
    },

    /// Derive the account address of a public key
    Address {
        #[arg(short, long)]
        chain: String,

        /// Base64 encoded compressed public key
        pub_key: String,

        /// secp256k1 or eth_secp256k1; follows the chain id when omitted
        #[arg(long)]
        key_type: Option<String>,
    },

    /// Show the latest block height and revision number
    Height {
        #[arg(short, long)]
        chain: String,
    },

    /// Show the current gas price hint
    GasPrice {
        #[arg(short, long)]
        chain: String,
    },

    /// Estimate the fee for a gas limit
    Fee {
        #[arg(short, long)]
        chain: String,

        /// Gas limit to price
        #[arg(short, long, default_value = "350000")]
        gas: u64,
    },

    /// Show the status of an IBC light client
    ClientStatus {
        #[arg(short, long)]
        chain: String,

        /// Client identifier (e.g. 07-tendermint-0)
        client_id: String,
    },

    /// Show the ranked endpoints the router currently uses
    Endpoints {
        #[arg(short, long)]
        chain: String,
    },

    /// Probe candidate endpoints and publish the ranking
    Probe {
        /// Chain to probe; all configured chains when omitted
        #[arg(short, long)]
        chain: Option<String>,

        /// Print the reports as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_chain_command(command: ChainCommands, gateway: &Gateway) -> CliResult<()> {
    let accessor = gateway.accessor();
    match command {
        ChainCommands::Account { chain, address } => {
            let account = accessor.get_account(&address, &chain).await?;
            println!("Account {address} on {chain}:");
            println!("  Account Number: {}", account.account_number);
            println!("  Sequence: {}", account.sequence);
        }
        ChainCommands::Address { chain, pub_key, key_type } => {
            let profile = accessor.profile(&chain)?;
            let address = key_address(profile, &pub_key, key_type.as_deref())?;
            println!("{address}");
        }
        ChainCommands::Height { chain } => {
            let height = accessor.get_height(&chain).await?;
            println!("Height: {}", height.height);
            println!("Revision Number: {}", height.revision_number);
        }
        ChainCommands::GasPrice { chain } => {
            let price = accessor.get_gas_price_hint(&chain).await?;
            println!("Gas Price: {price}");
        }
        ChainCommands::Fee { chain, gas } => {
            let fee = accessor.estimate_fee(&chain, gas).await?;
            println!("Fee for {gas} gas: {fee}");
        }
        ChainCommands::ClientStatus { chain, client_id } => {
            let status = accessor.get_ibc_client_status(&chain, &client_id).await?;
            if status.is_active() {
                print_success(&format!("Client {client_id} is {status}"));
            } else {
                print_info(&format!("Client {client_id} is {status}"));
            }
        }
        ChainCommands::Endpoints { chain } => {
            let mut table = Table::new();
            table.add_row(row!["Class", "Rank", "URL"]);
            for class in EndpointClass::ALL {
                for record in gateway.router().endpoints(&chain, class).await? {
                    table.add_row(row![record.class, record.rank, record.base_url]);
                }
            }
            table.printstd();
        }
        ChainCommands::Probe { chain, json } => {
            let reports = match chain {
                Some(chain) => {
                    let reports = gateway.probe_chain(&chain).await?;
                    BTreeMap::from([(chain_key(&chain), reports)])
                }
                None => gateway.probe_all().await,
            };
            if json {
                print_json(&reports)?;
            } else {
                for (chain, classes) in &reports {
                    for (class, ranked) in classes {
                        println!("\n{chain} / {class}");
                        probe_table(ranked).printstd();
                    }
                }
            }
        }
    }
    Ok(())
}

fn key_address(
    profile: &ChainProfile,
    pub_key: &str,
    key_type: Option<&str>,
) -> CliResult<String> {
    let key_type = match key_type {
        Some(kind) => kind.parse::<PubKeyType>().map_err(GatewayError::from)?,
        None => PubKeyType::for_chain_id(&profile.chain_id),
    };
    let bytes = STANDARD
        .decode(pub_key.trim())
        .map_err(|e| CliError::General(format!("public key is not valid base64: {e}")))?;
    Ok(derive_address(&bytes, key_type, &profile.bech32_prefix).map_err(GatewayError::from)?)
}

fn probe_table(reports: &[ProbeReport]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Rank", "URL", "Height", "Latency", "Status"]);
    for (i, report) in reports.iter().enumerate() {
        let height = report.height.map_or_else(|| "-".to_string(), |h| h.to_string());
        let latency = report
            .latency
            .map_or_else(|| "-".to_string(), |l| format!("{}ms", l.as_millis()));
        let status = match &report.error {
            Some(error) => error.clone(),
            None if report.is_healthy() => "OK".to_string(),
            None => "unhealthy".to_string(),
        };
        table.add_row(row![i + 1, report.url, height, latency, status]);
    }
    table
}
