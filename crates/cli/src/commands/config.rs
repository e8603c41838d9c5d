use clap::Subcommand;
use prettytable::{row, Table};
use std::path::Path;
use strata_core::{
    config::{ChainProfile, GatewayConfig},
    types::EndpointClass,
};

use super::utils::{load_config, print_error, print_info, print_success, CliError, CliResult};

const SAMPLE_CONFIG: &str = include_str!("../../../../config/config.toml");

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the current configuration
    Validate {
        /// Path to config file (defaults to config/config.toml)
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Show current configuration
    Show {
        /// Path to config file (defaults to config/config.toml)
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file } => show_config(&file),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = load_config(file)?;
    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Chains: {}", config.chains.len());
    println!(
        "  Router: {} ranks, {}ms read / {}ms broadcast timeout",
        config.router.max_ranks, config.router.read_timeout_ms, config.router.broadcast_timeout_ms
    );
    println!(
        "  Cache: {}s primary / {}s fallback",
        config.cache.primary_ttl_seconds, config.cache.fallback_ttl_seconds
    );
    println!(
        "  Metrics: {}",
        if config.metrics.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    Ok(())
}

fn show_config(file: &str) -> CliResult<()> {
    let config = GatewayConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    println!("Configuration from {file}:");

    println!("\n[Router]");
    println!("  Max Ranks: {}", config.router.max_ranks);
    println!("  Read Timeout: {}ms", config.router.read_timeout_ms);
    println!("  Broadcast Timeout: {}ms", config.router.broadcast_timeout_ms);
    println!("  Concurrent Limit: {}", config.router.concurrent_limit);

    println!("\n[Cache]");
    println!("  Primary TTL: {}s", config.cache.primary_ttl_seconds);
    println!("  Fallback TTL: {}s", config.cache.fallback_ttl_seconds);

    println!("\n[Prober]");
    println!("  Timeout: {}ms", config.prober.timeout_ms);
    println!("  Top K: {}", config.prober.top_k);
    println!("  Concurrency: {}", config.prober.concurrency);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    println!("\n[Chains] ({} configured)", config.chains.len());
    chain_table(&config.chains).printstd();

    Ok(())
}

fn chain_table(chains: &[ChainProfile]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Name", "Chain ID", "Prefix", "Fee Denom", "Simulate", "REST", "JRPC", "Web3"]);
    for chain in chains {
        let count = |class| chain.candidates.for_class(class).len();
        table.add_row(row![
            chain.key(),
            chain.chain_id,
            chain.bech32_prefix,
            chain.fee_denom,
            chain.supports_simulation,
            count(EndpointClass::Rest),
            count(EndpointClass::Jrpc),
            count(EndpointClass::Web3)
        ]);
    }
    table
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration written to {output}"));
    print_info("Replace the example endpoints with real node URLs before starting the gateway.");
    Ok(())
}
