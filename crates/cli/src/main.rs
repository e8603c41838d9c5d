use anyhow::Result;
use clap::{Parser, Subcommand};
use strata_core::{config::GatewayConfig, GatewayBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{
    handle_chain_command, handle_config_command, handle_tx_command, utils::load_config,
    ChainCommands, ConfigCommands, TxCommands,
};

#[derive(Parser)]
#[command(name = "strata-cli")]
#[command(about = "Strata CLI - Inspect Cosmos SDK chains and prepare transactions through the gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway configuration file
    #[arg(long, global = true, env = "STRATA_CONFIG", default_value = "config/config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Chain state queries and endpoint probing
    #[command(subcommand)]
    Chain(ChainCommands),

    /// Transaction preparation, simulation and broadcast
    #[command(subcommand)]
    Tx(TxCommands),
}

fn init_logging(config: &GatewayConfig) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(level) if level == "debug" || level == "trace" => {
            EnvFilter::new(format!("warn,strata_core={level},strata_cli={level}"))
        }
        Ok(_) => EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn,strata_core=debug,strata_cli=debug")),
        Err(_) => {
            let level = &config.logging.level;
            EnvFilter::new(format!("warn,strata_core={level},strata_cli={level}"))
        }
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(config_command) => {
            handle_config_command(config_command)?;
        }

        Commands::Chain(chain_command) => {
            let config = load_config(&cli.config)?;
            init_logging(&config);
            let gateway = GatewayBuilder::new()
                .with_config(config)
                .build()
                .map_err(|e| anyhow::anyhow!("Gateway initialization failed: {e}"))?;
            handle_chain_command(chain_command, &gateway).await?;
        }

        Commands::Tx(tx_command) => {
            let config = load_config(&cli.config)?;
            init_logging(&config);
            let gateway = GatewayBuilder::new()
                .with_config(config)
                .build()
                .map_err(|e| anyhow::anyhow!("Gateway initialization failed: {e}"))?;
            handle_tx_command(tx_command, &gateway).await?;
        }
    }

    Ok(())
}
