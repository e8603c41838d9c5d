pub mod chain;
pub mod config;
pub mod tx;
pub mod utils;

pub use chain::{handle_chain_command, ChainCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use tx::{handle_tx_command, TxCommands};
