//! Mock infrastructure for testing the Strata gateway.
//!
//! - `CosmosMockBuilder`: wraps mockito with Cosmos SDK, Tendermint and Web3 response helpers
//! - test helpers for wiring routers, accessors and gateways against mock endpoints
//!
//! ```ignore
//! use tests::mock_infrastructure::CosmosMockBuilder;
//!
//! let mut node = CosmosMockBuilder::new().await;
//! node.mock_latest_block(100, "evmos_9001-2").await;
//! // Use node.url() as a candidate endpoint
//! ```

pub mod cosmos_mock;
pub mod test_helpers;

pub use cosmos_mock::CosmosMockBuilder;
pub use test_helpers::*;
