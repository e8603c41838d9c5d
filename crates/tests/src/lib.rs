//! Integration tests for the Strata gateway.
//!
//! Every test runs against local mockito servers standing in for Cosmos SDK REST, Tendermint
//! JSON-RPC and Web3 endpoints; no network access is needed.
//!
//! - `router_tests`: rank failover, timeouts, 404 interpretation and the two cache tiers
//! - `accessor_tests`: typed chain reads on top of a failing-over router
//! - `pipeline_tests`: simulate and broadcast of assembled transactions
//! - `prober_tests`: endpoint ranking and publication into the directory
//! - `gateway_tests`: builder wiring and transaction preparation end to end
//! - `mock_infrastructure`: reusable Cosmos endpoint mocks
//!
//! ```bash
//! cargo test --package tests
//! ```

pub mod mock_infrastructure;

#[cfg(test)]
mod router_tests;

#[cfg(test)]
mod accessor_tests;

#[cfg(test)]
mod pipeline_tests;

#[cfg(test)]
mod prober_tests;

#[cfg(test)]
mod gateway_tests;
