//! # Strata Core
//!
//! Core library for the Strata Cosmos SDK gateway.
//!
//! This crate provides the foundational components for:
//!
//! - **[`upstream`]**: Ranked endpoint directory, the resilient request router with per-class
//!   timeouts and tiered read caching, and the one-shot endpoint prober that ranks nodes by height
//!   and latency.
//!
//! - **[`cache`]**: Two-tier (primary / fallback) expiring key-value store used by read paths.
//!
//! - **[`chain`]**: Typed chain state accessor (accounts, height and revision, gas price, IBC
//!   client status) on top of the router.
//!
//! - **[`tx`]**: Multi-format transaction assembler producing sign-direct, legacy Amino JSON and
//!   EIP-712 sign encodings for one logical transaction.
//!
//! - **[`broadcast`]**: Simulate and broadcast pipeline with chain error classification.
//!
//! - **[`runtime`]**: [`Gateway`](runtime::Gateway) bundle wiring all of the above together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Gateway                           │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌────────────┐  │
//! │  │ ChainStateAccess │  │ BroadcastPipeline│  │ Assembler  │  │
//! │  └────────┬─────────┘  └────────┬─────────┘  └────────────┘  │
//! │           │                     │                            │
//! │  ┌────────▼─────────────────────▼─────────┐                  │
//! │  │             RequestRouter              │                  │
//! │  └────────┬──────────────────────┬────────┘                  │
//! │  ┌────────▼─────────┐   ┌────────▼────────┐                  │
//! │  │ EndpointDirectory│   │   TieredCache   │                  │
//! │  └────────▲─────────┘   └─────────────────┘                  │
//! │           │ publish top-K                                    │
//! │  ┌────────┴─────────┐                                        │
//! │  │  EndpointProber  │                                        │
//! │  └──────────────────┘                                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Flow
//!
//! ```text
//! get(chain, class, path)
//!       │
//!       ▼
//! ┌─────────────┐
//! │ Primary hit │ ─── Hit ──► Cached body
//! └──────┬──────┘
//!        │ Miss
//!        ▼
//! ┌─────────────────┐
//! │ rank 1 .. N     │ ─── 200 ──► write primary + fallback ──► body
//! │ (short timeout) │ ─── 404 (chain absence) ──► not found
//! └──────┬──────────┘ ─── 400 ──► client error
//!        │ all failed
//!        ▼
//! ┌─────────────────┐
//! │ primary, then   │ ─── Hit ──► stale body
//! │ fallback tier   │
//! └──────┬──────────┘
//!        │ Miss
//!        ▼
//!  AllEndpointsDown
//! ```

pub mod broadcast;
pub mod cache;
pub mod chain;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod runtime;
pub mod tx;
pub mod types;
pub mod upstream;

pub use errors::GatewayError;
pub use runtime::{Gateway, GatewayBuilder};
