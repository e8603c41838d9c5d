//! Resilient multi-endpoint request layer.
//!
//! - [`directory`]: ranked base URLs per chain and endpoint class
//! - [`http_client`]: shared, concurrency-bounded HTTP client
//! - [`router`]: rank-ordered failover with tiered read caching
//! - [`prober`]: one-shot health probe that publishes rankings to the directory

pub mod directory;
pub mod errors;
pub mod http_client;
pub mod prober;
pub mod router;

pub use directory::{DirectoryError, EndpointDirectory, MemoryDirectory};
pub use errors::UpstreamError;
pub use http_client::{HttpClient, HttpClientConfig, HttpReply};
pub use prober::{EndpointProber, EndpointPublisher, ProbeReport};
pub use router::{RequestRouter, ResponseSource, RouterResponse, TimeoutBudget};
