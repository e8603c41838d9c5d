//! Gateway error taxonomy.
//!
//! Endpoint faults ([`UpstreamError`](crate::upstream::UpstreamError)) are recovered inside the
//! router and never reach callers on their own. Everything below is what escapes a router,
//! accessor, assembler or pipeline call.

use crate::{broadcast::RejectionKind, tx::AssemblyError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Every ranked endpoint failed and no cached copy could stand in.
    #[error("all endpoints are down for chain {chain}, path {path}")]
    AllEndpointsDown { chain: String, path: String },

    /// Upstream rejected the request itself (HTTP 400). Never retried.
    #[error("{0}")]
    BadRequest(String),

    /// The chain reported that the requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Broadcast endpoint failed with a server error. The same bytes are not replayed on another
    /// endpoint to avoid double submission.
    #[error("Sequence mismatch, please try again")]
    SequenceMismatch,

    /// Simulation or broadcast returned a non-zero code.
    #[error("{message}")]
    ChainRejection { kind: RejectionKind, message: String },

    /// Upstream answered 200 but not with the shape the caller expects.
    #[error("{0}")]
    InvalidResponse(String),

    /// A typed chain-state read could not be decoded.
    #[error("{0}")]
    ChainState(String),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Uniform `{"error": "<message>"}` body handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl GatewayError {
    /// Returns `true` for errors caused by the request rather than by the gateway or its
    /// upstreams.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::BadRequest(_) | Self::NotFound(_) => true,
            Self::Assembly(e) => e.is_client_error(),
            _ => false,
        }
    }

    /// Returns `true` if the caller may resubmit after refreshing its inputs.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AllEndpointsDown { .. } | Self::SequenceMismatch => true,
            Self::ChainRejection { kind, .. } => kind.is_retryable(),
            _ => false,
        }
    }

    /// Short label for metrics and structured logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllEndpointsDown { .. } => "all_endpoints_down",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::SequenceMismatch => "sequence_mismatch",
            Self::ChainRejection { .. } => "chain_rejection",
            Self::InvalidResponse(_) => "invalid_response",
            Self::ChainState(_) => "chain_state",
            Self::Assembly(_) => "assembly",
            Self::Configuration(_) => "configuration",
            Self::Internal(_) => "internal",
        }
    }

    /// Message shown to end users. Exhaustion details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AllEndpointsDown { .. } => "all endpoints are down".to_string(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { error: self.user_message() }
    }
}
