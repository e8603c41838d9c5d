//! Interpretation of a single endpoint reply.
//!
//! A 404 from a Cosmos node can mean two different things. The chain may report that the object
//! does not exist (`{"code":5,"message":"rpc error: code = NotFound desc = account ... not
//! found"}`), which is an answer. Or the node's HTTP router may not serve the path at all (an
//! Express-style `Cannot GET /...` page, nginx HTML, or the bare gRPC-gateway `Not Found` /
//! `Not Implemented` stub), which only says the endpoint is the wrong place to ask.

use super::TimeoutBudget;
use crate::upstream::{HttpReply, UpstreamError};
use serde::Deserialize;

/// gRPC status code `UNIMPLEMENTED`.
const GRPC_UNIMPLEMENTED: i64 = 12;

/// What the router should do with one endpoint reply.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// Usable 200 body.
    Success(String),
    /// The chain says the resource does not exist. Final.
    NotFound,
    /// Upstream rejected the request itself. Final.
    BadRequest(String),
    /// Server error on a broadcast submission. Final; the bytes are not replayed elsewhere.
    BroadcastServerError,
    /// This endpoint failed; try the next rank.
    Fault(UpstreamError),
}

#[derive(Debug, Deserialize)]
struct GatewayStatus {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

pub(crate) fn classify_reply(reply: HttpReply, budget: TimeoutBudget) -> AttemptOutcome {
    match reply.status {
        200 if reply.body.trim().is_empty() => AttemptOutcome::Fault(UpstreamError::EmptyBody),
        200 => AttemptOutcome::Success(reply.body),
        404 if is_routing_mismatch(&reply.body) => {
            AttemptOutcome::Fault(UpstreamError::RouteNotServed(truncate(&reply.body)))
        }
        404 => AttemptOutcome::NotFound,
        400 => AttemptOutcome::BadRequest(bad_request_message(&reply.body)),
        500 if budget == TimeoutBudget::Broadcast => AttemptOutcome::BroadcastServerError,
        status => AttemptOutcome::Fault(UpstreamError::HttpError(status, truncate(&reply.body))),
    }
}

/// Returns `true` if a 404 body comes from the node's HTTP routing layer rather than from the
/// chain.
#[must_use]
pub fn is_routing_mismatch(body: &str) -> bool {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.contains("Cannot GET") || trimmed.contains("Cannot POST") {
        return true;
    }

    match serde_json::from_str::<GatewayStatus>(trimmed) {
        Ok(status) => {
            if status.code == Some(GRPC_UNIMPLEMENTED) {
                return true;
            }
            matches!(
                status.message.as_deref().map(str::trim),
                Some("Not Found" | "Not Implemented")
            )
        }
        Err(_) => true,
    }
}

/// Best-effort human-readable message out of a 400 body.
#[must_use]
pub fn bad_request_message(body: &str) -> String {
    let Ok(status) = serde_json::from_str::<GatewayStatus>(body) else {
        return "Bad Request".to_string();
    };

    if let (Some(code), Some(message)) = (status.code, status.message.as_ref()) {
        if code != 0 && !message.is_empty() {
            return message.clone();
        }
    }

    match status.error {
        Some(serde_json::Value::String(message)) if !message.is_empty() => message,
        _ => "Bad Request".to_string(),
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}
