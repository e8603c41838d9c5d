use thiserror::Error;

/// Failure of a single endpoint attempt.
///
/// These never escape the router on their own: the router moves on to the next ranked endpoint
/// and only reports [`GatewayError::AllEndpointsDown`](crate::GatewayError::AllEndpointsDown)
/// once every rank has failed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// Request exceeded its timeout budget.
    #[error("Request timeout")]
    Timeout,

    /// Failed to establish a connection to the upstream endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-success HTTP status that the router does not handle specially.
    ///
    /// First field is the HTTP status code, second is the (truncated) body.
    #[error("HTTP error: {0}")]
    HttpError(u16, String),

    /// HTTP 200 with nothing in it.
    #[error("Empty response body")]
    EmptyBody,

    /// HTTP 404 produced by the node's router rather than by the chain: the endpoint does not
    /// serve this path.
    #[error("Route not served by endpoint: {0}")]
    RouteNotServed(String),

    /// Endpoint base URL and path do not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The client-wide concurrency semaphore is closed.
    #[error("Concurrency limit reached: {0}")]
    ConcurrencyLimit(String),
}

impl UpstreamError {
    /// Static label for metrics and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::HttpError(_, _) => "http_error",
            Self::EmptyBody => "empty_body",
            Self::RouteNotServed(_) => "route_not_served",
            Self::InvalidUrl(_) => "invalid_url",
            Self::ConcurrencyLimit(_) => "concurrency_limit",
        }
    }

    /// Returns `true` if the same endpoint might succeed on a later attempt.
    ///
    /// Route mismatches and invalid URLs are properties of the endpoint, not of the moment.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout |
                Self::ConnectionFailed(_) |
                Self::HttpError(_, _) |
                Self::EmptyBody |
                Self::ConcurrencyLimit(_)
        )
    }
}
