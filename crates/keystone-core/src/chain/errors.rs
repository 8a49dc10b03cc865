use thiserror::Error;

/// Classification of JSON-RPC errors returned by the node.
///
/// The registry never writes to the chain, so the categories only drive two decisions:
/// whether a failed read is worth retrying, and how it is labelled in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorCategory {
    /// Invalid request, method not found, invalid params.
    ClientError,
    /// Internal or server-side failure of the node.
    ProviderError,
    /// Rate limiting at JSON-RPC level (-32005).
    RateLimit,
    /// The node could not parse our request.
    ParseError,
    /// The call reverted or ran out of gas.
    ExecutionError,
}

impl RpcErrorCategory {
    /// Classifies a JSON-RPC error code and message into a category.
    ///
    /// Codes in the -32000 to -32099 server range are split by message: reverts and
    /// gas failures are execution errors, everything else is blamed on the provider.
    #[must_use]
    pub fn from_code_and_message(code: i32, message: &str) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32602..=-32600 => Self::ClientError,
            -32603 => Self::ProviderError,
            -32005 => Self::RateLimit,
            -32099..=-32000 => {
                let message_lower = message.to_lowercase();
                if message_lower.contains("revert") || message_lower.contains("out of gas") {
                    Self::ExecutionError
                } else {
                    Self::ProviderError
                }
            }
            3 => Self::ExecutionError,
            _ => Self::ProviderError,
        }
    }

    /// Returns `true` if the same read may succeed when repeated later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit | Self::ProviderError)
    }

    /// Returns a static string representation for log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientError => "client_error",
            Self::ProviderError => "provider_error",
            Self::RateLimit => "rate_limit",
            Self::ParseError => "parse_error",
            Self::ExecutionError => "execution_error",
        }
    }
}

/// Errors that can occur when reading from the chain endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RpcError {
    /// Request exceeded the configured timeout duration.
    #[error("Request timeout")]
    Timeout,

    /// The endpoint could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP-level error (non-2xx status code).
    ///
    /// First field is the HTTP status code, second is the (truncated) body.
    #[error("HTTP error: {0}")]
    HttpError(u16, String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {0}: {1}")]
    Rpc(i32, String),

    /// Response could not be parsed or was malformed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Maximum concurrent requests limit has been reached.
    #[error("Concurrency limit reached: {0}")]
    ConcurrencyLimit(String),
}

impl RpcError {
    /// Returns the RPC error category if this is a JSON-RPC error object.
    #[must_use]
    pub fn rpc_category(&self) -> Option<RpcErrorCategory> {
        match self {
            Self::Rpc(code, message) => Some(RpcErrorCategory::from_code_and_message(*code, message)),
            _ => None,
        }
    }

    /// Returns `true` if this error is transient and the read could be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) | Self::ConcurrencyLimit(_) => true,
            Self::HttpError(status, _) => (500..=599).contains(status) || *status == 429,
            Self::Rpc(_, _) => self.rpc_category().is_some_and(|cat| cat.is_transient()),
            Self::InvalidResponse(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Returns `true` if the node rejected the call itself (revert, out of gas).
    #[must_use]
    pub fn is_execution_error(&self) -> bool {
        self.rpc_category() == Some(RpcErrorCategory::ExecutionError)
    }

    /// Short label for structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::HttpError(_, _) => "http_error",
            Self::Rpc(_, _) => self.rpc_category().map_or("rpc_error", |cat| cat.as_str()),
            Self::InvalidResponse(_) => "invalid_response",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ConcurrencyLimit(_) => "concurrency_limit",
        }
    }
}
