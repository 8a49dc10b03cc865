//! Core type definitions shared across the crate.
//!
//! # Type Categories
//!
//! ## Contract Identity
//! - [`ContractName`]: the fixed set of logical contracts the registry resolves
//!
//! ## JSON-RPC Protocol Types
//! - [`JsonRpcRequest`], [`JsonRpcResponse`], [`JsonRpcError`]: Protocol conformance for the
//!   chain read surface

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, str::FromStr};

/// JSON-RPC protocol version constant to avoid repeated allocations.
pub const JSONRPC_VERSION: &str = "2.0";

/// Pre-allocated `Cow` for JSON-RPC version - zero allocation for static usage.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// Logical contract names known to the registry.
///
/// The declaration order is the canonical registry order: snapshots, probe results and
/// CLI output all iterate contracts in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractName {
    GovToken,
    RewardToken,
    ParticipationNft,
    Governance,
    Lottery,
    StatusNft,
}

impl ContractName {
    /// All contract names in canonical order.
    pub const ALL: [ContractName; 6] = [
        Self::GovToken,
        Self::RewardToken,
        Self::ParticipationNft,
        Self::Governance,
        Self::Lottery,
        Self::StatusNft,
    ];

    /// Upper-case key segment used for persisted overrides and runtime defaults.
    #[must_use]
    pub fn key_segment(&self) -> &'static str {
        match self {
            Self::GovToken => "GOVTOKEN",
            Self::RewardToken => "REWARDTOKEN",
            Self::ParticipationNft => "PARTICIPATIONNFT",
            Self::Governance => "GOVERNANCE",
            Self::Lottery => "LOTTERY",
            Self::StatusNft => "STATUSNFT",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GovToken => "GovToken",
            Self::RewardToken => "RewardToken",
            Self::ParticipationNft => "ParticipationNFT",
            Self::Governance => "Governance",
            Self::Lottery => "Lottery",
            Self::StatusNft => "StatusNFT",
        }
    }

    /// Key under which an operator override for this contract is persisted.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("contract_{}", self.key_segment())
    }

    /// Environment-style key for the runtime default, e.g. `KEYSTONE_LOTTERY_ADDRESS`.
    #[must_use]
    pub fn env_key(&self, prefix: &str) -> String {
        format!("{prefix}_{}_ADDRESS", self.key_segment())
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown contract name: {0}")]
pub struct UnknownContract(pub String);

impl FromStr for ContractName {
    type Err = UnknownContract;

    /// Accepts both the display form (`ParticipationNFT`) and the key segment
    /// (`PARTICIPATIONNFT`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|name| {
                name.key_segment().eq_ignore_ascii_case(trimmed) ||
                    name.as_str().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownContract(s.to_string()))
    }
}

/// JSON-RPC 2.0 request structure.
///
/// # Example
///
/// ```
/// use keystone_core::types::JsonRpcRequest;
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new("eth_blockNumber", None, json!(1));
///
/// assert_eq!(request.method, "eth_blockNumber");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 response structure.
///
/// A response contains either a `result` (success) or an `error` (failure), but never both.
/// A `null` result is legal and is how nodes report "nothing here" for some methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with zero allocation for the version string.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        id: serde_json::Value,
    ) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params, id }
    }
}

impl JsonRpcResponse {
    /// Creates a successful JSON-RPC response.
    #[must_use]
    pub fn success(result: serde_json::Value, id: serde_json::Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, result: Some(result), error: None, id }
    }

    /// Creates an error JSON-RPC response.
    #[must_use]
    pub fn error(code: i32, message: String, id: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION_COW,
            result: None,
            error: Some(JsonRpcError { code, message, data: None }),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object.
///
/// Standard error codes follow the JSON-RPC 2.0 convention:
///
/// - `-32700`: Parse error (invalid JSON)
/// - `-32600`: Invalid request (malformed JSON-RPC)
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
/// - `-32000` to `-32099`: Server-defined errors (implementation-specific)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
