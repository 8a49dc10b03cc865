//! Read-only chain access.
//!
//! [`ChainReader`] is the seam between the registry and a node: deployment probes,
//! event-log discovery and typed contract reads all go through it. The production
//! implementation is [`JsonRpcChainClient`]; tests script a `MockChainReader`.

pub mod abi;
pub mod client;
pub mod errors;
pub mod http_client;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::{ChainReader, JsonRpcChainClient, LogEntry, LogFilter};
pub use errors::{RpcError, RpcErrorCategory};
pub use http_client::{HttpClient, HttpClientConfig};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockChainReader;
