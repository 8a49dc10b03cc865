//! Mock Infrastructure for Testing Keystone
//!
//! Reusable mocks for exercising the registry against a JSON-RPC endpoint without a
//! real node.
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{RpcMockBuilder, deploy_fallback, session_for, test_config};
//!
//! let mut mock = RpcMockBuilder::new().await;
//! deploy_fallback(&mut mock);
//! let session = session_for(test_config(&mock.url()));
//! ```

pub mod rpc_mock;
pub mod test_helpers;

pub use rpc_mock::{LogResponseBuilder, RpcMockBuilder};
pub use test_helpers::*;
