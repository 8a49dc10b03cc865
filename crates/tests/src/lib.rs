//! Integration tests for Keystone
//!
//! Every test drives the public API against a mockito JSON-RPC server:
//!
//! - `registry_flow_tests`: start pass, degraded health, discovery-driven reloads, teardown
//! - `discovery_tests`: event-log discovery over `eth_getLogs`
//! - `contract_reads_tests`: typed `eth_call` reads and the lottery snapshot
//! - `mock_infrastructure`: reusable mocks and fixtures
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod registry_flow_tests;

#[cfg(test)]
mod discovery_tests;

#[cfg(test)]
mod contract_reads_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
