//! # Keystone Core
//!
//! Contract address registry and deployment health for a DAO front end.
//!
//! This crate provides the foundational components for:
//!
//! - **[`registry`]**: Address resolution with override, runtime default and fallback tiers,
//!   cached as one immutable snapshot and invalidated on every write.
//!
//! - **[`health`]**: Deployment probing (`eth_getCode`) and aggregation into a single status.
//!
//! - **[`discovery`]**: Replacement-address discovery from a static table or on-chain
//!   deployment announcements.
//!
//! - **[`reload`]**: Validation passes, debounced reloads and health subscriptions.
//!
//! - **[`contracts`]**: Typed `eth_call` reads against the resolved contracts.
//!
//! - **[`derived`]**: Eligibility, probability share and membership tier calculators.
//!
//! - **[`session`]**: Wires everything together and owns the reload loop.
//!
//! ## Pass Flow
//!
//! ```text
//!   start / reload ticket / retry
//!              │
//!              ▼
//!      ┌───────────────┐
//!      │   resolve all │  override → runtime default → fallback → 0x0
//!      └───────┬───────┘
//!              ▼
//!      ┌───────────────┐
//!      │     probe     │  eth_getCode per contract, concurrently
//!      └───────┬───────┘
//!              ▼
//!      ┌───────────────┐
//!      │   aggregate   │ ─── Healthy ──► publish + ready marker
//!      └───────┬───────┘
//!              │ Warning / Error
//!              ▼
//!      ┌───────────────┐
//!      │   discover    │ ─── changed ──► persist overrides, schedule reload
//!      └───────┬───────┘
//!              │ nothing new
//!              ▼
//!       publish degraded
//! ```
//!
//! ## Feature Flags
//!
//! - `test-utils`: exposes `chain::MockChainReader` to other crates

pub mod chain;
pub mod config;
pub mod contracts;
pub mod derived;
pub mod discovery;
pub mod health;
pub mod registry;
pub mod reload;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;
