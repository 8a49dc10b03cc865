//! Small shared helpers.

pub mod hex;

pub use hex::{format_hex, format_hex_u64, parse_hex_bytes, parse_hex_u64};
