//! Hex encoding helpers for JSON-RPC quantities and data.
//!
//! JSON-RPC encodes quantities as `0x`-prefixed hex without leading zeros and
//! data as `0x`-prefixed hex with two digits per byte.

use std::fmt::Write;

/// Formats bytes as hex with "0x" prefix.
#[must_use]
pub fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// Formats a `u64` as a JSON-RPC quantity, e.g. `0x1b4`.
#[must_use]
pub fn format_hex_u64(value: u64) -> String {
    format!("0x{value:x}")
}

/// Parses a hex string to `u64`.
///
/// Accepts strings with or without "0x" prefix. Returns `None` if invalid hex or overflow.
#[must_use]
pub fn parse_hex_u64(hex: &str) -> Option<u64> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    if hex_str.is_empty() {
        return None;
    }
    u64::from_str_radix(hex_str, 16).ok()
}

/// Parses a hex string to bytes.
///
/// Accepts strings with or without "0x" prefix. `"0x"` decodes to an empty vector.
/// Returns `None` if invalid hex or odd length.
#[must_use]
pub fn parse_hex_bytes(hex: &str) -> Option<Vec<u8>> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    ::hex::decode(hex_str).ok()
}
