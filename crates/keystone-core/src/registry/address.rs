use alloy_primitives::Address;
use thiserror::Error;

use crate::types::ContractName;

/// The all-zero sentinel address. Resolution falls back to it instead of failing.
pub const ZERO_ADDRESS: Address = Address::ZERO;

const ADDRESS_LEN: usize = 42;

/// Why an address string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddressFormatError {
    #[error("address is empty")]
    Empty,

    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must be 42 characters, got {0}")]
    InvalidLength(usize),

    #[error("address contains non-hex characters")]
    InvalidHex,
}

/// A rejected field in an [`update`](crate::registry::AddressResolver::update) batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {error} (got {value:?})")]
pub struct FieldError {
    pub name: ContractName,
    pub value: String,
    pub error: AddressFormatError,
}

/// Checks that `input` is `0x` followed by exactly 40 hex digits.
///
/// Surrounding whitespace is ignored. Checksum casing is not enforced, matching what
/// wallets accept when an operator pastes an address.
///
/// # Errors
///
/// Returns the first [`AddressFormatError`] that applies.
pub fn validate_address_format(input: &str) -> Result<Address, AddressFormatError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AddressFormatError::Empty);
    }
    let Some(digits) = trimmed.strip_prefix("0x") else {
        return Err(AddressFormatError::MissingPrefix);
    };
    if trimmed.len() != ADDRESS_LEN {
        return Err(AddressFormatError::InvalidLength(trimmed.len()));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddressFormatError::InvalidHex);
    }
    let raw = ::hex::decode(digits).map_err(|_| AddressFormatError::InvalidHex)?;
    Ok(Address::from_slice(&raw))
}

/// Returns `true` for the zero sentinel.
#[must_use]
pub fn is_zero(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}
