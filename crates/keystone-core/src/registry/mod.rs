//! Contract address resolution.
//!
//! [`AddressResolver`] owns the cached [`ContractRegistry`] and is the only writer of
//! operator overrides. Sessions construct one resolver and hand it by `Arc` to every
//! consumer.

pub mod address;
pub mod fallback;
pub mod resolver;

pub use address::{validate_address_format, AddressFormatError, FieldError, ZERO_ADDRESS};
pub use fallback::{sepolia_fallback, CandidateSet};
pub use resolver::{AddressResolver, AddressSource, ContractRegistry, RegistryEntry, UpdateReport};

use std::collections::BTreeMap;

use crate::types::ContractName;

/// Deployment-time default addresses, the second precedence tier.
///
/// Values are kept as raw strings and validated on resolution, so a malformed default
/// is skipped (with a warning) rather than rejected at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeDefaults {
    addresses: BTreeMap<ContractName, String>,
}

impl RuntimeDefaults {
    /// Reads `<PREFIX>_<NAME>_ADDRESS` for every contract from the process environment.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Builds defaults from arbitrary `(key, value)` pairs using the same key scheme as
    /// [`from_env`](Self::from_env). Unrelated keys are ignored.
    pub fn from_pairs<I, K, V>(prefix: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let pairs: BTreeMap<String, String> =
            pairs.into_iter().map(|(k, v)| (k.as_ref().to_string(), v.into())).collect();
        Self::from_lookup(prefix, |key| pairs.get(key).cloned())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let addresses = ContractName::ALL
            .into_iter()
            .filter_map(|name| {
                lookup(&name.env_key(prefix))
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (name, value))
            })
            .collect();
        Self { addresses }
    }

    #[must_use]
    pub fn get(&self, name: ContractName) -> Option<&str> {
        self.addresses.get(&name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
