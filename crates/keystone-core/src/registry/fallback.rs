use alloy_primitives::{address, Address};
use std::collections::BTreeMap;

use crate::types::ContractName;

/// A name → address mapping with no provenance attached.
pub type CandidateSet = BTreeMap<ContractName, Address>;

/// Known Sepolia deployment of the DAO contracts.
pub const SEPOLIA_DEPLOYMENT: [(ContractName, Address); 6] = [
    (ContractName::GovToken, address!("5a08cfc2e2e4b61b0ad4bf9d8977f5fc4c74d0ad")),
    (ContractName::RewardToken, address!("65d4bc4e05836e4421c985dc2947f1d68ccaea48")),
    (ContractName::ParticipationNft, address!("8a544f1e3954296d8ba6430e2c6cb505be85d836")),
    (ContractName::Governance, address!("1a6e113cf3abd20650662f76bc163ac2d43a9347")),
    (ContractName::Lottery, address!("db7d60eca9dff432d8a8cc3087fe278e5bfd0d0c")),
    (ContractName::StatusNft, address!("86285162f7060796aebecd9c0809e28c0d15e2a5")),
];

/// The compiled-in fallback table.
#[must_use]
pub fn sepolia_fallback() -> CandidateSet {
    SEPOLIA_DEPLOYMENT.into_iter().collect()
}
