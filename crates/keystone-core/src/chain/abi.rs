//! Solidity interfaces of the DAO contracts the registry reads from.
//!
//! Calldata is built with [`SolCall::abi_encode`] on the generated call structs and
//! return data is decoded through [`decode_returns`]. The deployment announcement is
//! the [`ContractDeployed`] event; none of its parameters are indexed.

use alloy_sol_types::{sol, SolCall};

use crate::chain::RpcError;

sol! {
    interface IGovToken {
        function balanceOf(address account) external view returns (uint256);
    }

    interface IGovernance {
        function THRESHOLD() external view returns (uint256);
        function getProposalCount() external view returns (uint256);
        function getEligibleForLottery(uint8 proposalId) external view returns (address[] memory);
        function getMemberSince(address member) external view returns (uint256);
        function hasUserVoted(uint8 proposalId, address voter) external view returns (bool);
    }

    interface ILottery {
        function getPoolAmount(uint8 proposalId) external view returns (uint256);
    }

    event ContractDeployed(string name, address contractAddress, uint256 timestamp);
}

/// Decodes the return data of `C`.
///
/// # Errors
///
/// Returns [`RpcError::InvalidResponse`] naming the function when the data does not
/// decode as its declared outputs.
pub fn decode_returns<C: SolCall>(data: &[u8]) -> Result<C::Return, RpcError> {
    C::abi_decode_returns(data, true).map_err(|e| RpcError::InvalidResponse(format!("{}: {e}", C::SIGNATURE)))
}
