use alloy::primitives::B256;
use ethereum_hashing::hash32_concat;

use super::{constants::ProofGeometry, errors::ConsensusError};

/// Compute a root hash from a leaf and a Merkle branch.
///
/// `branch` holds the sibling hashes in bottom-up order. The bits of `generalized_index` below
/// `branch.len()` decide on which side the sibling sits at every level.
pub fn merkle_root_from_branch(leaf: B256, branch: &[B256], generalized_index: u64) -> B256 {
    branch
        .iter()
        .enumerate()
        .fold(leaf, |value, (height, node)| {
            if (generalized_index >> height) & 1 == 0 {
                B256::from(hash32_concat(value.as_slice(), node.as_slice()))
            } else {
                B256::from(hash32_concat(node.as_slice(), value.as_slice()))
            }
        })
}

/// Verify that `leaf` sits at `geometry` in the tree rooted at `root`.
///
/// A branch whose length differs from the geometry's depth is malformed input and is rejected
/// without hashing anything.
pub fn verify_merkle_proof(
    leaf: B256,
    branch: &[B256],
    geometry: ProofGeometry,
    root: B256,
) -> Result<bool, ConsensusError> {
    ensure_branch_length(branch, geometry)?;
    Ok(merkle_root_from_branch(leaf, branch, geometry.generalized_index()) == root)
}

pub fn ensure_branch_length(branch: &[B256], geometry: ProofGeometry) -> Result<(), ConsensusError> {
    if branch.len() != geometry.depth {
        return Err(ConsensusError::InvalidBranchLength {
            expected: geometry.depth,
            actual: branch.len(),
        });
    }
    Ok(())
}
