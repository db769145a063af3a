//! Generalized-index merkle branch verification.
//!
//! https://github.com/ethereum/consensus-specs/blob/dev/ssz/merkle-proofs.md

use alloy_primitives::B256;
use sha2::{Digest, Sha256};
use ssz_types::{typenum::Unsigned, FixedVector};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("merkle branch has {actual} nodes, expected {expected}")]
pub struct BranchLengthError {
    pub expected: usize,
    pub actual: usize,
}

/// Hashes two sibling nodes into their parent.
pub fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    B256::from_slice(&hasher.finalize())
}

/// Depth of the node at `generalized_index` (the root has depth 0).
pub fn floorlog2(generalized_index: u64) -> usize {
    debug_assert!(generalized_index > 0, "generalized index 0 does not exist");
    (u64::BITS - 1 - generalized_index.max(1).leading_zeros()) as usize
}

/// Position of `generalized_index` among the nodes at its depth.
pub fn subtree_index(generalized_index: u64) -> usize {
    let depth = floorlog2(generalized_index);
    (generalized_index % (1u64 << depth)) as usize
}

/// Folds `leaf` up through `branch`, returning the implied root.
///
/// Only the first `depth` nodes of `branch` are used; callers that need the branch length
/// checked should use [`verify_merkle_branch`].
pub fn merkle_root_from_branch(leaf: B256, branch: &[B256], depth: usize, index: usize) -> B256 {
    let mut merkle_root = leaf;
    for (i, node) in branch.iter().take(depth).enumerate() {
        merkle_root = if (index >> i) & 1 == 1 {
            hash_pair(node, &merkle_root)
        } else {
            hash_pair(&merkle_root, node)
        };
    }
    merkle_root
}

/// Returns `true` if `branch` proves that `leaf` sits at `index` of a depth-`depth` tree
/// rooted at `root`. Never panics; a branch of the wrong length is simply invalid.
pub fn verify_merkle_branch(
    leaf: B256,
    branch: &[B256],
    depth: usize,
    index: usize,
    root: B256,
) -> bool {
    if branch.len() != depth || (depth < usize::BITS as usize && index >> depth != 0) {
        return false;
    }
    merkle_root_from_branch(leaf, branch, depth, index) == root
}

/// Builds a fixed-depth branch out of `nodes`.
///
/// A length mismatch is a bug in the caller, so debug builds fail loudly instead of
/// returning the error.
pub fn try_into_branch<N: Unsigned>(
    nodes: Vec<B256>,
) -> Result<FixedVector<B256, N>, BranchLengthError> {
    let expected = N::to_usize();
    debug_assert_eq!(nodes.len(), expected, "merkle branch of the wrong depth");
    if nodes.len() != expected {
        return Err(BranchLengthError {
            expected,
            actual: nodes.len(),
        });
    }
    FixedVector::new(nodes).map_err(|_| BranchLengthError {
        expected,
        actual: expected,
    })
}

/// A branch of `N` zero hashes, the default value of every branch field.
pub fn zero_branch<N: Unsigned>() -> FixedVector<B256, N> {
    FixedVector::from_elem(B256::ZERO)
}

/// Returns `true` if every node of `branch` is the zero hash.
pub fn is_zero_branch(branch: &[B256]) -> bool {
    branch.iter().all(|node| node.is_zero())
}
