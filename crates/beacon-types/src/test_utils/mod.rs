//! Proof fixtures for tests.

use std::collections::BTreeMap;

use alloy_primitives::B256;

use crate::merkle::{floorlog2, hash_pair};

/// A merkle tree that only materializes the paths to the leaves it was given. Subtrees
/// without leaves hash to zero, which is enough to build consistent proofs for any
/// generalized index.
#[derive(Debug, Default, Clone)]
pub struct SparseMerkleTree {
    leaves: BTreeMap<u64, B256>,
}

impl SparseMerkleTree {
    pub fn insert(&mut self, generalized_index: u64, leaf: B256) -> &mut Self {
        self.leaves.insert(generalized_index, leaf);
        self
    }

    pub fn with_leaves(leaves: &[(u64, B256)]) -> Self {
        let mut tree = Self::default();
        for (generalized_index, leaf) in leaves {
            tree.insert(*generalized_index, *leaf);
        }
        tree
    }

    pub fn root(&self) -> B256 {
        self.node(1)
    }

    /// Sibling hashes from `generalized_index` up to the root.
    pub fn branch(&self, generalized_index: u64) -> Vec<B256> {
        let mut branch = Vec::with_capacity(floorlog2(generalized_index));
        let mut index = generalized_index;
        while index > 1 {
            branch.push(self.node(index ^ 1));
            index /= 2;
        }
        branch
    }

    fn node(&self, generalized_index: u64) -> B256 {
        if let Some(leaf) = self.leaves.get(&generalized_index) {
            return *leaf;
        }
        if !self.has_leaf_below(generalized_index) {
            return B256::ZERO;
        }
        hash_pair(
            &self.node(generalized_index * 2),
            &self.node(generalized_index * 2 + 1),
        )
    }

    fn has_leaf_below(&self, generalized_index: u64) -> bool {
        let depth = floorlog2(generalized_index);
        self.leaves.keys().any(|leaf| {
            let leaf_depth = floorlog2(*leaf);
            leaf_depth > depth && leaf >> (leaf_depth - depth) == generalized_index
        })
    }
}
