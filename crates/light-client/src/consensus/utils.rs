use alloy_primitives::B256;
use beacon_types::{
    consensus::{
        fork::{compute_fork_data_root, ForkVersion},
        signature::BlsSignature,
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    merkle::verify_merkle_branch,
    ConsensusSpec,
};
use milagro_bls::{AggregateSignature, PublicKey};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::consensus::errors::ConsensusError;

pub fn calc_sync_period<S: ConsensusSpec>(slot: u64) -> u64 {
    S::compute_sync_committee_period_at_slot(slot)
}

pub fn is_aggregate_valid(sig_bytes: &BlsSignature, msg: &[u8], pks: &[&PublicKey]) -> bool {
    let sig_res = AggregateSignature::from_bytes(&sig_bytes.signature);
    match sig_res {
        Ok(sig) => sig.fast_aggregate_verify(msg, pks),
        Err(_) => false,
    }
}

/// Checks that `leaf_object` sits at `index` of the depth-`depth` tree rooted at `root`.
pub fn is_proof_valid<L: TreeHash>(
    root: B256,
    leaf_object: &L,
    branch: &[B256],
    depth: usize,
    index: usize,
) -> bool {
    verify_merkle_branch(leaf_object.tree_hash_root(), branch, depth, index, root)
}

#[derive(Default, Debug, TreeHash)]
struct SigningData {
    object_root: B256,
    domain: B256,
}

pub fn compute_signing_root(object_root: B256, domain: B256) -> B256 {
    let data = SigningData {
        object_root,
        domain,
    };
    data.tree_hash_root()
}

pub fn compute_domain(
    domain_type: [u8; 4],
    fork_version: ForkVersion,
    genesis_root: B256,
) -> B256 {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    B256::from(domain)
}

/// Decompresses the public keys of the committee members whose bit is set.
pub fn get_participating_keys<S: ConsensusSpec>(
    committee: &SyncCommittee<S>,
    sync_aggregate: &SyncAggregate<S>,
) -> Result<Vec<PublicKey>, ConsensusError> {
    sync_aggregate
        .sync_committee_bits
        .iter()
        .zip(committee.pubkeys.iter())
        .enumerate()
        .filter(|(_, (bit, _))| *bit)
        .map(|(i, (_, pubkey))| {
            PublicKey::from_bytes_unchecked(&pubkey.inner[..])
                .map_err(|_| ConsensusError::InvalidPublicKey(i))
        })
        .collect()
}
