use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, FixedVector};
use tree_hash_derive::TreeHash;

use crate::{
    consensus::{pubkey::PubKey, signature::BlsSignature},
    consensus_spec::ConsensusSpec,
};

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/beacon-chain.md#synccommittee
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "S: ConsensusSpec")]
pub struct SyncCommittee<S: ConsensusSpec> {
    pub pubkeys: FixedVector<PubKey, S::SyncCommitteeSize>,
    pub aggregate_pubkey: PubKey,
}

impl<S: ConsensusSpec> Default for SyncCommittee<S> {
    fn default() -> Self {
        Self {
            pubkeys: FixedVector::from_elem(PubKey::default()),
            aggregate_pubkey: PubKey::default(),
        }
    }
}

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/beacon-chain.md#syncaggregate
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "S: ConsensusSpec")]
pub struct SyncAggregate<S: ConsensusSpec> {
    pub sync_committee_bits: BitVector<S::SyncCommitteeSize>,
    pub sync_committee_signature: BlsSignature,
}

impl<S: ConsensusSpec> Default for SyncAggregate<S> {
    fn default() -> Self {
        Self {
            sync_committee_bits: BitVector::new(),
            sync_committee_signature: BlsSignature::default(),
        }
    }
}

impl<S: ConsensusSpec> SyncAggregate<S> {
    /// Number of committee members that took part in the signature.
    pub fn num_set_bits(&self) -> usize {
        self.sync_committee_bits.num_set_bits()
    }
}
