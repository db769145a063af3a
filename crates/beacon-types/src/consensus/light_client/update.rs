use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use serde_this_or_that::as_u64;
use ssz::Decode;
use ssz_derive::{Decode, Encode};
use ssz_types::FixedVector;
use superstruct::superstruct;
use tree_hash_derive::TreeHash;

use crate::{
    consensus::{
        constants::{FinalizedRootProofLen, NextSyncCommitteeProofLen},
        fork::{ForkName, UpgradeError},
        light_client::header::{
            no_light_client_schema, upgrade_header_to_capella, upgrade_header_to_deneb,
            LightClientHeader, LightClientHeaderAltair, LightClientHeaderCapella,
            LightClientHeaderDeneb,
        },
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    consensus_spec::ConsensusSpec,
};

pub type NextSyncCommitteeBranch = FixedVector<B256, NextSyncCommitteeProofLen>;
pub type FinalityBranch = FixedVector<B256, FinalizedRootProofLen>;

#[superstruct(
    variants(Altair, Capella, Deneb),
    variant_attributes(
        derive(
            Debug,
            Clone,
            Serialize,
            PartialEq,
            Deserialize,
            Encode,
            Decode,
            Default,
            TreeHash
        ),
        serde(bound = "S: ConsensusSpec", deny_unknown_fields),
    )
)]
#[derive(Debug, Clone, PartialEq, Serialize, Encode, TreeHash)]
#[serde(bound = "S: ConsensusSpec", untagged)]
#[ssz(enum_behaviour = "transparent")]
#[tree_hash(enum_behaviour = "transparent")]
pub struct LightClientUpdate<S: ConsensusSpec> {
    /// The last `LightClientHeader` from the last attested block by the sync committee.
    #[superstruct(only(Altair), partial_getter(rename = "attested_header_altair"))]
    pub attested_header: LightClientHeaderAltair,
    #[superstruct(only(Capella), partial_getter(rename = "attested_header_capella"))]
    pub attested_header: LightClientHeaderCapella,
    #[superstruct(only(Deneb), partial_getter(rename = "attested_header_deneb"))]
    pub attested_header: LightClientHeaderDeneb,
    /// The `SyncCommittee` used in the next period.
    pub next_sync_committee: SyncCommittee<S>,
    /// Merkle proof for next sync committee
    pub next_sync_committee_branch: NextSyncCommitteeBranch,
    /// The last `LightClientHeader` from the last attested finalized block (end of epoch).
    #[superstruct(only(Altair), partial_getter(rename = "finalized_header_altair"))]
    pub finalized_header: LightClientHeaderAltair,
    #[superstruct(only(Capella), partial_getter(rename = "finalized_header_capella"))]
    pub finalized_header: LightClientHeaderCapella,
    #[superstruct(only(Deneb), partial_getter(rename = "finalized_header_deneb"))]
    pub finalized_header: LightClientHeaderDeneb,
    /// Merkle proof attesting finalized header.
    pub finality_branch: FinalityBranch,
    /// current sync aggregate
    pub sync_aggregate: SyncAggregate<S>,
    /// Slot of the sync aggregated signature
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

impl<S: ConsensusSpec> LightClientUpdate<S> {
    pub fn from_ssz_bytes(bytes: &[u8], fork_name: ForkName) -> Result<Self, ssz::DecodeError> {
        match fork_name.light_client_fork() {
            Some(ForkName::Capella) => {
                LightClientUpdateCapella::from_ssz_bytes(bytes).map(Self::Capella)
            }
            Some(ForkName::Deneb) => LightClientUpdateDeneb::from_ssz_bytes(bytes).map(Self::Deneb),
            Some(_) => LightClientUpdateAltair::from_ssz_bytes(bytes).map(Self::Altair),
            None => Err(no_light_client_schema(fork_name)),
        }
    }

    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Altair(_) => ForkName::Altair,
            Self::Capella(_) => ForkName::Capella,
            Self::Deneb(_) => ForkName::Deneb,
        }
    }

    pub fn attested_header(&self) -> LightClientHeader {
        match self {
            Self::Altair(update) => LightClientHeader::Altair(update.attested_header.clone()),
            Self::Capella(update) => LightClientHeader::Capella(update.attested_header.clone()),
            Self::Deneb(update) => LightClientHeader::Deneb(update.attested_header.clone()),
        }
    }

    pub fn finalized_header(&self) -> LightClientHeader {
        match self {
            Self::Altair(update) => LightClientHeader::Altair(update.finalized_header.clone()),
            Self::Capella(update) => LightClientHeader::Capella(update.finalized_header.clone()),
            Self::Deneb(update) => LightClientHeader::Deneb(update.finalized_header.clone()),
        }
    }

    pub fn attested_slot(&self) -> u64 {
        match self {
            Self::Altair(update) => update.attested_header.beacon.slot,
            Self::Capella(update) => update.attested_header.beacon.slot,
            Self::Deneb(update) => update.attested_header.beacon.slot,
        }
    }

    pub fn finalized_slot(&self) -> u64 {
        match self {
            Self::Altair(update) => update.finalized_header.beacon.slot,
            Self::Capella(update) => update.finalized_header.beacon.slot,
            Self::Deneb(update) => update.finalized_header.beacon.slot,
        }
    }

    pub fn upgrade_to(self, fork_name: ForkName) -> Result<Self, UpgradeError> {
        let target = fork_name
            .light_client_fork()
            .ok_or(UpgradeError::NoLightClientSchema(fork_name))?;
        let from = self.fork_name();
        if target < from {
            return Err(UpgradeError::Downgrade { from, to: target });
        }
        let mut update = self;
        loop {
            if update.fork_name() >= target {
                return Ok(update);
            }
            update = match update {
                Self::Altair(inner) => Self::Capella(upgrade_update_to_capella(inner)),
                Self::Capella(inner) => Self::Deneb(upgrade_update_to_deneb(inner)),
                Self::Deneb(inner) => return Ok(Self::Deneb(inner)),
            };
        }
    }
}

pub fn upgrade_update_to_capella<S: ConsensusSpec>(
    pre: LightClientUpdateAltair<S>,
) -> LightClientUpdateCapella<S> {
    LightClientUpdateCapella {
        attested_header: upgrade_header_to_capella(&pre.attested_header),
        next_sync_committee: pre.next_sync_committee,
        next_sync_committee_branch: pre.next_sync_committee_branch,
        finalized_header: upgrade_header_to_capella(&pre.finalized_header),
        finality_branch: pre.finality_branch,
        sync_aggregate: pre.sync_aggregate,
        signature_slot: pre.signature_slot,
    }
}

pub fn upgrade_update_to_deneb<S: ConsensusSpec>(
    pre: LightClientUpdateCapella<S>,
) -> LightClientUpdateDeneb<S> {
    LightClientUpdateDeneb {
        attested_header: upgrade_header_to_deneb(&pre.attested_header),
        next_sync_committee: pre.next_sync_committee,
        next_sync_committee_branch: pre.next_sync_committee_branch,
        finalized_header: upgrade_header_to_deneb(&pre.finalized_header),
        finality_branch: pre.finality_branch,
        sync_aggregate: pre.sync_aggregate,
        signature_slot: pre.signature_slot,
    }
}

#[cfg(test)]
mod test {
    use ssz::Encode;
    use tree_hash::TreeHash;

    use super::*;
    use crate::{
        consensus::header::BeaconBlockHeader, merkle::is_zero_branch, MinimalConsensusSpec,
    };

    type Update = LightClientUpdate<MinimalConsensusSpec>;

    fn altair_update() -> LightClientUpdateAltair<MinimalConsensusSpec> {
        let mut sync_aggregate = SyncAggregate::default();
        sync_aggregate.sync_committee_bits.set(3, true).unwrap();
        LightClientUpdateAltair {
            attested_header: LightClientHeaderAltair {
                beacon: BeaconBlockHeader {
                    slot: 100,
                    ..Default::default()
                },
            },
            next_sync_committee: SyncCommittee::default(),
            next_sync_committee_branch: FixedVector::from(vec![B256::repeat_byte(5); 5]),
            finalized_header: LightClientHeaderAltair {
                beacon: BeaconBlockHeader {
                    slot: 88,
                    ..Default::default()
                },
            },
            finality_branch: FixedVector::from(vec![B256::repeat_byte(6); 6]),
            sync_aggregate,
            signature_slot: 101,
        }
    }

    #[test]
    fn ssz_round_trip_each_fork() {
        let altair = Update::Altair(altair_update());
        for fork_name in [ForkName::Altair, ForkName::Capella, ForkName::Deneb] {
            let update = altair.clone().upgrade_to(fork_name).unwrap();
            let bytes = update.as_ssz_bytes();
            let decoded = Update::from_ssz_bytes(&bytes, fork_name).unwrap();
            assert_eq!(decoded, update);
            assert_eq!(decoded.tree_hash_root(), update.tree_hash_root());
        }
    }

    #[test]
    fn upgrade_to_deneb() {
        let update = Update::Altair(altair_update())
            .upgrade_to(ForkName::Deneb)
            .unwrap();

        assert_eq!(update.fork_name(), ForkName::Deneb);
        assert_eq!(update.attested_slot(), 100);
        assert_eq!(update.finalized_slot(), 88);
        assert_eq!(update.signature_slot(), 101);
        assert_eq!(update.sync_aggregate().num_set_bits(), 1);
        assert!(is_zero_branch(
            update.attested_header().execution_branch().unwrap()
        ));
        assert_eq!(
            update.finality_branch(),
            &FixedVector::from(vec![B256::repeat_byte(6); 6])
        );
    }

    #[test]
    fn quoted_signature_slot_is_accepted() {
        let update = altair_update();
        let mut json = serde_json::to_value(&update).unwrap();
        json["signature_slot"] = serde_json::Value::String("101".to_string());
        let decoded: LightClientUpdateAltair<MinimalConsensusSpec> =
            serde_json::from_value(json).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut json = serde_json::to_value(altair_update()).unwrap();
        json["extra"] = serde_json::Value::Bool(true);
        assert!(
            serde_json::from_value::<LightClientUpdateAltair<MinimalConsensusSpec>>(json).is_err()
        );
    }
}
