use serde::{Deserialize, Serialize};
use serde_this_or_that::as_u64;
use ssz::Decode;
use ssz_derive::{Decode, Encode};
use superstruct::superstruct;
use tree_hash_derive::TreeHash;

use crate::{
    consensus::{
        fork::{ForkName, UpgradeError},
        light_client::{
            header::{
                no_light_client_schema, upgrade_header_to_capella, upgrade_header_to_deneb,
                LightClientHeader, LightClientHeaderAltair, LightClientHeaderCapella,
                LightClientHeaderDeneb,
            },
            update::{
                LightClientUpdate, LightClientUpdateAltair, LightClientUpdateCapella,
                LightClientUpdateDeneb,
            },
        },
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    consensus_spec::ConsensusSpec,
    merkle::zero_branch,
};

/// A LightClientOptimisticUpdate is the update we send on each slot,
/// it is based off the current unfinalized epoch it is verified only against BLS signature.
#[superstruct(
    variants(Altair, Capella, Deneb),
    variant_attributes(
        derive(
            Debug,
            Clone,
            PartialEq,
            Serialize,
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
pub struct LightClientOptimisticUpdate<S: ConsensusSpec> {
    /// Header attested to by the sync committee
    #[superstruct(only(Altair), partial_getter(rename = "attested_header_altair"))]
    pub attested_header: LightClientHeaderAltair,
    #[superstruct(only(Capella), partial_getter(rename = "attested_header_capella"))]
    pub attested_header: LightClientHeaderCapella,
    #[superstruct(only(Deneb), partial_getter(rename = "attested_header_deneb"))]
    pub attested_header: LightClientHeaderDeneb,
    /// Sync committee aggregate signature
    pub sync_aggregate: SyncAggregate<S>,
    /// Slot at which the aggregate signature was created (untrusted)
    #[superstruct(getter(copy))]
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

impl<S: ConsensusSpec> LightClientOptimisticUpdate<S> {
    pub fn from_ssz_bytes(bytes: &[u8], fork_name: ForkName) -> Result<Self, ssz::DecodeError> {
        match fork_name.light_client_fork() {
            Some(ForkName::Capella) => {
                LightClientOptimisticUpdateCapella::from_ssz_bytes(bytes).map(Self::Capella)
            }
            Some(ForkName::Deneb) => {
                LightClientOptimisticUpdateDeneb::from_ssz_bytes(bytes).map(Self::Deneb)
            }
            Some(_) => {
                LightClientOptimisticUpdateAltair::from_ssz_bytes(bytes).map(Self::Altair)
            }
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
                Self::Altair(inner) => Self::Capella(upgrade_optimistic_update_to_capella(inner)),
                Self::Capella(inner) => Self::Deneb(upgrade_optimistic_update_to_deneb(inner)),
                Self::Deneb(inner) => return Ok(Self::Deneb(inner)),
            };
        }
    }
}

pub fn upgrade_optimistic_update_to_capella<S: ConsensusSpec>(
    pre: LightClientOptimisticUpdateAltair<S>,
) -> LightClientOptimisticUpdateCapella<S> {
    LightClientOptimisticUpdateCapella {
        attested_header: upgrade_header_to_capella(&pre.attested_header),
        sync_aggregate: pre.sync_aggregate,
        signature_slot: pre.signature_slot,
    }
}

pub fn upgrade_optimistic_update_to_deneb<S: ConsensusSpec>(
    pre: LightClientOptimisticUpdateCapella<S>,
) -> LightClientOptimisticUpdateDeneb<S> {
    LightClientOptimisticUpdateDeneb {
        attested_header: upgrade_header_to_deneb(&pre.attested_header),
        sync_aggregate: pre.sync_aggregate,
        signature_slot: pre.signature_slot,
    }
}

/// An optimistic update is a full update with neither a finality nor a committee proof.
impl<S: ConsensusSpec> From<LightClientOptimisticUpdate<S>> for LightClientUpdate<S> {
    fn from(update: LightClientOptimisticUpdate<S>) -> Self {
        match update {
            LightClientOptimisticUpdate::Altair(update) => Self::Altair(LightClientUpdateAltair {
                attested_header: update.attested_header,
                next_sync_committee: SyncCommittee::default(),
                next_sync_committee_branch: zero_branch(),
                finalized_header: Default::default(),
                finality_branch: zero_branch(),
                sync_aggregate: update.sync_aggregate,
                signature_slot: update.signature_slot,
            }),
            LightClientOptimisticUpdate::Capella(update) => {
                Self::Capella(LightClientUpdateCapella {
                    attested_header: update.attested_header,
                    next_sync_committee: SyncCommittee::default(),
                    next_sync_committee_branch: zero_branch(),
                    finalized_header: Default::default(),
                    finality_branch: zero_branch(),
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
            LightClientOptimisticUpdate::Deneb(update) => Self::Deneb(LightClientUpdateDeneb {
                attested_header: update.attested_header,
                next_sync_committee: SyncCommittee::default(),
                next_sync_committee_branch: zero_branch(),
                finalized_header: Default::default(),
                finality_branch: zero_branch(),
                sync_aggregate: update.sync_aggregate,
                signature_slot: update.signature_slot,
            }),
        }
    }
}
