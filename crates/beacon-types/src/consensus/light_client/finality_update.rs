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
                FinalityBranch, LightClientUpdate, LightClientUpdateAltair,
                LightClientUpdateCapella, LightClientUpdateDeneb,
            },
        },
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    consensus_spec::ConsensusSpec,
    merkle::zero_branch,
};

/// A LightClientFinalityUpdate is the update that
/// signal a new finalized beacon block header for the light client sync protocol.
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
pub struct LightClientFinalityUpdate<S: ConsensusSpec> {
    /// The last `LightClientHeader` from the last attested block by the sync committee.
    #[superstruct(only(Altair), partial_getter(rename = "attested_header_altair"))]
    pub attested_header: LightClientHeaderAltair,
    #[superstruct(only(Capella), partial_getter(rename = "attested_header_capella"))]
    pub attested_header: LightClientHeaderCapella,
    #[superstruct(only(Deneb), partial_getter(rename = "attested_header_deneb"))]
    pub attested_header: LightClientHeaderDeneb,
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

impl<S: ConsensusSpec> LightClientFinalityUpdate<S> {
    pub fn from_ssz_bytes(bytes: &[u8], fork_name: ForkName) -> Result<Self, ssz::DecodeError> {
        match fork_name.light_client_fork() {
            Some(ForkName::Capella) => {
                LightClientFinalityUpdateCapella::from_ssz_bytes(bytes).map(Self::Capella)
            }
            Some(ForkName::Deneb) => {
                LightClientFinalityUpdateDeneb::from_ssz_bytes(bytes).map(Self::Deneb)
            }
            Some(_) => LightClientFinalityUpdateAltair::from_ssz_bytes(bytes).map(Self::Altair),
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
                Self::Altair(inner) => Self::Capella(upgrade_finality_update_to_capella(inner)),
                Self::Capella(inner) => Self::Deneb(upgrade_finality_update_to_deneb(inner)),
                Self::Deneb(inner) => return Ok(Self::Deneb(inner)),
            };
        }
    }
}

pub fn upgrade_finality_update_to_capella<S: ConsensusSpec>(
    pre: LightClientFinalityUpdateAltair<S>,
) -> LightClientFinalityUpdateCapella<S> {
    LightClientFinalityUpdateCapella {
        attested_header: upgrade_header_to_capella(&pre.attested_header),
        finalized_header: upgrade_header_to_capella(&pre.finalized_header),
        finality_branch: pre.finality_branch,
        sync_aggregate: pre.sync_aggregate,
        signature_slot: pre.signature_slot,
    }
}

pub fn upgrade_finality_update_to_deneb<S: ConsensusSpec>(
    pre: LightClientFinalityUpdateCapella<S>,
) -> LightClientFinalityUpdateDeneb<S> {
    LightClientFinalityUpdateDeneb {
        attested_header: upgrade_header_to_deneb(&pre.attested_header),
        finalized_header: upgrade_header_to_deneb(&pre.finalized_header),
        finality_branch: pre.finality_branch,
        sync_aggregate: pre.sync_aggregate,
        signature_slot: pre.signature_slot,
    }
}

/// A finality update is a full update that does not claim a next sync committee.
impl<S: ConsensusSpec> From<LightClientFinalityUpdate<S>> for LightClientUpdate<S> {
    fn from(update: LightClientFinalityUpdate<S>) -> Self {
        match update {
            LightClientFinalityUpdate::Altair(update) => Self::Altair(LightClientUpdateAltair {
                attested_header: update.attested_header,
                next_sync_committee: SyncCommittee::default(),
                next_sync_committee_branch: zero_branch(),
                finalized_header: update.finalized_header,
                finality_branch: update.finality_branch,
                sync_aggregate: update.sync_aggregate,
                signature_slot: update.signature_slot,
            }),
            LightClientFinalityUpdate::Capella(update) => {
                Self::Capella(LightClientUpdateCapella {
                    attested_header: update.attested_header,
                    next_sync_committee: SyncCommittee::default(),
                    next_sync_committee_branch: zero_branch(),
                    finalized_header: update.finalized_header,
                    finality_branch: update.finality_branch,
                    sync_aggregate: update.sync_aggregate,
                    signature_slot: update.signature_slot,
                })
            }
            LightClientFinalityUpdate::Deneb(update) => Self::Deneb(LightClientUpdateDeneb {
                attested_header: update.attested_header,
                next_sync_committee: SyncCommittee::default(),
                next_sync_committee_branch: zero_branch(),
                finalized_header: update.finalized_header,
                finality_branch: update.finality_branch,
                sync_aggregate: update.sync_aggregate,
                signature_slot: update.signature_slot,
            }),
        }
    }
}
