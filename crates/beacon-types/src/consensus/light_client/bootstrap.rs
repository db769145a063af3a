use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz::Decode;
use ssz_derive::{Decode, Encode};
use ssz_types::FixedVector;
use superstruct::superstruct;
use tree_hash_derive::TreeHash;

use crate::{
    consensus::{
        constants::CurrentSyncCommitteeProofLen,
        fork::{ForkName, UpgradeError},
        header::BeaconBlockHeader,
        light_client::header::{
            no_light_client_schema, upgrade_header_to_capella, upgrade_header_to_deneb,
            LightClientHeader, LightClientHeaderAltair, LightClientHeaderCapella,
            LightClientHeaderDeneb,
        },
        sync_committee::SyncCommittee,
    },
    consensus_spec::ConsensusSpec,
};

pub type CurrentSyncCommitteeBranch = FixedVector<B256, CurrentSyncCommitteeProofLen>;

/// `LightClientBootstrap` object for the configured trusted block root.
/// The bootstrap object is used to generate a local `LightClientStore`.
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
pub struct LightClientBootstrap<S: ConsensusSpec> {
    /// Header matching the requested beacon block root
    #[superstruct(only(Altair), partial_getter(rename = "header_altair"))]
    pub header: LightClientHeaderAltair,
    #[superstruct(only(Capella), partial_getter(rename = "header_capella"))]
    pub header: LightClientHeaderCapella,
    #[superstruct(only(Deneb), partial_getter(rename = "header_deneb"))]
    pub header: LightClientHeaderDeneb,
    /// Current sync committee corresponding to `header.beacon.state_root`
    pub current_sync_committee: SyncCommittee<S>,
    pub current_sync_committee_branch: CurrentSyncCommitteeBranch,
}

impl<S: ConsensusSpec> LightClientBootstrap<S> {
    pub fn from_ssz_bytes(bytes: &[u8], fork_name: ForkName) -> Result<Self, ssz::DecodeError> {
        match fork_name.light_client_fork() {
            Some(ForkName::Capella) => {
                LightClientBootstrapCapella::from_ssz_bytes(bytes).map(Self::Capella)
            }
            Some(ForkName::Deneb) => {
                LightClientBootstrapDeneb::from_ssz_bytes(bytes).map(Self::Deneb)
            }
            Some(_) => LightClientBootstrapAltair::from_ssz_bytes(bytes).map(Self::Altair),
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

    pub fn header(&self) -> LightClientHeader {
        match self {
            Self::Altair(bootstrap) => LightClientHeader::Altair(bootstrap.header.clone()),
            Self::Capella(bootstrap) => LightClientHeader::Capella(bootstrap.header.clone()),
            Self::Deneb(bootstrap) => LightClientHeader::Deneb(bootstrap.header.clone()),
        }
    }

    /// Returns the `BeaconBlockHeader` from the `LightClientBootstrap` object.
    pub fn get_beacon_block_header(&self) -> &BeaconBlockHeader {
        match self {
            Self::Altair(bootstrap) => &bootstrap.header.beacon,
            Self::Capella(bootstrap) => &bootstrap.header.beacon,
            Self::Deneb(bootstrap) => &bootstrap.header.beacon,
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
        let mut bootstrap = self;
        loop {
            if bootstrap.fork_name() >= target {
                return Ok(bootstrap);
            }
            bootstrap = match bootstrap {
                Self::Altair(inner) => Self::Capella(upgrade_bootstrap_to_capella(inner)),
                Self::Capella(inner) => Self::Deneb(upgrade_bootstrap_to_deneb(inner)),
                Self::Deneb(inner) => return Ok(Self::Deneb(inner)),
            };
        }
    }
}

pub fn upgrade_bootstrap_to_capella<S: ConsensusSpec>(
    pre: LightClientBootstrapAltair<S>,
) -> LightClientBootstrapCapella<S> {
    LightClientBootstrapCapella {
        header: upgrade_header_to_capella(&pre.header),
        current_sync_committee: pre.current_sync_committee,
        current_sync_committee_branch: pre.current_sync_committee_branch,
    }
}

pub fn upgrade_bootstrap_to_deneb<S: ConsensusSpec>(
    pre: LightClientBootstrapCapella<S>,
) -> LightClientBootstrapDeneb<S> {
    LightClientBootstrapDeneb {
        header: upgrade_header_to_deneb(&pre.header),
        current_sync_committee: pre.current_sync_committee,
        current_sync_committee_branch: pre.current_sync_committee_branch,
    }
}
