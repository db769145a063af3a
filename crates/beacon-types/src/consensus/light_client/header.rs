use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz::Decode;
use ssz_derive::{Decode, Encode};
use ssz_types::FixedVector;
use superstruct::superstruct;
use tree_hash_derive::TreeHash;

use crate::{
    consensus::{
        constants::ExecutionBranchLen,
        execution_payload::{
            upgrade_execution_payload_header_to_deneb, ExecutionPayloadHeader,
            ExecutionPayloadHeaderCapella, ExecutionPayloadHeaderDeneb,
        },
        fork::{ForkName, UpgradeError},
        header::BeaconBlockHeader,
    },
    merkle::zero_branch,
};

pub type ExecutionBranch = FixedVector<B256, ExecutionBranchLen>;

/// A beacon block header as seen by the light client. From Capella on, it also carries the
/// block's execution payload header and a proof of it against `beacon.body_root`.
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
        serde(deny_unknown_fields),
    )
)]
#[derive(Debug, Clone, PartialEq, Serialize, Encode, TreeHash)]
#[serde(untagged)]
#[ssz(enum_behaviour = "transparent")]
#[tree_hash(enum_behaviour = "transparent")]
pub struct LightClientHeader {
    pub beacon: BeaconBlockHeader,
    #[superstruct(only(Capella), partial_getter(rename = "execution_capella"))]
    pub execution: ExecutionPayloadHeaderCapella,
    #[superstruct(only(Deneb), partial_getter(rename = "execution_deneb"))]
    pub execution: ExecutionPayloadHeaderDeneb,
    #[superstruct(only(Capella, Deneb))]
    pub execution_branch: ExecutionBranch,
}

impl Default for LightClientHeader {
    fn default() -> Self {
        Self::Altair(LightClientHeaderAltair::default())
    }
}

impl LightClientHeader {
    pub fn from_ssz_bytes(bytes: &[u8], fork_name: ForkName) -> Result<Self, ssz::DecodeError> {
        match fork_name.light_client_fork() {
            Some(ForkName::Capella) => {
                LightClientHeaderCapella::from_ssz_bytes(bytes).map(Self::Capella)
            }
            Some(ForkName::Deneb) => LightClientHeaderDeneb::from_ssz_bytes(bytes).map(Self::Deneb),
            Some(_) => LightClientHeaderAltair::from_ssz_bytes(bytes).map(Self::Altair),
            None => Err(no_light_client_schema(fork_name)),
        }
    }

    /// The all-zero header of the given light client fork.
    pub fn empty(fork_name: ForkName) -> Result<Self, UpgradeError> {
        match fork_name.light_client_fork() {
            Some(ForkName::Capella) => Ok(Self::Capella(LightClientHeaderCapella::default())),
            Some(ForkName::Deneb) => Ok(Self::Deneb(LightClientHeaderDeneb::default())),
            Some(_) => Ok(Self::Altair(LightClientHeaderAltair::default())),
            None => Err(UpgradeError::NoLightClientSchema(fork_name)),
        }
    }

    /// The light client fork whose schema this header uses.
    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Altair(_) => ForkName::Altair,
            Self::Capella(_) => ForkName::Capella,
            Self::Deneb(_) => ForkName::Deneb,
        }
    }

    pub fn slot(&self) -> u64 {
        self.beacon().slot
    }

    /// Returns `true` for the zeroed header of this header's fork, the placeholder used when an
    /// update carries no finality proof.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Altair(header) => *header == LightClientHeaderAltair::default(),
            Self::Capella(header) => *header == LightClientHeaderCapella::default(),
            Self::Deneb(header) => *header == LightClientHeaderDeneb::default(),
        }
    }

    pub fn execution(&self) -> Option<ExecutionPayloadHeader> {
        match self {
            Self::Altair(_) => None,
            Self::Capella(header) => Some(ExecutionPayloadHeader::Capella(header.execution.clone())),
            Self::Deneb(header) => Some(ExecutionPayloadHeader::Deneb(header.execution.clone())),
        }
    }

    /// Moves the header forward to the schema of `fork_name`.
    pub fn upgrade_to(self, fork_name: ForkName) -> Result<Self, UpgradeError> {
        let target = fork_name
            .light_client_fork()
            .ok_or(UpgradeError::NoLightClientSchema(fork_name))?;
        let from = self.fork_name();
        if target < from {
            return Err(UpgradeError::Downgrade { from, to: target });
        }
        let mut header = self;
        loop {
            if header.fork_name() >= target {
                return Ok(header);
            }
            header = match header {
                Self::Altair(inner) => Self::Capella(upgrade_header_to_capella(&inner)),
                Self::Capella(inner) => Self::Deneb(upgrade_header_to_deneb(&inner)),
                Self::Deneb(inner) => return Ok(Self::Deneb(inner)),
            };
        }
    }
}

pub(crate) fn no_light_client_schema(fork_name: ForkName) -> ssz::DecodeError {
    ssz::DecodeError::BytesInvalid(format!("fork {fork_name} has no light client schema"))
}

/// An Altair header has no execution data. The upgraded header carries an empty execution
/// payload header and a zero branch, so it proves nothing about the execution block.
pub fn upgrade_header_to_capella(pre: &LightClientHeaderAltair) -> LightClientHeaderCapella {
    LightClientHeaderCapella {
        beacon: pre.beacon.clone(),
        execution: ExecutionPayloadHeaderCapella::default(),
        execution_branch: zero_branch(),
    }
}

pub fn upgrade_header_to_deneb(pre: &LightClientHeaderCapella) -> LightClientHeaderDeneb {
    LightClientHeaderDeneb {
        beacon: pre.beacon.clone(),
        execution: upgrade_execution_payload_header_to_deneb(&pre.execution),
        execution_branch: pre.execution_branch.clone(),
    }
}
