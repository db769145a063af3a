use std::{
    fmt,
    fmt::{Display, Formatter},
    str::FromStr,
};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_types::{typenum::U4, FixedVector};
use thiserror::Error;
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::consensus::constants::{
    EXECUTION_PAYLOAD_DEPTH, FINALIZED_ROOT_DEPTH, SYNC_COMMITTEE_DEPTH,
};

pub const FORK_DIGEST_LEN: usize = 4;
pub type ForkDigest = [u8; FORK_DIGEST_LEN];
pub type ForkVersion = [u8; 4];

/// Error returned when a value is moved between forks in an unsupported direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("cannot downgrade from {from} to {to}")]
    Downgrade { from: ForkName, to: ForkName },
    #[error("fork {0} has no light client schema")]
    NoLightClientSchema(ForkName),
}

/// Beacon chain forks, in activation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum ForkName {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
}

impl ForkName {
    pub const ALL: [ForkName; 5] = [
        ForkName::Phase0,
        ForkName::Altair,
        ForkName::Bellatrix,
        ForkName::Capella,
        ForkName::Deneb,
    ];

    pub fn next(&self) -> Option<ForkName> {
        match self {
            ForkName::Phase0 => Some(ForkName::Altair),
            ForkName::Altair => Some(ForkName::Bellatrix),
            ForkName::Bellatrix => Some(ForkName::Capella),
            ForkName::Capella => Some(ForkName::Deneb),
            ForkName::Deneb => None,
        }
    }

    /// Sync committees, and with them the light client protocol, start at Altair.
    pub fn has_light_client(&self) -> bool {
        *self >= ForkName::Altair
    }

    /// Light client headers carry the execution payload header from Capella on.
    pub fn has_light_client_execution(&self) -> bool {
        *self >= ForkName::Capella
    }

    pub fn has_blob_gas(&self) -> bool {
        *self >= ForkName::Deneb
    }

    /// The fork whose light client schema is used while `self` is active.
    ///
    /// Bellatrix did not change the light client containers, so it shares Altair's.
    pub fn light_client_fork(&self) -> Option<ForkName> {
        match self {
            ForkName::Phase0 => None,
            ForkName::Altair | ForkName::Bellatrix => Some(ForkName::Altair),
            ForkName::Capella => Some(ForkName::Capella),
            ForkName::Deneb => Some(ForkName::Deneb),
        }
    }

    pub fn sync_committee_branch_depth(&self) -> Option<usize> {
        self.has_light_client().then_some(SYNC_COMMITTEE_DEPTH)
    }

    pub fn finality_branch_depth(&self) -> Option<usize> {
        self.has_light_client().then_some(FINALIZED_ROOT_DEPTH)
    }

    pub fn execution_branch_depth(&self) -> Option<usize> {
        self.has_light_client_execution()
            .then_some(EXECUTION_PAYLOAD_DEPTH)
    }
}

impl FromStr for ForkName {
    type Err = String;

    fn from_str(fork_name: &str) -> Result<Self, String> {
        Ok(match fork_name.to_lowercase().as_ref() {
            "phase0" | "base" => ForkName::Phase0,
            "altair" => ForkName::Altair,
            "bellatrix" | "merge" => ForkName::Bellatrix,
            "capella" => ForkName::Capella,
            "deneb" => ForkName::Deneb,
            _ => return Err(format!("unknown fork name: {fork_name}")),
        })
    }
}

impl Display for ForkName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ForkName::Phase0 => "phase0".fmt(f),
            ForkName::Altair => "altair".fmt(f),
            ForkName::Bellatrix => "bellatrix".fmt(f),
            ForkName::Capella => "capella".fmt(f),
            ForkName::Deneb => "deneb".fmt(f),
        }
    }
}

impl From<ForkName> for String {
    fn from(fork: ForkName) -> String {
        fork.to_string()
    }
}

impl TryFrom<String> for ForkName {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#forkdata
#[derive(Default, Debug, TreeHash)]
struct ForkData {
    current_version: FixedVector<u8, U4>,
    genesis_validators_root: B256,
}

pub fn compute_fork_data_root(current_version: ForkVersion, genesis_validators_root: B256) -> B256 {
    let fork_data = ForkData {
        current_version: FixedVector::from(current_version.to_vec()),
        genesis_validators_root,
    };
    fork_data.tree_hash_root()
}

/// The 4-byte digest namespacing gossip topics and req/resp protocols while
/// `current_version` is active.
pub fn compute_fork_digest(current_version: ForkVersion, genesis_validators_root: B256) -> ForkDigest {
    let root = compute_fork_data_root(current_version, genesis_validators_root);
    let mut digest = [0u8; FORK_DIGEST_LEN];
    digest.copy_from_slice(&root[..FORK_DIGEST_LEN]);
    digest
}
