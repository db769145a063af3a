use alloy_primitives::{b256, fixed_bytes, B256};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::config::{BaseConfig, ChainConfig, Fork, Forks, SyncProtocolConfig};

/// Epoch of a fork that is not scheduled.
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    Hash,
    Eq,
    PartialEq,
    PartialOrd,
    Ord,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Sepolia,
    Minimal,
}

impl Network {
    pub fn to_base_config(self) -> BaseConfig {
        match self {
            Self::Mainnet => mainnet(),
            Self::Sepolia => sepolia(),
            Self::Minimal => minimal(),
        }
    }
}

pub fn mainnet() -> BaseConfig {
    BaseConfig {
        preset: "mainnet".to_string(),
        default_checkpoint: b256!("766647f3c4e1fc91c0db9a9374032ae038778411fbff222974e11f2e3ce7dadf"),
        chain: ChainConfig {
            genesis_time: 1606824023,
            genesis_root: b256!("4b363db94e286120d76eb905340fdd4e54bfe9f06bf33ff6cf5ad27f511bfe95"),
        },
        forks: Forks {
            genesis: Fork {
                epoch: 0,
                fork_version: fixed_bytes!("00000000"),
            },
            altair: Fork {
                epoch: 74240,
                fork_version: fixed_bytes!("01000000"),
            },
            bellatrix: Fork {
                epoch: 144896,
                fork_version: fixed_bytes!("02000000"),
            },
            capella: Fork {
                epoch: 194048,
                fork_version: fixed_bytes!("03000000"),
            },
            deneb: Fork {
                epoch: 269568,
                fork_version: fixed_bytes!("04000000"),
            },
        },
        max_checkpoint_age: 1_209_600, // 14 days
        sync: SyncProtocolConfig::default(),
    }
}

pub fn sepolia() -> BaseConfig {
    BaseConfig {
        preset: "mainnet".to_string(),
        default_checkpoint: b256!("234931a3fe5d791f06092477357e2d65dcf6fa6cad048680eb93ad3ea494bbcd"),
        chain: ChainConfig {
            genesis_time: 1655733600,
            genesis_root: b256!("d8ea171f3c94aea21ebc42a1ed61052acf3f9209c00e4efbaaddac09ed9b8078"),
        },
        forks: Forks {
            genesis: Fork {
                epoch: 0,
                fork_version: fixed_bytes!("90000069"),
            },
            altair: Fork {
                epoch: 50,
                fork_version: fixed_bytes!("90000070"),
            },
            bellatrix: Fork {
                epoch: 100,
                fork_version: fixed_bytes!("90000071"),
            },
            capella: Fork {
                epoch: 56832,
                fork_version: fixed_bytes!("90000072"),
            },
            deneb: Fork {
                epoch: 132608,
                fork_version: fixed_bytes!("90000073"),
            },
        },
        max_checkpoint_age: 1_209_600, // 14 days
        sync: SyncProtocolConfig::default(),
    }
}

/// A local network on the minimal preset that starts at Altair.
pub fn minimal() -> BaseConfig {
    BaseConfig {
        preset: "minimal".to_string(),
        default_checkpoint: B256::ZERO,
        chain: ChainConfig {
            genesis_time: 1_700_000_000,
            genesis_root: b256!("8c0d8d6e6f7b0ba8bd3ee4a3cfbf0bcd3d1d56c6c8a0e7d2b2a38f4e7e5f0c11"),
        },
        forks: Forks {
            genesis: Fork {
                epoch: 0,
                fork_version: fixed_bytes!("00000001"),
            },
            altair: Fork {
                epoch: 0,
                fork_version: fixed_bytes!("01000001"),
            },
            bellatrix: Fork {
                epoch: 0,
                fork_version: fixed_bytes!("02000001"),
            },
            capella: Fork {
                epoch: FAR_FUTURE_EPOCH,
                fork_version: fixed_bytes!("03000001"),
            },
            deneb: Fork {
                epoch: FAR_FUTURE_EPOCH,
                fork_version: fixed_bytes!("04000001"),
            },
        },
        max_checkpoint_age: 1_209_600,
        sync: SyncProtocolConfig::default(),
    }
}
