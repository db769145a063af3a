use alloy_primitives::B256;
use serde::Serialize;

use crate::config::{ChainConfig, Forks, SyncProtocolConfig};

/// The base configuration for a network.
#[derive(Serialize, Default)]
pub struct BaseConfig {
    /// Name of the consensus preset the network runs on.
    pub preset: String,
    pub default_checkpoint: B256,
    pub chain: ChainConfig,
    pub forks: Forks,
    pub max_checkpoint_age: u64,
    pub sync: SyncProtocolConfig,
}
