use std::path::Path;

use alloy_primitives::{FixedBytes, B256};
use anyhow::{anyhow, Result};
use beacon_types::{consensus::fork::ForkName, ConsensusSpec};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::config::{networks::Network, BaseConfig, ChainConfig, Forks, SyncProtocolConfig};

/// Prefix of the environment variables that override file configuration.
pub const ENV_PREFIX: &str = "LIGHT_CLIENT_";

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub preset: String,
    pub default_checkpoint: B256,
    #[serde(default)]
    pub checkpoint: Option<B256>,
    pub chain: ChainConfig,
    pub forks: Forks,
    pub max_checkpoint_age: u64,
    #[serde(default)]
    pub strict_checkpoint_age: bool,
    #[serde(default)]
    pub sync: SyncProtocolConfig,
}

impl Config {
    /// Layers the base config of `network`, the `[<network>]` table of the TOML file at
    /// `config_path` and `LIGHT_CLIENT_*` environment variables, in that order.
    ///
    /// Nested keys are separated by a double underscore in the environment, e.g.
    /// `LIGHT_CLIENT_SYNC__MIN_SYNC_COMMITTEE_PARTICIPANTS=64`.
    pub fn from_file(config_path: &Path, network: Network) -> Result<Self> {
        let profile = network.to_string();
        let base_provider = Serialized::from(network.to_base_config(), profile.as_str());
        let toml_provider = Toml::file(config_path).nested();
        let env_provider = Env::prefixed(ENV_PREFIX).split("__").global();

        Figment::new()
            .merge(base_provider)
            .merge(toml_provider)
            .merge(env_provider)
            .select(profile.as_str())
            .extract()
            .map_err(|err| match err.kind {
                figment::error::Kind::MissingField(ref field) => {
                    anyhow!("missing configuration field: {field}")
                }
                _ => anyhow!("cannot parse configuration: {err}"),
            })
    }

    /// The block root the client bootstraps from.
    pub fn trusted_block_root(&self) -> B256 {
        self.checkpoint.unwrap_or(self.default_checkpoint)
    }

    pub fn fork_name_at_slot<S: ConsensusSpec>(&self, slot: u64) -> ForkName {
        self.forks
            .fork_name_at_epoch(S::compute_epoch_at_slot(slot))
    }

    pub fn fork_version<S: ConsensusSpec>(&self, slot: u64) -> FixedBytes<4> {
        self.forks
            .fork_version_at_epoch(S::compute_epoch_at_slot(slot))
    }

    /// Slots without a finality advance after which the best valid update is forced in.
    pub fn update_timeout<S: ConsensusSpec>(&self) -> u64 {
        self.sync
            .update_timeout
            .unwrap_or_else(S::slots_per_sync_committee_period)
    }

    pub fn to_base_config(&self) -> BaseConfig {
        BaseConfig {
            preset: self.preset.clone(),
            default_checkpoint: self.default_checkpoint,
            chain: self.chain.clone(),
            forks: self.forks.clone(),
            max_checkpoint_age: self.max_checkpoint_age,
            sync: self.sync.clone(),
        }
    }
}

impl From<BaseConfig> for Config {
    fn from(base: BaseConfig) -> Self {
        Self {
            preset: base.preset,
            default_checkpoint: base.default_checkpoint,
            checkpoint: None,
            chain: base.chain,
            forks: base.forks,
            max_checkpoint_age: base.max_checkpoint_age,
            strict_checkpoint_age: false,
            sync: base.sync,
        }
    }
}
