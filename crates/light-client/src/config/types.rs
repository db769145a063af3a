use alloy_primitives::{FixedBytes, B256};
use beacon_types::consensus::fork::ForkName;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub genesis_time: u64,
    pub genesis_root: B256,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Forks {
    pub genesis: Fork,
    pub altair: Fork,
    pub bellatrix: Fork,
    pub capella: Fork,
    pub deneb: Fork,
}

impl Forks {
    pub fn get(&self, fork_name: ForkName) -> &Fork {
        match fork_name {
            ForkName::Phase0 => &self.genesis,
            ForkName::Altair => &self.altair,
            ForkName::Bellatrix => &self.bellatrix,
            ForkName::Capella => &self.capella,
            ForkName::Deneb => &self.deneb,
        }
    }

    /// The fork active at `epoch`.
    pub fn fork_name_at_epoch(&self, epoch: u64) -> ForkName {
        ForkName::ALL
            .into_iter()
            .rev()
            .find(|fork_name| epoch >= self.get(*fork_name).epoch)
            .unwrap_or(ForkName::Phase0)
    }

    pub fn fork_version_at_epoch(&self, epoch: u64) -> FixedBytes<4> {
        self.get(self.fork_name_at_epoch(epoch)).fork_version
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Fork {
    pub epoch: u64,
    pub fork_version: FixedBytes<4>,
}

/// Tunables of the light client sync protocol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncProtocolConfig {
    /// Minimum number of set sync committee bits for an update to be considered at all.
    pub min_sync_committee_participants: u64,
    /// Slots without finality after which the best valid update is force-applied.
    /// Defaults to one sync committee period.
    pub update_timeout: Option<u64>,
}

impl Default for SyncProtocolConfig {
    fn default() -> Self {
        Self {
            min_sync_committee_participants: 1,
            update_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::fixed_bytes;

    use super::*;
    use crate::config::networks;

    #[test]
    fn fork_schedule_lookup() {
        let forks = networks::mainnet().forks;
        assert_eq!(forks.fork_name_at_epoch(0), ForkName::Phase0);
        assert_eq!(forks.fork_name_at_epoch(74_239), ForkName::Phase0);
        assert_eq!(forks.fork_name_at_epoch(74_240), ForkName::Altair);
        assert_eq!(forks.fork_name_at_epoch(194_047), ForkName::Bellatrix);
        assert_eq!(forks.fork_name_at_epoch(194_048), ForkName::Capella);
        assert_eq!(forks.fork_name_at_epoch(u64::MAX), ForkName::Deneb);
        assert_eq!(
            forks.fork_version_at_epoch(269_568),
            fixed_bytes!("04000000")
        );
    }
}
