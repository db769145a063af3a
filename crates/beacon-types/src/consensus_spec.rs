//! Consensus presets.
//!
//! A preset fixes the capacities that change the shape of SSZ containers (the sync committee
//! size) together with the slot/epoch/period arithmetic. Presets are types, so a store built
//! for one preset cannot be fed values decoded for another.
//!
//! Values from:
//! https://github.com/ethereum/consensus-specs/tree/dev/presets

use std::fmt::Debug;

use ssz_types::typenum::{self, Unsigned};

pub trait ConsensusSpec: 'static + Default + Sync + Send + Clone + Debug + PartialEq + Eq {
    type SyncCommitteeSize: Unsigned + Default + Debug + Sync + Send + Clone + PartialEq + Eq;

    /// Name of the preset, as used in configuration files.
    const PRESET_NAME: &'static str;

    fn slots_per_epoch() -> u64;

    fn epochs_per_sync_committee_period() -> u64;

    fn slots_per_sync_committee_period() -> u64 {
        Self::slots_per_epoch() * Self::epochs_per_sync_committee_period()
    }

    fn sync_committee_size() -> usize {
        Self::SyncCommitteeSize::to_usize()
    }

    fn compute_epoch_at_slot(slot: u64) -> u64 {
        slot / Self::slots_per_epoch()
    }

    fn compute_sync_committee_period(epoch: u64) -> u64 {
        epoch / Self::epochs_per_sync_committee_period()
    }

    fn compute_sync_committee_period_at_slot(slot: u64) -> u64 {
        Self::compute_sync_committee_period(Self::compute_epoch_at_slot(slot))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MainnetConsensusSpec;

impl ConsensusSpec for MainnetConsensusSpec {
    type SyncCommitteeSize = typenum::U512;

    const PRESET_NAME: &'static str = "mainnet";

    fn slots_per_epoch() -> u64 {
        32
    }

    fn epochs_per_sync_committee_period() -> u64 {
        256
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MinimalConsensusSpec;

impl ConsensusSpec for MinimalConsensusSpec {
    type SyncCommitteeSize = typenum::U32;

    const PRESET_NAME: &'static str = "minimal";

    fn slots_per_epoch() -> u64 {
        8
    }

    fn epochs_per_sync_committee_period() -> u64 {
        8
    }
}
