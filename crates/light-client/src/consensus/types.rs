use beacon_types::{
    consensus::{
        light_client::{
            header::LightClientHeader,
            update::{FinalityBranch, LightClientUpdate, NextSyncCommitteeBranch},
        },
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    merkle::is_zero_branch,
    ConsensusSpec,
};
use serde::Serialize;

use crate::consensus::errors::ConsensusError;

/// An update with its optional parts made explicit. A finalized header or next sync
/// committee is only present when the update carries a proof for it.
#[derive(Debug, Clone)]
pub struct GenericUpdate<S: ConsensusSpec> {
    pub attested_header: LightClientHeader,
    pub sync_aggregate: SyncAggregate<S>,
    pub signature_slot: u64,
    pub next_sync_committee: Option<SyncCommittee<S>>,
    pub next_sync_committee_branch: Option<NextSyncCommitteeBranch>,
    pub finalized_header: Option<LightClientHeader>,
    pub finality_branch: Option<FinalityBranch>,
}

impl<S: ConsensusSpec> GenericUpdate<S> {
    pub fn attested_slot(&self) -> u64 {
        self.attested_header.slot()
    }

    /// Slot of the finalized header, 0 when the update does not finalize anything.
    pub fn finalized_slot(&self) -> u64 {
        self.finalized_header
            .as_ref()
            .map(|header| header.slot())
            .unwrap_or_default()
    }

    pub fn participants(&self) -> u64 {
        self.sync_aggregate.num_set_bits() as u64
    }

    pub fn is_sync_committee_update(&self) -> bool {
        self.next_sync_committee.is_some()
    }

    pub fn is_finality_update(&self) -> bool {
        self.finalized_header.is_some()
    }
}

/// Splits an update into its proven parts. Data without a proof must be zeroed.
impl<S: ConsensusSpec> TryFrom<&LightClientUpdate<S>> for GenericUpdate<S> {
    type Error = ConsensusError;

    fn try_from(update: &LightClientUpdate<S>) -> Result<Self, Self::Error> {
        let (next_sync_committee, next_sync_committee_branch) =
            if is_sync_committee_update(update) {
                (
                    Some(update.next_sync_committee().clone()),
                    Some(update.next_sync_committee_branch().clone()),
                )
            } else if *update.next_sync_committee() != SyncCommittee::default() {
                return Err(ConsensusError::UnexpectedNextSyncCommittee);
            } else {
                (None, None)
            };

        let finalized_header = update.finalized_header();
        let (finalized_header, finality_branch) = if is_finality_update(update) {
            (
                Some(finalized_header),
                Some(update.finality_branch().clone()),
            )
        } else if !finalized_header.is_empty() {
            return Err(ConsensusError::UnexpectedFinalizedHeader);
        } else {
            (None, None)
        };

        Ok(Self {
            attested_header: update.attested_header(),
            sync_aggregate: update.sync_aggregate().clone(),
            signature_slot: update.signature_slot(),
            next_sync_committee,
            next_sync_committee_branch,
            finalized_header,
            finality_branch,
        })
    }
}

pub fn is_sync_committee_update<S: ConsensusSpec>(update: &LightClientUpdate<S>) -> bool {
    !is_zero_branch(update.next_sync_committee_branch())
}

pub fn is_finality_update<S: ConsensusSpec>(update: &LightClientUpdate<S>) -> bool {
    !is_zero_branch(update.finality_branch())
}

/// Lifecycle of a light client processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum SyncState {
    Uninitialised,
    /// The store holds a verified bootstrap and nothing else yet.
    Bootstrapped,
    /// At least one update has been accepted since the bootstrap.
    Tracking,
}

/// What an accepted update changed in the store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub best_valid_update_replaced: bool,
    pub optimistic_header_advanced: bool,
    pub finalized_header_advanced: bool,
    pub next_sync_committee_learned: bool,
    pub sync_committee_rotated: bool,
}

impl UpdateOutcome {
    /// An update can be valid and still change nothing.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}
