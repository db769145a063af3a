use serde::Serialize;

use crate::{
    consensus::{
        fork::{ForkName, UpgradeError},
        light_client::{
            bootstrap::LightClientBootstrap, header::LightClientHeader,
            update::LightClientUpdate,
        },
        sync_committee::SyncCommittee,
    },
    consensus_spec::ConsensusSpec,
};

/// `LightClientStore` object for the light client sync protocol.
///
/// The store is tagged with the light client fork its headers are encoded in. Every header
/// it holds (and the best valid update, if any) uses that fork's schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "S: ConsensusSpec")]
pub struct LightClientStore<S: ConsensusSpec> {
    pub fork_name: ForkName,
    /// Header that is finalized
    pub finalized_header: LightClientHeader,
    /// Sync committees corresponding to the finalized header
    pub current_sync_committee: SyncCommittee<S>,
    pub next_sync_committee: Option<SyncCommittee<S>>,
    /// Best available header to switch finalized head to if we see nothing else
    pub best_valid_update: Option<LightClientUpdate<S>>,
    /// Most recent available reasonably-safe header
    pub optimistic_header: LightClientHeader,
    /// Max number of active participants in a sync committee (used to calculate safety
    /// threshold)
    pub previous_max_active_participants: u64,
    pub current_max_active_participants: u64,
}

impl<S: ConsensusSpec> LightClientStore<S> {
    /// Builds a store from an already verified bootstrap.
    pub fn from_bootstrap(bootstrap: &LightClientBootstrap<S>) -> Self {
        let header = bootstrap.header();
        Self {
            fork_name: bootstrap.fork_name(),
            finalized_header: header.clone(),
            current_sync_committee: bootstrap.current_sync_committee().clone(),
            next_sync_committee: None,
            best_valid_update: None,
            optimistic_header: header,
            previous_max_active_participants: 0,
            current_max_active_participants: 0,
        }
    }

    pub fn finalized_slot(&self) -> u64 {
        self.finalized_header.slot()
    }

    pub fn optimistic_slot(&self) -> u64 {
        self.optimistic_header.slot()
    }

    pub fn finalized_period(&self) -> u64 {
        S::compute_sync_committee_period_at_slot(self.finalized_slot())
    }

    pub fn is_next_sync_committee_known(&self) -> bool {
        self.next_sync_committee.is_some()
    }

    /// Participation a single update must exceed to move the optimistic header.
    pub fn safety_threshold(&self) -> u64 {
        self.previous_max_active_participants
            .max(self.current_max_active_participants)
            / 2
    }

    /// Re-encodes every header of the store in the schema of `fork_name`.
    pub fn upgrade_to(self, fork_name: ForkName) -> Result<Self, UpgradeError> {
        let target = fork_name
            .light_client_fork()
            .ok_or(UpgradeError::NoLightClientSchema(fork_name))?;
        if target == self.fork_name {
            return Ok(self);
        }
        if target < self.fork_name {
            return Err(UpgradeError::Downgrade {
                from: self.fork_name,
                to: target,
            });
        }
        Ok(Self {
            fork_name: target,
            finalized_header: self.finalized_header.upgrade_to(target)?,
            current_sync_committee: self.current_sync_committee,
            next_sync_committee: self.next_sync_committee,
            best_valid_update: self
                .best_valid_update
                .map(|update| update.upgrade_to(target))
                .transpose()?,
            optimistic_header: self.optimistic_header.upgrade_to(target)?,
            previous_max_active_participants: self.previous_max_active_participants,
            current_max_active_participants: self.current_max_active_participants,
        })
    }
}
