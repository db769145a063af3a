use std::sync::Arc;

use alloy_primitives::B256;
use beacon_types::{
    consensus::{
        fork::{compute_fork_digest, ForkDigest, ForkName, ForkVersion},
        light_client::{
            bootstrap::LightClientBootstrap, finality_update::LightClientFinalityUpdate,
            header::LightClientHeader, optimistic_update::LightClientOptimisticUpdate,
            store::LightClientStore, update::LightClientUpdate,
        },
        sync_committee::SyncCommittee,
    },
    utils::bytes::hex_encode_compact,
    ConsensusSpec,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::client_config::Config,
    consensus::{
        errors::{ConsensusError, ErrorKind},
        types::{is_sync_committee_update, GenericUpdate, SyncState, UpdateOutcome},
        utils::calc_sync_period,
        verify::{is_better_update, validate_bootstrap, validate_light_client_update},
    },
    wire::{ForkDigests, LightClientMessage},
};

/// A processor shared between tasks. Every mutation takes the lock for its whole duration.
pub type SharedLightClientProcessor<S> = Arc<Mutex<LightClientProcessor<S>>>;

/// Owns the light client store and feeds it with bootstraps and updates.
///
/// Every input is validated in full before the store is touched, so a rejected input leaves
/// the store exactly as it was.
#[derive(Debug)]
pub struct LightClientProcessor<S: ConsensusSpec> {
    config: Arc<Config>,
    fork_digests: ForkDigests,
    store: Option<LightClientStore<S>>,
    state: SyncState,
    latest_finality_update: Option<LightClientFinalityUpdate<S>>,
    latest_optimistic_update: Option<LightClientOptimisticUpdate<S>>,
}

impl<S: ConsensusSpec> LightClientProcessor<S> {
    pub fn new(config: Arc<Config>) -> Result<Self, ConsensusError> {
        if config.preset != S::PRESET_NAME {
            return Err(ConsensusError::PresetMismatch {
                configured: config.preset.clone(),
                expected: S::PRESET_NAME,
            });
        }
        let fork_digests = ForkDigests::new(&config.forks, config.chain.genesis_root);
        Ok(Self {
            config,
            fork_digests,
            store: None,
            state: SyncState::Uninitialised,
            latest_finality_update: None,
            latest_optimistic_update: None,
        })
    }

    pub fn into_shared(self) -> SharedLightClientProcessor<S> {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn store(&self) -> Option<&LightClientStore<S>> {
        self.store.as_ref()
    }

    pub fn finalized_header(&self) -> Option<&LightClientHeader> {
        self.store.as_ref().map(|store| &store.finalized_header)
    }

    pub fn optimistic_header(&self) -> Option<&LightClientHeader> {
        self.store.as_ref().map(|store| &store.optimistic_header)
    }

    pub fn latest_finality_update(&self) -> Option<&LightClientFinalityUpdate<S>> {
        self.latest_finality_update.as_ref()
    }

    pub fn latest_optimistic_update(&self) -> Option<&LightClientOptimisticUpdate<S>> {
        self.latest_optimistic_update.as_ref()
    }

    pub fn fork_digests(&self) -> &ForkDigests {
        &self.fork_digests
    }

    pub fn fork_name_at_slot(&self, slot: u64) -> ForkName {
        self.config.fork_name_at_slot::<S>(slot)
    }

    pub fn fork_version_at_slot(&self, slot: u64) -> ForkVersion {
        self.config.fork_version::<S>(slot).0
    }

    pub fn fork_digest_at_slot(&self, slot: u64) -> ForkDigest {
        compute_fork_digest(
            self.fork_version_at_slot(slot),
            self.config.chain.genesis_root,
        )
    }

    /// Verifies `bootstrap` against `trusted_block_root` and replaces the store with one built
    /// from it. Any previous store is discarded.
    pub fn initialise_from_bootstrap(
        &mut self,
        trusted_block_root: B256,
        bootstrap: LightClientBootstrap<S>,
    ) -> Result<(), ConsensusError> {
        if let Err(err) = validate_bootstrap(trusted_block_root, &bootstrap, &self.config.forks) {
            log_rejection("bootstrap", &err);
            return Err(err);
        }

        let store = LightClientStore::from_bootstrap(&bootstrap);
        info!(
            slot = store.finalized_slot(),
            fork = %store.fork_name,
            "Light client bootstrapped from {}",
            hex_encode_compact(trusted_block_root)
        );
        self.store = Some(store);
        self.state = SyncState::Bootstrapped;
        self.latest_finality_update = None;
        self.latest_optimistic_update = None;
        Ok(())
    }

    pub fn process_update(
        &mut self,
        update: LightClientUpdate<S>,
        current_slot: u64,
    ) -> Result<UpdateOutcome, ConsensusError> {
        self.process_light_client_update(update, current_slot)
            .inspect_err(|err| log_rejection("update", err))
    }

    pub fn process_finality_update(
        &mut self,
        finality_update: LightClientFinalityUpdate<S>,
        current_slot: u64,
    ) -> Result<UpdateOutcome, ConsensusError> {
        let outcome = self
            .process_light_client_update(finality_update.clone().into(), current_slot)
            .inspect_err(|err| log_rejection("finality update", err))?;

        let replace = match &self.latest_finality_update {
            None => true,
            Some(latest) => {
                let new_finalized_slot = finality_update.finalized_header().slot();
                let old_finalized_slot = latest.finalized_header().slot();
                new_finalized_slot > old_finalized_slot
                    || (new_finalized_slot == old_finalized_slot
                        && has_supermajority::<S>(finality_update.sync_aggregate().num_set_bits())
                        && !has_supermajority::<S>(latest.sync_aggregate().num_set_bits()))
            }
        };
        if replace {
            self.latest_finality_update = Some(finality_update);
        }
        Ok(outcome)
    }

    pub fn process_optimistic_update(
        &mut self,
        optimistic_update: LightClientOptimisticUpdate<S>,
        current_slot: u64,
    ) -> Result<UpdateOutcome, ConsensusError> {
        let outcome = self
            .process_light_client_update(optimistic_update.clone().into(), current_slot)
            .inspect_err(|err| log_rejection("optimistic update", err))?;

        let replace = self.latest_optimistic_update.as_ref().is_none_or(|latest| {
            optimistic_update.attested_header().slot() > latest.attested_header().slot()
        });
        if replace {
            self.latest_optimistic_update = Some(optimistic_update);
        }
        Ok(outcome)
    }

    /// Applies the best valid update once no finality has been seen for the update timeout.
    pub fn process_force_update(&mut self, current_slot: u64) -> Result<UpdateOutcome, ConsensusError> {
        let timeout = self.config.update_timeout::<S>();
        let store = self.store.as_mut().ok_or(ConsensusError::Uninitialised)?;
        let mut outcome = UpdateOutcome::default();

        if current_slot <= store.finalized_slot().saturating_add(timeout) {
            return Ok(outcome);
        }
        let Some(best_valid_update) = store.best_valid_update.take() else {
            return Ok(outcome);
        };

        // Without recent finality the attested header stands in for the finalized one.
        let finalized_header = if best_valid_update.finalized_slot() <= store.finalized_slot() {
            best_valid_update.attested_header()
        } else {
            best_valid_update.finalized_header()
        };
        let next_sync_committee = is_sync_committee_update(&best_valid_update)
            .then(|| best_valid_update.next_sync_committee());

        warn!(
            current_slot,
            finalized_slot = store.finalized_slot(),
            "No finality for {timeout} slots, forcing best valid update"
        );
        apply_light_client_update(
            store,
            Some(&finalized_header),
            next_sync_committee,
            &mut outcome,
        );
        self.state = SyncState::Tracking;
        Ok(outcome)
    }

    /// Routes a decoded network message. A bootstrap is only accepted while uninitialised;
    /// use [`Self::initialise_from_bootstrap`] to reset a running store.
    pub fn process_message(
        &mut self,
        message: LightClientMessage<S>,
        current_slot: u64,
    ) -> Result<UpdateOutcome, ConsensusError> {
        match message {
            LightClientMessage::Bootstrap(bootstrap) => {
                if self.state != SyncState::Uninitialised {
                    let err = ConsensusError::AlreadyBootstrapped;
                    log_rejection("bootstrap", &err);
                    return Err(err);
                }
                let trusted_block_root = self.config.trusted_block_root();
                self.initialise_from_bootstrap(trusted_block_root, bootstrap)?;
                Ok(UpdateOutcome::default())
            }
            LightClientMessage::Update(update) => self.process_update(update, current_slot),
            LightClientMessage::FinalityUpdate(update) => {
                self.process_finality_update(update, current_slot)
            }
            LightClientMessage::OptimisticUpdate(update) => {
                self.process_optimistic_update(update, current_slot)
            }
        }
    }

    fn process_light_client_update(
        &mut self,
        update: LightClientUpdate<S>,
        current_slot: u64,
    ) -> Result<UpdateOutcome, ConsensusError> {
        let config = &self.config;
        let outcome = with_store_at_fork(&mut self.store, update.fork_name(), |store| {
            let update = update.upgrade_to(store.fork_name)?;
            let generic = validate_light_client_update(store, &update, current_slot, config)?;
            Ok(apply_validated_update(store, update, &generic))
        })?;
        self.state = SyncState::Tracking;
        Ok(outcome)
    }
}

/// Runs `f` on the store, first upgrading it to `fork_name` if the store is older. The
/// upgraded store replaces the current one only if `f` succeeds.
fn with_store_at_fork<S, T, F>(
    store: &mut Option<LightClientStore<S>>,
    fork_name: ForkName,
    f: F,
) -> Result<T, ConsensusError>
where
    S: ConsensusSpec,
    F: FnOnce(&mut LightClientStore<S>) -> Result<T, ConsensusError>,
{
    let store = store.as_mut().ok_or(ConsensusError::Uninitialised)?;
    if fork_name <= store.fork_name {
        return f(store);
    }

    let mut upgraded = store.clone().upgrade_to(fork_name)?;
    let result = f(&mut upgraded)?;
    info!(from = %store.fork_name, to = %upgraded.fork_name, "Upgraded light client store");
    *store = upgraded;
    Ok(result)
}

fn has_supermajority<S: ConsensusSpec>(participants: usize) -> bool {
    participants * 3 >= S::sync_committee_size() * 2
}

/// State changes of `process_light_client_update` for an update that passed validation.
fn apply_validated_update<S: ConsensusSpec>(
    store: &mut LightClientStore<S>,
    update: LightClientUpdate<S>,
    generic: &GenericUpdate<S>,
) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();
    let participants = generic.participants();

    let is_better = store
        .best_valid_update
        .as_ref()
        .is_none_or(|best| is_better_update(&update, best));

    store.current_max_active_participants =
        store.current_max_active_participants.max(participants);

    if participants > store.safety_threshold()
        && generic.attested_slot() > store.optimistic_slot()
    {
        store.optimistic_header = generic.attested_header.clone();
        outcome.optimistic_header_advanced = true;
        info!(
            slot = store.optimistic_slot(),
            participants, "Light client updated head"
        );
    }

    let update_has_finalized_next_sync_committee = !store.is_next_sync_committee_known()
        && generic.is_sync_committee_update()
        && generic.is_finality_update()
        && calc_sync_period::<S>(generic.finalized_slot())
            == calc_sync_period::<S>(generic.attested_slot());

    if has_supermajority::<S>(participants as usize)
        && (generic.finalized_slot() > store.finalized_slot()
            || update_has_finalized_next_sync_committee)
    {
        apply_light_client_update(
            store,
            generic.finalized_header.as_ref(),
            generic.next_sync_committee.as_ref(),
            &mut outcome,
        );
        store.best_valid_update = None;
    } else if is_better {
        debug!(
            attested_slot = generic.attested_slot(),
            participants, "Retaining best valid update"
        );
        store.best_valid_update = Some(update);
        outcome.best_valid_update_replaced = true;
    }
    outcome
}

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md#apply_light_client_update
fn apply_light_client_update<S: ConsensusSpec>(
    store: &mut LightClientStore<S>,
    finalized_header: Option<&LightClientHeader>,
    next_sync_committee: Option<&SyncCommittee<S>>,
    outcome: &mut UpdateOutcome,
) {
    let store_period = store.finalized_period();
    let update_finalized_slot = finalized_header.map(|header| header.slot()).unwrap_or_default();
    let update_finalized_period = calc_sync_period::<S>(update_finalized_slot);

    if !store.is_next_sync_committee_known() {
        debug_assert_eq!(
            update_finalized_period, store_period,
            "next sync committee learned from another period"
        );
        store.next_sync_committee = next_sync_committee.cloned();
        outcome.next_sync_committee_learned = store.is_next_sync_committee_known();
    } else if update_finalized_period == store_period + 1 {
        if let Some(next) = store.next_sync_committee.take() {
            store.current_sync_committee = next;
        }
        store.next_sync_committee = next_sync_committee.cloned();
        store.previous_max_active_participants = store.current_max_active_participants;
        store.current_max_active_participants = 0;
        outcome.sync_committee_rotated = true;
        info!(period = update_finalized_period, "Sync committee updated");
    }

    if let Some(finalized_header) = finalized_header {
        if finalized_header.slot() > store.finalized_slot() {
            store.finalized_header = finalized_header.clone();
            outcome.finalized_header_advanced = true;
            info!(slot = store.finalized_slot(), "Light client finalized slot");

            if store.finalized_slot() > store.optimistic_slot() {
                store.optimistic_header = store.finalized_header.clone();
                outcome.optimistic_header_advanced = true;
            }
        }
    }
}

fn log_rejection(input: &str, err: &ConsensusError) {
    match err.kind() {
        ErrorKind::TrustViolation | ErrorKind::Malformed => {
            warn!(error = %err, kind = %err.kind(), "Rejected light client {input}")
        }
        ErrorKind::Stale | ErrorKind::Uninitialised => {
            debug!(error = %err, kind = %err.kind(), "Ignored light client {input}")
        }
    }
}
