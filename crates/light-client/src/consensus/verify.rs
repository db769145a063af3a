//! Checks of the Altair light client sync protocol, extended for Capella and Deneb headers.
//!
//! https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md

use alloy_primitives::B256;
use beacon_types::{
    consensus::{
        constants::{
            CURRENT_SYNC_COMMITTEE_GINDEX, DOMAIN_SYNC_COMMITTEE, EXECUTION_PAYLOAD_DEPTH,
            EXECUTION_PAYLOAD_GINDEX, FINALIZED_ROOT_DEPTH, FINALIZED_ROOT_GINDEX, GENESIS_SLOT,
            NEXT_SYNC_COMMITTEE_GINDEX, SYNC_COMMITTEE_DEPTH,
        },
        light_client::{
            bootstrap::LightClientBootstrap, header::LightClientHeader,
            store::LightClientStore, update::LightClientUpdate,
        },
    },
    merkle::{is_zero_branch, subtree_index, verify_merkle_branch},
    ConsensusSpec,
};
use milagro_bls::PublicKey;
use tree_hash::TreeHash;

use crate::{
    config::{client_config::Config, Forks},
    consensus::{
        errors::ConsensusError,
        types::{is_finality_update, is_sync_committee_update, GenericUpdate},
        utils::{
            calc_sync_period, compute_domain, compute_signing_root, get_participating_keys,
            is_aggregate_valid, is_proof_valid,
        },
    },
};

/// Checks that the header is encoded in a schema its slot allows, and that its execution
/// payload header, if any, is proven against the block body.
pub fn is_valid_light_client_header<S: ConsensusSpec>(
    header: &LightClientHeader,
    forks: &Forks,
) -> bool {
    let epoch = S::compute_epoch_at_slot(header.slot());
    if let Some(light_client_fork) = forks.fork_name_at_epoch(epoch).light_client_fork() {
        if header.fork_name() < light_client_fork {
            return false;
        }
    }
    let before_capella = epoch < forks.capella.epoch;
    let before_deneb = epoch < forks.deneb.epoch;

    match header {
        LightClientHeader::Altair(_) => true,
        LightClientHeader::Capella(header) => {
            if before_capella {
                return header.execution == Default::default()
                    && is_zero_branch(&header.execution_branch);
            }
            is_execution_proof_valid(
                header.execution.tree_hash_root(),
                &header.execution_branch,
                header.beacon.body_root,
            )
        }
        LightClientHeader::Deneb(header) => {
            if before_deneb
                && (header.execution.blob_gas_used != 0 || header.execution.excess_blob_gas != 0)
            {
                return false;
            }
            if before_capella {
                return header.execution == Default::default()
                    && is_zero_branch(&header.execution_branch);
            }
            let execution_root = if before_deneb {
                header.execution.to_capella().tree_hash_root()
            } else {
                header.execution.tree_hash_root()
            };
            is_execution_proof_valid(
                execution_root,
                &header.execution_branch,
                header.beacon.body_root,
            )
        }
    }
}

fn is_execution_proof_valid(execution_root: B256, branch: &[B256], body_root: B256) -> bool {
    verify_merkle_branch(
        execution_root,
        branch,
        EXECUTION_PAYLOAD_DEPTH,
        subtree_index(EXECUTION_PAYLOAD_GINDEX),
        body_root,
    )
}

/// Checks a bootstrap against the block root the client was configured to trust.
pub fn validate_bootstrap<S: ConsensusSpec>(
    trusted_block_root: B256,
    bootstrap: &LightClientBootstrap<S>,
    forks: &Forks,
) -> Result<(), ConsensusError> {
    let header = bootstrap.header();
    if !is_valid_light_client_header::<S>(&header, forks) {
        return Err(ConsensusError::InvalidHeader(header.slot()));
    }

    let header_root = header.beacon().tree_hash_root();
    if header_root != trusted_block_root {
        return Err(ConsensusError::InvalidHeaderHash(
            trusted_block_root.to_string(),
            header_root.to_string(),
        ));
    }

    let committee_valid = is_proof_valid(
        header.beacon().state_root,
        bootstrap.current_sync_committee(),
        bootstrap.current_sync_committee_branch(),
        SYNC_COMMITTEE_DEPTH,
        subtree_index(CURRENT_SYNC_COMMITTEE_GINDEX),
    );
    if !committee_valid {
        return Err(ConsensusError::InvalidCurrentSyncCommitteeProof);
    }
    Ok(())
}

/// Runs every check of `validate_light_client_update` without touching the store. The
/// update must already be encoded in the store's fork.
pub fn validate_light_client_update<S: ConsensusSpec>(
    store: &LightClientStore<S>,
    update: &LightClientUpdate<S>,
    current_slot: u64,
    config: &Config,
) -> Result<GenericUpdate<S>, ConsensusError> {
    let update = GenericUpdate::try_from(update)?;

    let required = config.sync.min_sync_committee_participants.max(1);
    let participants = update.participants();
    if participants < required {
        return Err(ConsensusError::InsufficientParticipation {
            participants,
            required,
        });
    }

    let attested_header = &update.attested_header;
    if !is_valid_light_client_header::<S>(attested_header, &config.forks) {
        return Err(ConsensusError::InvalidHeader(attested_header.slot()));
    }

    let signature_slot = update.signature_slot;
    let attested_slot = update.attested_slot();
    let finalized_slot = update.finalized_slot();
    if signature_slot > current_slot {
        return Err(ConsensusError::FutureSignatureSlot {
            signature_slot,
            current_slot,
        });
    }
    if !(signature_slot > attested_slot && attested_slot >= finalized_slot) {
        return Err(ConsensusError::InvalidSlotOrder {
            signature_slot,
            attested_slot,
            finalized_slot,
        });
    }

    let store_period = store.finalized_period();
    let signature_period = calc_sync_period::<S>(signature_slot);
    let valid_period = if store.is_next_sync_committee_known() {
        signature_period == store_period || signature_period == store_period + 1
    } else {
        signature_period == store_period
    };
    if !valid_period {
        return Err(ConsensusError::InvalidPeriod {
            signature_period,
            store_period,
        });
    }

    let attested_period = calc_sync_period::<S>(attested_slot);
    let supplies_next_sync_committee = !store.is_next_sync_committee_known()
        && update.is_sync_committee_update()
        && attested_period == store_period;
    if attested_slot <= store.finalized_slot() && !supplies_next_sync_committee {
        return Err(ConsensusError::NotRelevant);
    }

    if let (Some(finalized_header), Some(finality_branch)) =
        (&update.finalized_header, &update.finality_branch)
    {
        let finalized_root = if finalized_header.slot() == GENESIS_SLOT {
            if !finalized_header.is_empty() {
                return Err(ConsensusError::InvalidHeader(GENESIS_SLOT));
            }
            B256::ZERO
        } else {
            if !is_valid_light_client_header::<S>(finalized_header, &config.forks) {
                return Err(ConsensusError::InvalidHeader(finalized_header.slot()));
            }
            finalized_header.beacon().tree_hash_root()
        };
        let finality_valid = verify_merkle_branch(
            finalized_root,
            finality_branch,
            FINALIZED_ROOT_DEPTH,
            subtree_index(FINALIZED_ROOT_GINDEX),
            attested_header.beacon().state_root,
        );
        if !finality_valid {
            return Err(ConsensusError::InvalidFinalityProof);
        }
    }

    if let (Some(next_sync_committee), Some(next_sync_committee_branch)) =
        (&update.next_sync_committee, &update.next_sync_committee_branch)
    {
        if attested_period == store_period {
            if let Some(known) = &store.next_sync_committee {
                if known != next_sync_committee {
                    return Err(ConsensusError::NextSyncCommitteeMismatch);
                }
            }
        }
        let committee_valid = is_proof_valid(
            attested_header.beacon().state_root,
            next_sync_committee,
            next_sync_committee_branch,
            SYNC_COMMITTEE_DEPTH,
            subtree_index(NEXT_SYNC_COMMITTEE_GINDEX),
        );
        if !committee_valid {
            return Err(ConsensusError::InvalidNextSyncCommitteeProof);
        }
    }

    let sync_committee = if signature_period == store_period {
        &store.current_sync_committee
    } else {
        store
            .next_sync_committee
            .as_ref()
            .ok_or(ConsensusError::InvalidPeriod {
                signature_period,
                store_period,
            })?
    };
    let public_keys = get_participating_keys(sync_committee, &update.sync_aggregate)?;
    let public_keys: Vec<&PublicKey> = public_keys.iter().collect();

    let fork_version = config.fork_version::<S>(signature_slot.max(1) - 1);
    let domain = compute_domain(
        DOMAIN_SYNC_COMMITTEE,
        fork_version.0,
        config.chain.genesis_root,
    );
    let signing_root = compute_signing_root(attested_header.beacon().tree_hash_root(), domain);
    if !is_aggregate_valid(
        &update.sync_aggregate.sync_committee_signature,
        signing_root.as_slice(),
        &public_keys,
    ) {
        return Err(ConsensusError::InvalidSignature);
    }

    Ok(update)
}

/// Returns `true` if `new_update` should replace `old_update` as the best valid update.
pub fn is_better_update<S: ConsensusSpec>(
    new_update: &LightClientUpdate<S>,
    old_update: &LightClientUpdate<S>,
) -> bool {
    let max_active_participants = S::sync_committee_size() as u64;
    let new_participants = new_update.sync_aggregate().num_set_bits() as u64;
    let old_participants = old_update.sync_aggregate().num_set_bits() as u64;
    let new_has_supermajority = new_participants * 3 >= max_active_participants * 2;
    let old_has_supermajority = old_participants * 3 >= max_active_participants * 2;

    if new_has_supermajority != old_has_supermajority {
        return new_has_supermajority;
    }
    if !new_has_supermajority && new_participants != old_participants {
        return new_participants > old_participants;
    }

    let new_has_relevant_sync_committee = has_relevant_sync_committee(new_update);
    let old_has_relevant_sync_committee = has_relevant_sync_committee(old_update);
    if new_has_relevant_sync_committee != old_has_relevant_sync_committee {
        return new_has_relevant_sync_committee;
    }

    let new_has_finality = is_finality_update(new_update);
    let old_has_finality = is_finality_update(old_update);
    if new_has_finality != old_has_finality {
        return new_has_finality;
    }

    if new_has_finality {
        let new_has_sync_committee_finality = has_sync_committee_finality(new_update);
        let old_has_sync_committee_finality = has_sync_committee_finality(old_update);
        if new_has_sync_committee_finality != old_has_sync_committee_finality {
            return new_has_sync_committee_finality;
        }
    }

    if new_participants != old_participants {
        return new_participants > old_participants;
    }

    if new_update.attested_slot() != old_update.attested_slot() {
        return new_update.attested_slot() < old_update.attested_slot();
    }
    new_update.signature_slot() < old_update.signature_slot()
}

fn has_relevant_sync_committee<S: ConsensusSpec>(update: &LightClientUpdate<S>) -> bool {
    is_sync_committee_update(update)
        && calc_sync_period::<S>(update.attested_slot())
            == calc_sync_period::<S>(update.signature_slot())
}

fn has_sync_committee_finality<S: ConsensusSpec>(update: &LightClientUpdate<S>) -> bool {
    calc_sync_period::<S>(update.finalized_slot()) == calc_sync_period::<S>(update.attested_slot())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use beacon_types::{
        consensus::{
            execution_payload::{ExecutionPayloadHeaderCapella, ExecutionPayloadHeaderDeneb},
            fork::ForkName,
            header::BeaconBlockHeader,
            light_client::{
                header::{LightClientHeaderAltair, LightClientHeaderCapella, LightClientHeaderDeneb},
                update::LightClientUpdateAltair,
            },
        },
        merkle::{try_into_branch, zero_branch},
        test_utils::SparseMerkleTree,
        MainnetConsensusSpec, MinimalConsensusSpec,
    };
    use rstest::rstest;
    use ssz_types::FixedVector;

    use super::*;
    use crate::config::networks;

    fn capella_header(slot: u64) -> LightClientHeaderCapella {
        let execution = ExecutionPayloadHeaderCapella {
            block_number: 17_034_870,
            ..Default::default()
        };
        let tree = SparseMerkleTree::with_leaves(&[(
            EXECUTION_PAYLOAD_GINDEX,
            execution.tree_hash_root(),
        )]);
        LightClientHeaderCapella {
            beacon: BeaconBlockHeader {
                slot,
                body_root: tree.root(),
                ..Default::default()
            },
            execution,
            execution_branch: try_into_branch(tree.branch(EXECUTION_PAYLOAD_GINDEX)).unwrap(),
        }
    }

    const CAPELLA_SLOT: u64 = 194_048 * 32;
    const DENEB_SLOT: u64 = 269_568 * 32;

    #[test]
    fn proven_capella_header_is_valid() {
        let forks = networks::mainnet().forks;
        let header = LightClientHeader::Capella(capella_header(CAPELLA_SLOT + 5));
        assert!(is_valid_light_client_header::<MainnetConsensusSpec>(&header, &forks));
    }

    #[test]
    fn tampered_execution_is_invalid() {
        let forks = networks::mainnet().forks;
        let mut header = capella_header(CAPELLA_SLOT + 5);
        header.execution.block_number += 1;
        assert!(!is_valid_light_client_header::<MainnetConsensusSpec>(
            &LightClientHeader::Capella(header),
            &forks
        ));
    }

    #[rstest]
    #[case::altair_before_capella(LightClientHeader::Altair(LightClientHeaderAltair::default()), CAPELLA_SLOT - 1, true)]
    #[case::altair_after_capella(LightClientHeader::Altair(LightClientHeaderAltair::default()), CAPELLA_SLOT, false)]
    #[case::empty_capella_before_capella(LightClientHeader::Capella(LightClientHeaderCapella::default()), CAPELLA_SLOT - 1, true)]
    #[case::unproven_capella_after_capella(LightClientHeader::Capella(LightClientHeaderCapella::default()), CAPELLA_SLOT, false)]
    #[case::capella_after_deneb(LightClientHeader::Capella(LightClientHeaderCapella::default()), DENEB_SLOT, false)]
    #[case::empty_deneb_before_capella(LightClientHeader::Deneb(LightClientHeaderDeneb::default()), 100, true)]
    fn header_schema_follows_fork_schedule(
        #[case] mut header: LightClientHeader,
        #[case] slot: u64,
        #[case] expected: bool,
    ) {
        let forks = networks::mainnet().forks;
        match &mut header {
            LightClientHeader::Altair(inner) => inner.beacon.slot = slot,
            LightClientHeader::Capella(inner) => inner.beacon.slot = slot,
            LightClientHeader::Deneb(inner) => inner.beacon.slot = slot,
        }
        assert_eq!(
            is_valid_light_client_header::<MainnetConsensusSpec>(&header, &forks),
            expected
        );
    }

    #[test]
    fn blob_gas_before_deneb_is_invalid() {
        let forks = networks::mainnet().forks;
        let header = LightClientHeader::Deneb(LightClientHeaderDeneb {
            beacon: BeaconBlockHeader {
                slot: CAPELLA_SLOT + 1,
                ..Default::default()
            },
            execution: ExecutionPayloadHeaderDeneb {
                excess_blob_gas: 1,
                ..Default::default()
            },
            execution_branch: zero_branch(),
        });
        assert!(!is_valid_light_client_header::<MainnetConsensusSpec>(&header, &forks));
    }

    #[test]
    fn deneb_schema_before_deneb_is_hashed_as_capella() {
        let forks = networks::mainnet().forks;
        let capella = capella_header(DENEB_SLOT - 1);
        let header = LightClientHeader::Capella(capella)
            .upgrade_to(ForkName::Deneb)
            .unwrap();
        assert!(is_valid_light_client_header::<MainnetConsensusSpec>(&header, &forks));
    }

    fn update_with_bits(
        participants: usize,
        attested_slot: u64,
        signature_slot: u64,
    ) -> LightClientUpdate<MinimalConsensusSpec> {
        let mut update = LightClientUpdateAltair::<MinimalConsensusSpec> {
            attested_header: LightClientHeaderAltair {
                beacon: BeaconBlockHeader {
                    slot: attested_slot,
                    ..Default::default()
                },
            },
            signature_slot,
            ..Default::default()
        };
        for i in 0..participants {
            update.sync_aggregate.sync_committee_bits.set(i, true).unwrap();
        }
        LightClientUpdate::Altair(update)
    }

    fn with_finality(
        update: LightClientUpdate<MinimalConsensusSpec>,
        finalized_slot: u64,
    ) -> LightClientUpdate<MinimalConsensusSpec> {
        let LightClientUpdate::Altair(mut update) = update else {
            panic!("expected an altair update");
        };
        update.finalized_header.beacon.slot = finalized_slot;
        update.finality_branch = FixedVector::from(vec![B256::repeat_byte(1); 6]);
        LightClientUpdate::Altair(update)
    }

    #[test]
    fn supermajority_wins() {
        let weak = with_finality(update_with_bits(21, 100, 101), 90);
        let strong = update_with_bits(22, 100, 101);
        assert!(is_better_update(&strong, &weak));
        assert!(!is_better_update(&weak, &strong));
    }

    #[test]
    fn participation_decides_below_supermajority() {
        let low = with_finality(update_with_bits(10, 100, 101), 90);
        let high = update_with_bits(11, 100, 101);
        assert!(is_better_update(&high, &low));
    }

    #[test]
    fn finality_beats_participation_above_supermajority() {
        let finalized = with_finality(update_with_bits(22, 100, 101), 90);
        let full = update_with_bits(32, 100, 101);
        assert!(is_better_update(&finalized, &full));
    }

    #[test]
    fn sync_committee_finality_is_preferred() {
        // minimal preset: 64 slots per period
        let same_period = with_finality(update_with_bits(22, 100, 101), 70);
        let previous_period = with_finality(update_with_bits(22, 100, 101), 60);
        assert!(is_better_update(&same_period, &previous_period));
    }

    #[test]
    fn older_updates_break_ties() {
        let older = update_with_bits(32, 99, 102);
        let newer = update_with_bits(32, 100, 101);
        assert!(is_better_update(&older, &newer));

        let early_signature = update_with_bits(32, 100, 101);
        let late_signature = update_with_bits(32, 100, 102);
        assert!(is_better_update(&early_signature, &late_signature));
        assert!(!is_better_update(&early_signature, &early_signature.clone()));
    }
}
