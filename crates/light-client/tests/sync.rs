use std::sync::Arc;

use alloy_primitives::B256;
use beacon_types::{
    consensus::fork::ForkName,
    light_client::update::LightClientUpdate,
    MainnetConsensusSpec, MinimalConsensusSpec,
};
use light_client::{
    config::{client_config::Config, networks},
    consensus::{rpc::mock_rpc::MockRpc, ConsensusLightClient},
    test_utils::{TestChain, UpdateParams},
    utils::unix_time,
    watch::light_client_watch_channels,
    wire::{LightClientMessage, MessageKind, ProtocolError},
    ConsensusError, ErrorKind, LightClientProcessor, SyncState, UpdateOutcome,
};
use rstest::rstest;
use tree_hash::TreeHash;

type Spec = MinimalConsensusSpec;

/// Slot far enough ahead that no generated signature slot is in the future.
const CURRENT_SLOT: u64 = 200;

fn minimal_chain() -> TestChain<Spec> {
    TestChain::new(Config::from(networks::minimal()), 4)
}

fn bootstrapped(chain: &TestChain<Spec>, slot: u64) -> LightClientProcessor<Spec> {
    let (root, bootstrap) = chain.bootstrap(slot);
    let mut processor = LightClientProcessor::new(chain.config.clone()).unwrap();
    processor.initialise_from_bootstrap(root, bootstrap).unwrap();
    processor
}

/// Bootstrapped at slot 8 and finalized at slot 16 with the period 1 committee known.
fn tracking(chain: &TestChain<Spec>) -> LightClientProcessor<Spec> {
    let mut processor = bootstrapped(chain, 8);
    let update = chain.update(
        UpdateParams::new(20, 21)
            .finalized(16)
            .with_next_sync_committee(),
    );
    processor.process_update(update, CURRENT_SLOT).unwrap();
    processor
}

#[test_log::test]
fn bootstrap_must_match_trusted_root() {
    let chain = minimal_chain();
    let (root, bootstrap) = chain.bootstrap(8);
    let mut processor = LightClientProcessor::<Spec>::new(chain.config.clone()).unwrap();

    let err = processor
        .initialise_from_bootstrap(B256::repeat_byte(1), bootstrap.clone())
        .unwrap_err();
    assert!(matches!(err, ConsensusError::InvalidHeaderHash(..)));
    assert!(err.is_trust_violation());
    assert_eq!(processor.state(), SyncState::Uninitialised);
    assert!(processor.store().is_none());

    let mut wrong_committee = bootstrap.clone();
    *wrong_committee.current_sync_committee_mut() = chain.committee(1).clone();
    assert_eq!(
        processor
            .initialise_from_bootstrap(root, wrong_committee)
            .unwrap_err(),
        ConsensusError::InvalidCurrentSyncCommitteeProof
    );

    let mut bad_branch = bootstrap.clone();
    bad_branch.current_sync_committee_branch_mut()[2] = B256::repeat_byte(0xaa);
    assert_eq!(
        processor
            .initialise_from_bootstrap(root, bad_branch)
            .unwrap_err(),
        ConsensusError::InvalidCurrentSyncCommitteeProof
    );
    assert_eq!(processor.state(), SyncState::Uninitialised);

    processor.initialise_from_bootstrap(root, bootstrap).unwrap();
    let store = processor.store().unwrap();
    assert_eq!(processor.state(), SyncState::Bootstrapped);
    assert_eq!(store.finalized_slot(), 8);
    assert_eq!(store.optimistic_slot(), 8);
    assert_eq!(&store.current_sync_committee, chain.committee(0));
    assert!(!store.is_next_sync_committee_known());
}

#[test_log::test]
fn finality_advances_and_committee_rotates() {
    let chain = minimal_chain();
    let mut processor = bootstrapped(&chain, 8);

    let outcome = processor
        .process_update(
            chain.update(
                UpdateParams::new(20, 21)
                    .finalized(16)
                    .with_next_sync_committee(),
            ),
            CURRENT_SLOT,
        )
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome {
            optimistic_header_advanced: true,
            finalized_header_advanced: true,
            next_sync_committee_learned: true,
            ..Default::default()
        }
    );
    let store = processor.store().unwrap();
    assert_eq!(processor.state(), SyncState::Tracking);
    assert_eq!(store.finalized_slot(), 16);
    assert_eq!(store.optimistic_slot(), 20);
    assert_eq!(store.next_sync_committee.as_ref(), Some(chain.committee(1)));
    assert_eq!(store.current_max_active_participants, 32);

    // Signed by the period 1 committee, which the store now knows.
    let outcome = processor
        .process_update(
            chain.update(
                UpdateParams::new(70, 71)
                    .finalized(66)
                    .with_next_sync_committee(),
            ),
            CURRENT_SLOT,
        )
        .unwrap();
    assert!(outcome.sync_committee_rotated);
    assert!(outcome.finalized_header_advanced);
    let store = processor.store().unwrap();
    assert_eq!(store.finalized_slot(), 66);
    assert_eq!(store.finalized_period(), 1);
    assert_eq!(&store.current_sync_committee, chain.committee(1));
    assert_eq!(store.next_sync_committee.as_ref(), Some(chain.committee(2)));
    assert_eq!(store.previous_max_active_participants, 32);
    assert_eq!(store.current_max_active_participants, 0);
    assert!(store.best_valid_update.is_none());
}

#[test_log::test]
fn committee_rotates_without_finality_after_timeout() {
    let chain = minimal_chain();
    let mut processor = bootstrapped(&chain, 8);

    // A supermajority proving the next committee, but without finality, is only retained.
    let outcome = processor
        .process_update(
            chain.update(UpdateParams::new(20, 21).with_next_sync_committee()),
            CURRENT_SLOT,
        )
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome {
            optimistic_header_advanced: true,
            best_valid_update_replaced: true,
            ..Default::default()
        }
    );
    assert!(!processor.store().unwrap().is_next_sync_committee_known());

    let next_period_update = chain.update(UpdateParams::new(70, 71).with_next_sync_committee());
    assert_eq!(
        processor
            .process_update(next_period_update.clone(), CURRENT_SLOT)
            .unwrap_err(),
        ConsensusError::InvalidPeriod {
            signature_period: 1,
            store_period: 0,
        }
    );

    let outcome = processor.process_force_update(8 + 65).unwrap();
    assert!(outcome.next_sync_committee_learned);
    assert!(!outcome.sync_committee_rotated);
    let store = processor.store().unwrap();
    assert_eq!(store.finalized_slot(), 20);
    assert_eq!(store.next_sync_committee.as_ref(), Some(chain.committee(1)));

    // Now signed by a known committee, but a supermajority alone does not apply it.
    let outcome = processor
        .process_update(next_period_update, CURRENT_SLOT)
        .unwrap();
    assert!(outcome.optimistic_header_advanced);
    assert!(outcome.best_valid_update_replaced);
    assert!(!outcome.sync_committee_rotated);
    assert!(!outcome.finalized_header_advanced);
    let store = processor.store().unwrap();
    assert_eq!(&store.current_sync_committee, chain.committee(0));
    assert_eq!(store.finalized_slot(), 20);
    assert_eq!(store.optimistic_slot(), 70);

    let outcome = processor.process_force_update(20 + 65).unwrap();
    assert!(outcome.sync_committee_rotated);
    let store = processor.store().unwrap();
    assert_eq!(store.finalized_slot(), 70);
    assert_eq!(&store.current_sync_committee, chain.committee(1));
    assert_eq!(store.next_sync_committee.as_ref(), Some(chain.committee(2)));
}

#[rstest]
#[case::full_participation([32, 32, 32, 32])]
#[case::below_supermajority([20, 17, 21, 18])]
fn same_period_updates_are_accepted_in_order(#[case] participants: [usize; 4]) {
    let chain = minimal_chain();
    let mut processor = tracking(&chain);

    let mut optimistic_slot = processor.optimistic_header().unwrap().slot();
    for (attested_slot, participants) in [24, 30, 41, 55].into_iter().zip(participants) {
        let update = chain.update(
            UpdateParams::new(attested_slot, attested_slot + 1).participants(participants),
        );
        let outcome = processor.process_update(update, CURRENT_SLOT).unwrap();
        assert!(outcome.optimistic_header_advanced);
        assert!(!outcome.finalized_header_advanced);

        let slot = processor.optimistic_header().unwrap().slot();
        assert!(slot >= optimistic_slot);
        assert_eq!(slot, attested_slot);
        optimistic_slot = slot;
    }
    assert_eq!(processor.store().unwrap().finalized_slot(), 16);
}

#[test_log::test]
fn finalized_slot_never_decreases() {
    let chain = minimal_chain();
    let mut processor = tracking(&chain);

    processor
        .process_update(
            chain.update(UpdateParams::new(40, 41).finalized(32)),
            CURRENT_SLOT,
        )
        .unwrap();
    assert_eq!(processor.store().unwrap().finalized_slot(), 32);

    // Valid, attests above the finalized slot, but finalizes an older block.
    let outcome = processor
        .process_update(
            chain.update(UpdateParams::new(44, 45).finalized(24)),
            CURRENT_SLOT,
        )
        .unwrap();
    assert!(!outcome.finalized_header_advanced);
    assert!(outcome.optimistic_header_advanced);
    let store = processor.store().unwrap();
    assert_eq!(store.finalized_slot(), 32);
    assert_eq!(store.optimistic_slot(), 44);
    assert!(store.best_valid_update.is_some());
}

type UpdateBuilder = fn(&TestChain<Spec>) -> LightClientUpdate<Spec>;

fn bad_finality_branch(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    let mut update = chain.update(UpdateParams::new(40, 41).finalized(32));
    update.finality_branch_mut()[0] = B256::repeat_byte(0xee);
    update
}

fn tampered_attested_header(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    let mut update = chain.update(UpdateParams::new(40, 41).finalized(32));
    update.attested_header_altair_mut().unwrap().beacon.proposer_index += 1;
    update
}

fn conflicting_next_committee(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    let mut update = chain.update(UpdateParams::new(40, 41).with_next_sync_committee());
    *update.next_sync_committee_mut() = chain.committee(2).clone();
    update
}

fn no_participants(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    chain.update(UpdateParams::new(40, 41).finalized(32).participants(0))
}

fn future_signature(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    chain.update(UpdateParams::new(100, CURRENT_SLOT + 1))
}

fn signature_before_attestation(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    chain.update(UpdateParams::new(40, 40))
}

fn already_finalized(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    chain.update(UpdateParams::new(12, 13).finalized(9))
}

fn signature_two_periods_ahead(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    chain.update(UpdateParams::new(130, 131))
}

fn finalized_header_without_proof(chain: &TestChain<Spec>) -> LightClientUpdate<Spec> {
    let mut update = chain.update(UpdateParams::new(40, 41));
    update.finalized_header_altair_mut().unwrap().beacon.slot = 32;
    update
}

#[rstest]
#[case::bad_finality_branch(bad_finality_branch, ErrorKind::TrustViolation)]
#[case::tampered_attested_header(tampered_attested_header, ErrorKind::TrustViolation)]
#[case::conflicting_next_committee(conflicting_next_committee, ErrorKind::TrustViolation)]
#[case::no_participants(no_participants, ErrorKind::TrustViolation)]
#[case::future_signature(future_signature, ErrorKind::Stale)]
#[case::signature_before_attestation(signature_before_attestation, ErrorKind::Stale)]
#[case::already_finalized(already_finalized, ErrorKind::Stale)]
#[case::signature_two_periods_ahead(signature_two_periods_ahead, ErrorKind::Stale)]
#[case::finalized_header_without_proof(finalized_header_without_proof, ErrorKind::Malformed)]
fn rejected_update_leaves_store_untouched(
    #[case] build: UpdateBuilder,
    #[case] expected_kind: ErrorKind,
) {
    let chain = minimal_chain();
    let mut processor = tracking(&chain);
    let before = processor.store().unwrap().clone();

    let err = processor
        .process_update(build(&chain), CURRENT_SLOT)
        .unwrap_err();
    assert_eq!(err.kind(), expected_kind, "unexpected error {err}");
    assert_eq!(processor.store().unwrap(), &before);
    assert_eq!(processor.state(), SyncState::Tracking);
}

#[test]
fn rejections_name_the_failed_check() {
    let chain = minimal_chain();
    let mut processor = tracking(&chain);

    let mut check = |update, expected| {
        assert_eq!(
            processor.process_update(update, CURRENT_SLOT).unwrap_err(),
            expected
        );
    };
    check(
        bad_finality_branch(&chain),
        ConsensusError::InvalidFinalityProof,
    );
    check(
        tampered_attested_header(&chain),
        ConsensusError::InvalidSignature,
    );
    check(
        conflicting_next_committee(&chain),
        ConsensusError::NextSyncCommitteeMismatch,
    );
    check(
        no_participants(&chain),
        ConsensusError::InsufficientParticipation {
            participants: 0,
            required: 1,
        },
    );
    check(already_finalized(&chain), ConsensusError::NotRelevant);
    check(
        signature_two_periods_ahead(&chain),
        ConsensusError::InvalidPeriod {
            signature_period: 2,
            store_period: 0,
        },
    );
    check(
        finalized_header_without_proof(&chain),
        ConsensusError::UnexpectedFinalizedHeader,
    );
}

#[test_log::test]
fn force_update_after_timeout() {
    let chain = minimal_chain();
    let mut processor = bootstrapped(&chain, 8);

    // Ten of 32 is short of a supermajority, so the update is only retained.
    let outcome = processor
        .process_update(
            chain.update(
                UpdateParams::new(30, 31)
                    .finalized(24)
                    .with_next_sync_committee()
                    .participants(10),
            ),
            CURRENT_SLOT,
        )
        .unwrap();
    assert!(outcome.best_valid_update_replaced);
    assert!(outcome.optimistic_header_advanced);
    assert!(!outcome.finalized_header_advanced);
    assert_eq!(processor.store().unwrap().finalized_slot(), 8);
    assert_eq!(processor.store().unwrap().optimistic_slot(), 30);

    // One sync committee period after the finalized slot is not yet past the timeout.
    let outcome = processor.process_force_update(8 + 64).unwrap();
    assert!(outcome.is_noop());
    assert!(processor.store().unwrap().best_valid_update.is_some());

    let outcome = processor.process_force_update(8 + 65).unwrap();
    assert!(outcome.finalized_header_advanced);
    assert!(outcome.next_sync_committee_learned);
    let store = processor.store().unwrap();
    assert_eq!(store.finalized_slot(), 24);
    assert_eq!(store.optimistic_slot(), 30);
    assert_eq!(store.next_sync_committee.as_ref(), Some(chain.committee(1)));
    assert!(store.best_valid_update.is_none());

    assert!(processor.process_force_update(1_000).unwrap().is_noop());
}

#[test_log::test]
fn store_follows_update_forks() {
    let mut config = Config::from(networks::minimal());
    config.forks.capella.epoch = 2;
    config.forks.deneb.epoch = 4;
    let chain = TestChain::<Spec>::new(config, 2);
    let mut processor = bootstrapped(&chain, 8);
    assert_eq!(processor.store().unwrap().fork_name, ForkName::Altair);

    // A Deneb update that fails validation leaves the Altair store in place.
    let mut bad_update = chain.update(UpdateParams::new(40, 41).finalized(32));
    assert_eq!(bad_update.fork_name(), ForkName::Deneb);
    bad_update.finality_branch_mut()[1] = B256::repeat_byte(0x11);
    assert_eq!(
        processor
            .process_update(bad_update, CURRENT_SLOT)
            .unwrap_err(),
        ConsensusError::InvalidFinalityProof
    );
    assert_eq!(processor.store().unwrap().fork_name, ForkName::Altair);

    let capella_update = chain.update(UpdateParams::new(20, 21).finalized(16));
    assert_eq!(capella_update.fork_name(), ForkName::Capella);
    processor
        .process_update(capella_update, CURRENT_SLOT)
        .unwrap();
    let store = processor.store().unwrap();
    assert_eq!(store.fork_name, ForkName::Capella);
    assert_eq!(store.finalized_header.fork_name(), ForkName::Capella);
    assert_eq!(store.finalized_slot(), 16);
    assert!(store.finalized_header.execution().is_some());

    processor
        .process_update(
            chain.update(UpdateParams::new(40, 41).finalized(32)),
            CURRENT_SLOT,
        )
        .unwrap();
    let store = processor.store().unwrap();
    assert_eq!(store.fork_name, ForkName::Deneb);
    assert_eq!(store.finalized_slot(), 32);
    assert_eq!(
        store
            .finalized_header
            .execution_deneb()
            .unwrap()
            .blob_gas_used,
        131_072
    );
}

#[test_log::test]
fn older_schema_update_is_upgraded() {
    let mut config = Config::from(networks::minimal());
    config.forks.capella.epoch = 3;
    let chain = TestChain::<Spec>::new(config, 2);
    let mut processor = bootstrapped(&chain, 8);

    processor
        .process_update(
            chain.update(UpdateParams::new(26, 27).finalized(16)),
            CURRENT_SLOT,
        )
        .unwrap();
    assert_eq!(processor.store().unwrap().fork_name, ForkName::Capella);

    // Attested before Capella, so encoded in the Altair schema.
    let update = chain.update(UpdateParams::new(20, 21).finalized(18));
    assert_eq!(update.fork_name(), ForkName::Altair);
    let outcome = processor.process_update(update, CURRENT_SLOT).unwrap();
    assert!(outcome.finalized_header_advanced);
    let store = processor.store().unwrap();
    assert_eq!(store.fork_name, ForkName::Capella);
    assert_eq!(store.finalized_header.fork_name(), ForkName::Capella);
    assert_eq!(store.finalized_slot(), 18);
    assert_eq!(store.optimistic_slot(), 26);
}

#[test_log::test]
fn mainnet_sized_committee() {
    let mut config = Config::from(networks::mainnet());
    config.forks.altair.epoch = 0;
    config.forks.bellatrix.epoch = 0;
    config.forks.capella.epoch = networks::FAR_FUTURE_EPOCH;
    config.forks.deneb.epoch = networks::FAR_FUTURE_EPOCH;
    let chain = TestChain::<MainnetConsensusSpec>::new(config, 2);
    assert_eq!(chain.committee(0).pubkeys.len(), 512);

    let (root, bootstrap) = chain.bootstrap(64);
    let mut processor = LightClientProcessor::new(chain.config.clone()).unwrap();

    let mut flipped = bootstrap.clone();
    flipped.current_sync_committee_branch_mut()[4].0[31] ^= 1;
    let err = processor
        .initialise_from_bootstrap(root, flipped)
        .unwrap_err();
    assert_eq!(err, ConsensusError::InvalidCurrentSyncCommitteeProof);
    assert_eq!(err.kind(), ErrorKind::TrustViolation);
    assert!(processor.store().is_none());

    processor.initialise_from_bootstrap(root, bootstrap).unwrap();
    let store = processor.store().unwrap();
    assert_eq!(store.current_sync_committee.pubkeys.len(), 512);
    assert_eq!(&store.current_sync_committee, chain.committee(0));

    let update = chain.update(
        UpdateParams::new(200, 201)
            .finalized(160)
            .with_next_sync_committee(),
    );
    let mut flipped = update.clone();
    flipped.next_sync_committee_branch_mut()[4].0[31] ^= 1;
    let err = processor.process_update(flipped, 1_000).unwrap_err();
    assert_eq!(err, ConsensusError::InvalidNextSyncCommitteeProof);
    assert_eq!(err.kind(), ErrorKind::TrustViolation);
    assert_eq!(processor.store().unwrap().finalized_slot(), 64);

    let outcome = processor.process_update(update, 1_000).unwrap();
    assert!(outcome.finalized_header_advanced);
    assert!(outcome.next_sync_committee_learned);
    let store = processor.store().unwrap();
    assert_eq!(store.finalized_slot(), 160);
    assert_eq!(store.current_max_active_participants, 512);
}

#[test_log::test]
fn network_messages_are_routed() {
    let chain = minimal_chain();
    let (root, bootstrap) = chain.bootstrap(8);
    let config = Arc::new(Config {
        checkpoint: Some(root),
        ..(*chain.config).clone()
    });
    let mut processor = LightClientProcessor::<Spec>::new(config).unwrap();
    let fork_digests = processor.fork_digests().clone();

    let message = LightClientMessage::Bootstrap(bootstrap);
    // Bellatrix is active from genesis and shares the Altair schema.
    let (context, payload) = message.encode(ForkName::Bellatrix, &fork_digests).unwrap();
    assert_eq!(context, processor.fork_digest_at_slot(8));
    let decoded =
        LightClientMessage::<Spec>::decode(MessageKind::Bootstrap, &context, &payload, &fork_digests)
            .unwrap();
    assert_eq!(decoded, message);
    processor.process_message(decoded, CURRENT_SLOT).unwrap();
    assert_eq!(processor.state(), SyncState::Bootstrapped);

    assert_eq!(
        processor
            .process_message(message, CURRENT_SLOT)
            .unwrap_err(),
        ConsensusError::AlreadyBootstrapped
    );

    let finality_update = chain.finality_update(UpdateParams::new(20, 21).finalized(16));
    let message = LightClientMessage::FinalityUpdate(finality_update.clone());
    let (context, payload) = message.encode(ForkName::Bellatrix, &fork_digests).unwrap();

    assert_eq!(
        LightClientMessage::<Spec>::decode(
            MessageKind::FinalityUpdate,
            &context[..3],
            &payload,
            &fork_digests
        )
        .unwrap_err(),
        ProtocolError::InvalidContextBytes(3)
    );
    assert_eq!(
        LightClientMessage::<Spec>::decode(
            MessageKind::FinalityUpdate,
            &[0xde, 0xad, 0xbe, 0xef],
            &payload,
            &fork_digests
        )
        .unwrap_err(),
        ProtocolError::UnknownForkDigest("deadbeef".to_string())
    );
    assert!(matches!(
        LightClientMessage::<Spec>::decode(
            MessageKind::FinalityUpdate,
            &context,
            &payload[1..],
            &fork_digests
        ),
        Err(ProtocolError::Decode { .. })
    ));

    let decoded = LightClientMessage::<Spec>::decode(
        MessageKind::FinalityUpdate,
        &context,
        &payload,
        &fork_digests,
    )
    .unwrap();
    let outcome = processor.process_message(decoded, CURRENT_SLOT).unwrap();
    assert!(outcome.finalized_header_advanced);
    assert_eq!(processor.latest_finality_update(), Some(&finality_update));
    assert_eq!(processor.finalized_header().unwrap().slot(), 16);
}

#[test_log::test]
fn latest_gossip_updates_are_kept() {
    let chain = minimal_chain();
    let mut processor = tracking(&chain);

    let newer = chain.finality_update(UpdateParams::new(40, 41).finalized(32));
    processor
        .process_finality_update(newer.clone(), CURRENT_SLOT)
        .unwrap();
    // Valid but finalizes an older block than the one already kept.
    let older = chain.finality_update(UpdateParams::new(44, 45).finalized(24));
    processor
        .process_finality_update(older, CURRENT_SLOT)
        .unwrap();
    assert_eq!(processor.latest_finality_update(), Some(&newer));

    let first = chain.optimistic_update(UpdateParams::new(50, 51));
    let second = chain.optimistic_update(UpdateParams::new(48, 52));
    processor
        .process_optimistic_update(first.clone(), CURRENT_SLOT)
        .unwrap();
    processor
        .process_optimistic_update(second, CURRENT_SLOT)
        .unwrap();
    assert_eq!(processor.latest_optimistic_update(), Some(&first));
    assert_eq!(processor.optimistic_header().unwrap().slot(), 50);
}

/// A chain whose genesis was `current_slot` slots ago, served by a mock node with a
/// bootstrap at slot 8 and updates through period 1.
fn served_chain(current_slot: u64) -> (TestChain<Spec>, MockRpc<Spec>) {
    let mut config = Config::from(networks::minimal());
    config.chain.genesis_time = unix_time().as_secs() - current_slot * 12;
    let chain = TestChain::<Spec>::new(config, 3);

    let rpc = MockRpc::new();
    let (root, bootstrap) = chain.bootstrap(8);
    rpc.insert_bootstrap(bootstrap);
    rpc.push_update(
        chain.update(
            UpdateParams::new(20, 21)
                .finalized(16)
                .with_next_sync_committee(),
        ),
    );
    rpc.push_update(
        chain.update(
            UpdateParams::new(70, 71)
                .finalized(66)
                .with_next_sync_committee(),
        ),
    );
    rpc.set_finality_update(chain.finality_update(UpdateParams::new(90, 91).finalized(80)));
    rpc.set_optimistic_update(chain.optimistic_update(UpdateParams::new(95, 96)));

    let mut chain = chain;
    Arc::make_mut(&mut chain.config).checkpoint = Some(root);
    (chain, rpc)
}

#[test_log::test(tokio::test)]
async fn sync_catches_up_to_head() {
    let (chain, rpc) = served_chain(100);
    let (senders, mut receivers) = light_client_watch_channels::<Spec>();
    let mut client = ConsensusLightClient::new(rpc.clone(), chain.config.clone())
        .unwrap()
        .with_watch_senders(senders);

    assert!(client.get_header().is_none());
    client.sync().await.unwrap();

    let finalized = client.get_finalized_header().unwrap();
    assert_eq!(finalized.slot(), 80);
    assert_eq!(client.get_header().unwrap().slot(), 95);
    assert_eq!(
        client.last_checkpoint,
        Some(finalized.beacon().tree_hash_root())
    );
    {
        let processor = client.processor();
        let processor = processor.lock();
        let store = processor.store().unwrap();
        assert_eq!(processor.state(), SyncState::Tracking);
        assert_eq!(&store.current_sync_committee, chain.committee(1));
        assert_eq!(store.next_sync_committee.as_ref(), Some(chain.committee(2)));
    }

    assert!(receivers.update.has_changed().unwrap());
    assert_eq!(
        receivers
            .update
            .borrow_and_update()
            .as_ref()
            .map(|update| update.attested_slot()),
        Some(70)
    );
    assert_eq!(
        receivers
            .finality_update
            .borrow_and_update()
            .as_ref()
            .map(|update| update.finalized_header().slot()),
        Some(80)
    );
    assert_eq!(
        receivers
            .optimistic_update
            .borrow_and_update()
            .as_ref()
            .map(|update| update.attested_header().slot()),
        Some(95)
    );

    // The node moves on; the next poll picks up the new finality.
    rpc.set_finality_update(chain.finality_update(UpdateParams::new(97, 98).finalized(88)));
    client.advance().await.unwrap();
    assert_eq!(client.get_finalized_header().unwrap().slot(), 88);
    assert!(receivers.finality_update.has_changed().unwrap());
}

#[test_log::test(tokio::test)]
async fn sync_requires_a_known_checkpoint() {
    let (chain, rpc) = served_chain(100);
    let config = Arc::new(Config {
        checkpoint: Some(B256::repeat_byte(7)),
        ..(*chain.config).clone()
    });
    let mut client = ConsensusLightClient::new(rpc, config).unwrap();
    assert!(client.sync().await.is_err());
    assert!(client.get_finalized_header().is_none());
}

#[test_log::test(tokio::test)]
async fn strict_checkpoint_age() {
    let (chain, rpc) = served_chain(100);
    let mut config = (*chain.config).clone();
    config.max_checkpoint_age = 60;

    let mut client = ConsensusLightClient::new(rpc.clone(), Arc::new(config.clone())).unwrap();
    client.sync().await.unwrap();

    config.strict_checkpoint_age = true;
    let mut client = ConsensusLightClient::new(rpc, Arc::new(config)).unwrap();
    let err = client.sync().await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConsensusError>(),
        Some(&ConsensusError::CheckpointTooOld)
    );
    assert!(client.get_finalized_header().is_none());
}

#[test_log::test]
fn mismatched_preset_is_refused() {
    let chain = minimal_chain();
    let rpc = MockRpc::<MainnetConsensusSpec>::new();
    assert!(ConsensusLightClient::new(rpc, chain.config.clone()).is_err());
}
