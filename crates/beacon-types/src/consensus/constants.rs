//! Light client sync protocol constants.
//!
//! Taken from:
//! https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md
//! and
//! https://github.com/ethereum/consensus-specs/blob/dev/specs/capella/light-client/sync-protocol.md

use std::time::Duration;

use ssz_types::typenum::{U4, U5, U6};

/// `get_generalized_index(BeaconState, 'finalized_checkpoint', 'root')`
pub const FINALIZED_ROOT_GINDEX: u64 = 105;

/// `get_generalized_index(BeaconState, 'current_sync_committee')`
pub const CURRENT_SYNC_COMMITTEE_GINDEX: u64 = 54;

/// `get_generalized_index(BeaconState, 'next_sync_committee')`
pub const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;

/// `get_generalized_index(BeaconBlockBody, 'execution_payload')`
pub const EXECUTION_PAYLOAD_GINDEX: u64 = 25;

pub type FinalizedRootProofLen = U6;
pub type CurrentSyncCommitteeProofLen = U5;
pub type NextSyncCommitteeProofLen = U5;
pub type ExecutionBranchLen = U4;

pub const FINALIZED_ROOT_DEPTH: usize = 6;
pub const SYNC_COMMITTEE_DEPTH: usize = 5;
pub const EXECUTION_PAYLOAD_DEPTH: usize = 4;

pub const GENESIS_SLOT: u64 = 0;

/// Domain type of sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [7, 0, 0, 0];

/// Seconds per slot
///
/// 12 seconds
pub const SECONDS_PER_SLOT: Duration = Duration::from_secs(12);

#[cfg(test)]
mod test {
    use ssz_types::typenum::Unsigned;

    use super::*;
    use crate::merkle::floorlog2;

    #[test]
    fn depths_match_generalized_indices() {
        assert_eq!(floorlog2(FINALIZED_ROOT_GINDEX), FINALIZED_ROOT_DEPTH);
        assert_eq!(floorlog2(CURRENT_SYNC_COMMITTEE_GINDEX), SYNC_COMMITTEE_DEPTH);
        assert_eq!(floorlog2(NEXT_SYNC_COMMITTEE_GINDEX), SYNC_COMMITTEE_DEPTH);
        assert_eq!(floorlog2(EXECUTION_PAYLOAD_GINDEX), EXECUTION_PAYLOAD_DEPTH);
        assert_eq!(FinalizedRootProofLen::to_usize(), FINALIZED_ROOT_DEPTH);
        assert_eq!(NextSyncCommitteeProofLen::to_usize(), SYNC_COMMITTEE_DEPTH);
        assert_eq!(ExecutionBranchLen::to_usize(), EXECUTION_PAYLOAD_DEPTH);
    }
}
