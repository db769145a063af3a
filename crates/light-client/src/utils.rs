use std::time::{Duration, SystemTime, UNIX_EPOCH};

use beacon_types::consensus::constants::SECONDS_PER_SLOT;

/// Offset into a slot at which fresh light client updates are expected to be available.
pub const UPDATE_DELAY: Duration = Duration::from_secs(4);

/// Time since the unix epoch. A clock set before 1970 reads as zero.
pub fn unix_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

pub fn slot_timestamp(slot: u64, genesis_time: u64) -> u64 {
    slot * SECONDS_PER_SLOT.as_secs() + genesis_time
}

/// The wall clock slot at `now`; slot 0 before genesis.
pub fn expected_current_slot(now: Duration, genesis_time: u64) -> u64 {
    now.as_secs().saturating_sub(genesis_time) / SECONDS_PER_SLOT.as_secs()
}

/// Time from `now` until the next slot's updates should be available.
pub fn duration_until_next_update(now: Duration, genesis_time: u64) -> Duration {
    let next_slot = expected_current_slot(now, genesis_time) + 1;
    let next_slot_start = Duration::from_secs(slot_timestamp(next_slot, genesis_time));
    next_slot_start.saturating_sub(now) + UPDATE_DELAY
}

/// Returns `true` if a checkpoint at `checkpoint_slot` is younger than `max_age` seconds at
/// `current_slot`.
pub fn is_checkpoint_fresh(checkpoint_slot: u64, current_slot: u64, max_age: u64) -> bool {
    let slot_age = current_slot.saturating_sub(checkpoint_slot);
    slot_age * SECONDS_PER_SLOT.as_secs() < max_age
}
