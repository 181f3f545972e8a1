//! Slot arithmetic over an injectable time source.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::consensus::constants::{
    EPOCHS_PER_SYNC_COMMITTEE_PERIOD, SECONDS_PER_SLOT, SLOTS_PER_EPOCH,
};

pub fn compute_epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

pub fn compute_sync_committee_period(epoch: u64) -> u64 {
    epoch / EPOCHS_PER_SYNC_COMMITTEE_PERIOD
}

pub fn calc_sync_period(slot: u64) -> u64 {
    compute_sync_committee_period(compute_epoch_at_slot(slot))
}

/// Source of wall-clock time, as seconds since the unix epoch.
pub trait TimeProvider: Send + Sync {
    fn unix_time(&self) -> Duration;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn unix_time(&self) -> Duration {
        // A clock set before 1970 is treated as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// A time source that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeProvider {
    seconds: Arc<AtomicU64>,
}

impl ManualTimeProvider {
    pub fn new(seconds: u64) -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(seconds)),
        }
    }

    pub fn advance(&self, seconds: u64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeProvider for ManualTimeProvider {
    fn unix_time(&self) -> Duration {
        Duration::from_secs(self.seconds.load(Ordering::SeqCst))
    }
}

/// Maps wall-clock time to beacon chain slots.
#[derive(Debug, Clone)]
pub struct SlotClock<T = SystemTimeProvider> {
    genesis_time: u64,
    time: T,
}

impl<T: TimeProvider> SlotClock<T> {
    pub fn new(genesis_time: u64, time: T) -> Self {
        Self { genesis_time, time }
    }

    /// Current slot, or 0 before genesis.
    pub fn current_slot(&self) -> u64 {
        self.now().saturating_sub(self.genesis_time) / SECONDS_PER_SLOT
    }

    pub fn current_epoch(&self) -> u64 {
        compute_epoch_at_slot(self.current_slot())
    }

    pub fn current_period(&self) -> u64 {
        calc_sync_period(self.current_slot())
    }

    /// Start of `slot` in unix seconds, saturating at `u64::MAX`.
    pub fn slot_timestamp(&self, slot: u64) -> u64 {
        slot.saturating_mul(SECONDS_PER_SLOT).saturating_add(self.genesis_time)
    }

    /// Time elapsed since the start of `slot`, zero for slots in the future.
    pub fn age(&self, slot: u64) -> chrono::Duration {
        let elapsed = self.now().saturating_sub(self.slot_timestamp(slot));
        chrono::Duration::seconds(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    /// Updates are scheduled 8 seconds into the next slot, once the head has been attested.
    pub fn duration_until_next_update(&self) -> Duration {
        let next_slot = self.current_slot() + 1;
        let next_slot_timestamp = self.slot_timestamp(next_slot);
        let time_to_next_slot = next_slot_timestamp.saturating_sub(self.now());

        Duration::from_secs(time_to_next_slot + 8)
    }

    fn now(&self) -> u64 {
        self.time.unix_time().as_secs()
    }
}
