use std::sync::Arc;

use alloy::primitives::B256;
use anyhow::{anyhow, Result};
use chrono::Duration;
use ssz_types::typenum::U512;
use tracing::{debug, info, warn};
use tree_hash::TreeHash;

use super::{
    constants::{MAX_REQUEST_LIGHT_CLIENT_UPDATES, SLOTS_PER_EPOCH},
    errors::{ConsensusError, ErrorKind},
    rpc::ConsensusRpc,
    store::{self, LightClientStore},
    types::{
        BeaconBlockHeader, GenericUpdate, LightClientFinalityUpdate, LightClientOptimisticUpdate,
        SyncCommittee,
    },
};
use crate::{
    clock::{calc_sync_period, SlotClock, SystemTimeProvider, TimeProvider},
    config::client_config::Config,
    utils::hex_encode,
};

// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md

pub struct ConsensusLightClient<R: ConsensusRpc, T: TimeProvider = SystemTimeProvider> {
    rpc: R,
    store: LightClientStore,
    clock: SlotClock<T>,
    initial_checkpoint: B256,
    pub last_checkpoint: Option<B256>,
    pub config: Arc<Config>,
    finalized_headers: Vec<BeaconBlockHeader>,
}

impl<R: ConsensusRpc, T: TimeProvider> ConsensusLightClient<R, T> {
    pub fn new(
        rpc: R,
        checkpoint_block_root: B256,
        config: Arc<Config>,
        clock: SlotClock<T>,
    ) -> Self {
        ConsensusLightClient {
            rpc,
            store: LightClientStore::default(),
            clock,
            initial_checkpoint: checkpoint_block_root,
            last_checkpoint: None,
            config,
            finalized_headers: vec![],
        }
    }

    /// Drops all synced state and bootstraps from `checkpoint_block_root` on the next sync.
    pub fn reset_checkpoint(&mut self, checkpoint_block_root: B256) {
        self.initial_checkpoint = checkpoint_block_root;
        self.store = LightClientStore::default();
        self.last_checkpoint = None;
        self.finalized_headers.clear();
    }

    /// Headers finalized since the last call, oldest first. The bootstrap header counts as the
    /// first one.
    pub fn take_finalized_headers(&mut self) -> Vec<BeaconBlockHeader> {
        std::mem::take(&mut self.finalized_headers)
    }

    pub async fn check_rpc(&self) -> Result<()> {
        let chain_id = self.rpc.chain_id().await?;

        if chain_id != self.config.chain.chain_id {
            Err(ConsensusError::IncorrectRpcNetwork.into())
        } else {
            Ok(())
        }
    }

    pub fn get_header(&self) -> &BeaconBlockHeader {
        &self.store.optimistic_header
    }

    pub fn get_finalized_header(&self) -> &BeaconBlockHeader {
        &self.store.finalized_header
    }

    pub fn get_light_client_store(&self) -> &LightClientStore {
        &self.store
    }

    pub fn clock(&self) -> &SlotClock<T> {
        &self.clock
    }

    pub async fn get_finality_update(&self) -> Result<LightClientFinalityUpdate> {
        self.rpc.get_finality_update().await
    }

    pub async fn get_optimistic_update(&self) -> Result<LightClientOptimisticUpdate> {
        self.rpc.get_optimistic_update().await
    }

    pub async fn sync(&mut self) -> Result<()> {
        self.bootstrap().await?;

        let bootstrap_period = calc_sync_period(self.store.finalized_header.slot);
        let current_period = self.clock.current_period();
        let count = current_period
            .saturating_sub(bootstrap_period)
            .saturating_add(1)
            .min(MAX_REQUEST_LIGHT_CLIENT_UPDATES as u64) as u8;

        let mut updates = self.rpc.get_updates(bootstrap_period, count).await?;
        updates.sort_by_key(|update| update.attested_header.beacon.slot);

        for update in &updates {
            self.process_update(GenericUpdate::from(update))?;
        }

        // The latest heads are best effort once the committee chain is in place.
        let finality_update = self.rpc.get_finality_update().await;
        if let Err(err) =
            finality_update.and_then(|update| self.process_update(GenericUpdate::from(&update)))
        {
            debug!("Could not apply finality update: {err}");
        }

        let optimistic_update = self.rpc.get_optimistic_update().await;
        if let Err(err) =
            optimistic_update.and_then(|update| self.process_update(GenericUpdate::from(&update)))
        {
            warn!("Could not apply optimistic update: {err}");
        }

        match self.rpc.get_finality_checkpoint().await {
            Ok(root) if root != self.store.finalized_header.tree_hash_root() => {
                debug!(
                    rpc = self.rpc.name(),
                    "rpc finalized checkpoint {} differs from local finality",
                    hex_encode(root)
                );
            }
            Ok(_) => {}
            Err(err) => debug!("Could not fetch finality checkpoint: {err}"),
        }

        info!(
            "Light client in sync with checkpoint: {}",
            hex_encode(self.initial_checkpoint)
        );

        Ok(())
    }

    pub async fn advance(&mut self) -> Result<()> {
        self.process_slot();

        match self.rpc.get_finality_update().await {
            Ok(finality_update) => {
                debug!(
                    "Processing finality update with finalized slot {}",
                    finality_update.finalized_header.beacon.slot
                );
                self.process_update(GenericUpdate::from(&finality_update))?;
            }
            Err(err) => {
                warn!("Could not fetch finality update: {err}")
            }
        }

        let optimistic_update = self.rpc.get_optimistic_update().await?;
        self.process_update(GenericUpdate::from(&optimistic_update))?;

        if !self.store.is_next_sync_committee_known() {
            debug!("checking for sync committee update");
            let current_period = self.store.finalized_period();
            let updates = self.rpc.get_updates(current_period, 1).await?;

            if let Some(update) = updates.first() {
                if let Err(err) = self.process_update(GenericUpdate::from(update)) {
                    debug!("sync committee update rejected: {err}");
                }
            }
        }

        Ok(())
    }

    async fn bootstrap(&mut self) -> Result<()> {
        let bootstrap = self
            .rpc
            .get_bootstrap(self.initial_checkpoint)
            .await
            .map_err(|err| anyhow!("could not fetch bootstrap from {}: {err}", self.rpc.name()))?;

        let store = store::bootstrap(self.initial_checkpoint, &bootstrap, &self.config.forks)?;

        // Only the verified header is trusted for its slot.
        if !self.is_valid_checkpoint(store.finalized_header.slot) {
            if self.config.strict_checkpoint_age {
                return Err(ConsensusError::CheckpointTooOld.into());
            } else {
                warn!("checkpoint too old, consider using a more recent block");
            }
        }

        self.store = store;
        self.last_checkpoint = None;
        self.finalized_headers = vec![self.store.finalized_header.clone()];

        Ok(())
    }

    // Stale and premature updates are expected while following the head and are skipped, any
    // other rejection is surfaced to the caller.
    fn process_update(&mut self, update: GenericUpdate) -> Result<()> {
        let finalized_slot = self.store.finalized_header.slot;
        let optimistic_slot = self.store.optimistic_header.slot;

        let res = store::process_light_client_update(
            &mut self.store,
            &update,
            self.clock.current_slot(),
            self.config.chain.genesis_root,
            &self.config.forks,
        );

        match res {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::StaleOrFutureUpdate => {
                debug!(
                    slot = update.attested_header.slot,
                    "skipping update: {err}"
                );
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        let participation = participation(&update);
        if self.store.optimistic_header.slot > optimistic_slot {
            self.log_head(
                "updated head",
                self.store.optimistic_header.slot,
                participation,
            );
        }
        if self.store.finalized_header.slot > finalized_slot {
            self.on_finalized();
            self.log_head(
                "finalized slot",
                self.store.finalized_header.slot,
                participation,
            );
        }

        Ok(())
    }

    fn process_slot(&mut self) {
        let finalized_slot = self.store.finalized_header.slot;
        store::process_slot_for_light_client_store(&mut self.store, self.clock.current_slot());

        if self.store.finalized_header.slot > finalized_slot {
            self.on_finalized();
            warn!(
                slot = self.store.finalized_header.slot,
                "finality stalled, applied best pending update"
            );
        }
    }

    fn on_finalized(&mut self) {
        self.finalized_headers.push(self.store.finalized_header.clone());
        if self.store.finalized_header.slot % SLOTS_PER_EPOCH == 0 {
            self.last_checkpoint = Some(self.store.finalized_header.tree_hash_root());
        }
    }

    fn log_head(&self, label: &str, slot: u64, participation: f32) {
        let decimals = if participation == 100.0 { 1 } else { 2 };
        let age = self.age(slot);

        info!(
            "{label:<26} slot={}  confidence={:.decimals$}%  age={:02}:{:02}:{:02}:{:02}",
            slot,
            participation,
            age.num_days(),
            age.num_hours() % 24,
            age.num_minutes() % 60,
            age.num_seconds() % 60,
        );
    }

    fn age(&self, slot: u64) -> Duration {
        self.clock.age(slot)
    }

    pub fn expected_current_slot(&self) -> u64 {
        self.clock.current_slot()
    }

    /// Gets the duration until the next update
    /// Updates are scheduled for 8 seconds into each slot
    pub fn duration_until_next_update(&self) -> std::time::Duration {
        self.clock.duration_until_next_update()
    }

    // Determines blockhash_slot age and returns true if it is younger than `max_checkpoint_age`
    fn is_valid_checkpoint(&self, blockhash_slot: u64) -> bool {
        let slot_age = self.age(blockhash_slot).num_seconds();
        u64::try_from(slot_age).unwrap_or_default() < self.config.max_checkpoint_age
    }
}

fn participation(update: &GenericUpdate) -> f32 {
    let committee_size = SyncCommittee::<U512>::size();
    update.num_participants() as f32 / committee_size as f32 * 100f32
}
