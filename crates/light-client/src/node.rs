use std::{sync::Arc, time::Duration};

use alloy::primitives::B256;

use crate::{
    clock::{SlotClock, SystemTimeProvider, TimeProvider},
    config::client_config::Config,
    consensus::{rpc::ConsensusRpc, types::BeaconBlockHeader, ConsensusLightClient},
    errors::NodeError,
};

/// Heads older than this many slots are not served.
const MAX_HEAD_DELAY_SLOTS: u64 = 10;

pub struct Node<R: ConsensusRpc, T: TimeProvider = SystemTimeProvider> {
    pub consensus: ConsensusLightClient<R, T>,
    pub config: Arc<Config>,
}

impl<R: ConsensusRpc, T: TimeProvider> Node<R, T> {
    pub fn with_time(config: Arc<Config>, time: T) -> Self {
        let rpc = R::new(&config.consensus_rpc);
        let checkpoint_hash = config.checkpoint.unwrap_or(config.default_checkpoint);
        let clock = SlotClock::new(config.chain.genesis_time, time);
        let consensus =
            ConsensusLightClient::new(rpc, checkpoint_hash, config.clone(), clock);

        Node { consensus, config }
    }

    pub async fn sync(&mut self) -> Result<(), NodeError> {
        self.consensus
            .check_rpc()
            .await
            .map_err(NodeError::ConsensusSyncError)?;

        self.consensus
            .sync()
            .await
            .map_err(NodeError::ConsensusSyncError)
    }

    pub async fn advance(&mut self) -> Result<(), NodeError> {
        self.consensus
            .advance()
            .await
            .map_err(NodeError::ConsensusAdvanceError)
    }

    pub fn duration_until_next_update(&self) -> Duration {
        self.consensus.duration_until_next_update()
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain.chain_id
    }

    pub fn get_header(&self) -> Result<BeaconBlockHeader, NodeError> {
        self.check_head_age()?;
        Ok(self.consensus.get_header().clone())
    }

    pub fn get_finalized_header(&self) -> &BeaconBlockHeader {
        self.consensus.get_finalized_header()
    }

    pub fn take_finalized_headers(&mut self) -> Vec<BeaconBlockHeader> {
        self.consensus.take_finalized_headers()
    }

    pub fn get_last_checkpoint(&self) -> Option<B256> {
        self.consensus.last_checkpoint
    }

    fn check_head_age(&self) -> Result<(), NodeError> {
        let synced_slot = self.consensus.get_header().slot;
        let expected_slot = self.consensus.expected_current_slot();
        let slot_delay = expected_slot.saturating_sub(synced_slot);

        if slot_delay > MAX_HEAD_DELAY_SLOTS {
            return Err(NodeError::OutOfSync(slot_delay));
        }

        Ok(())
    }
}
