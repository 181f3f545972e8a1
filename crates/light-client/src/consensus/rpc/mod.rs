pub mod mock_rpc;
pub mod nimbus_rpc;

use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;

use super::types::{
    LightClientBootstrap, LightClientFinalityUpdate, LightClientOptimisticUpdate,
    LightClientUpdate,
};

// implements https://github.com/ethereum/beacon-APIs/tree/master/apis/beacon/light_client
#[async_trait]
pub trait ConsensusRpc: Send + Sync + Clone {
    fn new(path: &str) -> Self;
    async fn get_bootstrap(&self, block_root: B256) -> Result<LightClientBootstrap>;
    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<LightClientUpdate>>;
    async fn get_finality_update(&self) -> Result<LightClientFinalityUpdate>;
    async fn get_optimistic_update(&self) -> Result<LightClientOptimisticUpdate>;
    /// Root of the latest finalized block known to the server.
    async fn get_finality_checkpoint(&self) -> Result<B256>;
    async fn chain_id(&self) -> Result<u64>;
    fn name(&self) -> String;
}
