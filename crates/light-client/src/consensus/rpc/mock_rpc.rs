use std::{fs::read_to_string, path::PathBuf};

use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;

use super::ConsensusRpc;
use crate::{
    clock::calc_sync_period,
    consensus::types::{
        LightClientBootstrap, LightClientFinalityUpdate, LightClientOptimisticUpdate,
        LightClientUpdate,
    },
};

/// Serves light client objects from JSON files in a directory.
#[derive(Clone, Debug)]
pub struct MockRpc {
    testdata: PathBuf,
}

impl MockRpc {
    fn read<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T> {
        let contents = read_to_string(self.testdata.join(file))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl ConsensusRpc for MockRpc {
    fn new(path: &str) -> Self {
        MockRpc {
            testdata: PathBuf::from(path),
        }
    }

    async fn get_bootstrap(&self, _block_root: B256) -> Result<LightClientBootstrap> {
        self.read("bootstrap.json")
    }

    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<LightClientUpdate>> {
        let updates: Vec<LightClientUpdate> = self.read("updates.json")?;
        Ok(updates
            .into_iter()
            .filter(|update| calc_sync_period(update.attested_header.beacon.slot) >= period)
            .take(count as usize)
            .collect())
    }

    async fn get_finality_update(&self) -> Result<LightClientFinalityUpdate> {
        self.read("finality.json")
    }

    async fn get_optimistic_update(&self) -> Result<LightClientOptimisticUpdate> {
        self.read("optimistic.json")
    }

    async fn get_finality_checkpoint(&self) -> Result<B256> {
        self.read("checkpoint.json")
    }

    async fn chain_id(&self) -> Result<u64> {
        self.read("chain_id.json")
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}
