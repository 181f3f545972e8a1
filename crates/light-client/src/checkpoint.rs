//! Trusted checkpoint lookup from a [checkpointz](https://github.com/ethpandaops/checkpointz)
//! provider, used when the configured checkpoint is too old to bootstrap from.

use alloy::primitives::B256;
use anyhow::{anyhow, Result};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_this_or_that::as_u64;
use tracing::debug;

use crate::errors::RpcError;

#[derive(Debug, Clone, Deserialize)]
struct SlotsResponse {
    data: Slots,
}

#[derive(Debug, Clone, Deserialize)]
struct Slots {
    slots: Vec<SlotCheckpoint>,
}

/// A slot known to the provider. Slots the provider has not backfilled carry no block root.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotCheckpoint {
    #[serde(deserialize_with = "as_u64")]
    pub slot: u64,
    #[serde(default)]
    pub block_root: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct CheckpointFallback {
    client: reqwest::Client,
}

impl Default for CheckpointFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointFallback {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Latest finalized block root served by the provider at `url`.
    pub async fn fetch_checkpoint_from_api(&self, url: &str) -> Result<B256> {
        let slots = self.fetch_slots(url).await?;
        latest_checkpoint(&slots).ok_or_else(|| anyhow!("no checkpoint found at {url}"))
    }

    async fn fetch_slots(&self, url: &str) -> Result<Vec<SlotCheckpoint>> {
        let req = format!("{}/checkpointz/v1/beacon/slots", url.trim_end_matches('/'));
        debug!(url = %req, "fetching checkpoint slots");

        let res = self
            .client
            .get(req)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| RpcError::new("checkpointz_slots", err))?
            .json::<SlotsResponse>()
            .await
            .map_err(|err| RpcError::new("checkpointz_slots", err))?;

        Ok(res.data.slots)
    }
}

/// Block root of the highest slot that has one.
pub fn latest_checkpoint(slots: &[SlotCheckpoint]) -> Option<B256> {
    slots
        .iter()
        .filter_map(|checkpoint| checkpoint.block_root.map(|root| (checkpoint.slot, root)))
        .max_by_key(|(slot, _)| *slot)
        .map(|(_, root)| root)
}
