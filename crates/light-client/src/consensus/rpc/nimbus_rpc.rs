use std::cmp;

use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_this_or_that::as_u64;
use tracing::debug;

use super::ConsensusRpc;
use crate::{
    consensus::{
        constants::MAX_REQUEST_LIGHT_CLIENT_UPDATES,
        types::{
            LightClientBootstrap, LightClientFinalityUpdate, LightClientOptimisticUpdate,
            LightClientUpdate,
        },
    },
    errors::RpcError,
};

/// Beacon node REST API client.
#[derive(Clone, Debug)]
pub struct NimbusRpc {
    rpc: String,
    client: reqwest::Client,
}

impl NimbusRpc {
    async fn get<T: DeserializeOwned>(&self, method: &str, path: &str) -> Result<T> {
        let req = format!("{}{}", self.rpc.trim_end_matches('/'), path);
        debug!(method, url = %req, "consensus rpc request");

        let res = self
            .client
            .get(req)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| RpcError::new(method, err))?
            .json::<T>()
            .await
            .map_err(|err| RpcError::new(method, err))?;

        Ok(res)
    }
}

#[async_trait]
impl ConsensusRpc for NimbusRpc {
    fn new(rpc: &str) -> Self {
        NimbusRpc {
            rpc: rpc.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_bootstrap(&self, block_root: B256) -> Result<LightClientBootstrap> {
        let path = format!("/eth/v1/beacon/light_client/bootstrap/{block_root}");
        let res: Response<LightClientBootstrap> = self.get("bootstrap", &path).await?;
        Ok(res.data)
    }

    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<LightClientUpdate>> {
        let count = cmp::min(count, MAX_REQUEST_LIGHT_CLIENT_UPDATES);
        let path =
            format!("/eth/v1/beacon/light_client/updates?start_period={period}&count={count}");
        let res: Vec<Response<LightClientUpdate>> = self.get("updates", &path).await?;
        Ok(res.into_iter().map(|update| update.data).collect())
    }

    async fn get_finality_update(&self) -> Result<LightClientFinalityUpdate> {
        let res: Response<LightClientFinalityUpdate> = self
            .get(
                "finality_update",
                "/eth/v1/beacon/light_client/finality_update",
            )
            .await?;
        Ok(res.data)
    }

    async fn get_optimistic_update(&self) -> Result<LightClientOptimisticUpdate> {
        let res: Response<LightClientOptimisticUpdate> = self
            .get(
                "optimistic_update",
                "/eth/v1/beacon/light_client/optimistic_update",
            )
            .await?;
        Ok(res.data)
    }

    async fn get_finality_checkpoint(&self) -> Result<B256> {
        let res: Response<FinalityCheckpoints> = self
            .get(
                "finality_checkpoints",
                "/eth/v1/beacon/states/head/finality_checkpoints",
            )
            .await?;
        Ok(res.data.finalized.root)
    }

    async fn chain_id(&self) -> Result<u64> {
        let res: Response<Spec> = self.get("spec", "/eth/v1/config/spec").await?;
        Ok(res.data.chain_id)
    }

    fn name(&self) -> String {
        "nimbus".to_string()
    }
}

#[derive(Deserialize, Debug)]
struct Response<T> {
    data: T,
}

#[derive(Deserialize, Debug)]
struct FinalityCheckpoints {
    finalized: Checkpoint,
}

#[derive(Deserialize, Debug)]
struct Checkpoint {
    root: B256,
}

#[derive(Deserialize, Debug)]
struct Spec {
    #[serde(rename = "DEPOSIT_NETWORK_ID", deserialize_with = "as_u64")]
    chain_id: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spec_response_reads_string_chain_id() {
        let json = r#"{"data":{"DEPOSIT_NETWORK_ID":"11155111","SECONDS_PER_SLOT":"12"}}"#;
        let res: Response<Spec> = serde_json::from_str(json).unwrap();
        assert_eq!(res.data.chain_id, 11155111);
    }

    #[test]
    fn finality_checkpoints_response() {
        let json = r#"{"execution_optimistic":false,"finalized":true,"data":{
            "previous_justified":{"epoch":"10","root":"0x1111111111111111111111111111111111111111111111111111111111111111"},
            "current_justified":{"epoch":"11","root":"0x2222222222222222222222222222222222222222222222222222222222222222"},
            "finalized":{"epoch":"9","root":"0x3333333333333333333333333333333333333333333333333333333333333333"}}}"#;
        let res: Response<FinalityCheckpoints> = serde_json::from_str(json).unwrap();
        assert_eq!(res.data.finalized.root, B256::repeat_byte(0x33));
    }
}
