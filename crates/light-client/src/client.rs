use std::{path::PathBuf, sync::Arc};

use alloy::primitives::B256;
use anyhow::{anyhow, bail, Result};
use tokio::{spawn, sync::RwLock, task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::{
    checkpoint::CheckpointFallback,
    clock::{SystemTimeProvider, TimeProvider},
    config::{client_config::Config, Network},
    consensus::{errors::ConsensusError, rpc::ConsensusRpc, types::BeaconBlockHeader},
    database::Database,
    node::Node,
    utils::hex_encode,
};

#[derive(Default)]
pub struct ClientBuilder {
    network: Option<Network>,
    consensus_rpc: Option<String>,
    checkpoint: Option<B256>,
    data_dir: Option<PathBuf>,
    config: Option<Config>,
    fallback: Option<String>,
    strict_checkpoint_age: bool,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn consensus_rpc(mut self, consensus_rpc: &str) -> Self {
        self.consensus_rpc = Some(consensus_rpc.to_string());
        self
    }

    pub fn checkpoint(mut self, checkpoint: B256) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn fallback(mut self, fallback: &str) -> Self {
        self.fallback = Some(fallback.to_string());
        self
    }

    pub fn strict_checkpoint_age(mut self) -> Self {
        self.strict_checkpoint_age = true;
        self
    }

    pub fn build<DB: Database, R: ConsensusRpc + 'static>(self) -> Result<Client<DB, R>> {
        self.build_with_time(SystemTimeProvider)
    }

    /// Builds a client whose slot clock reads from `time`.
    pub fn build_with_time<DB, R, T>(self, time: T) -> Result<Client<DB, R, T>>
    where
        DB: Database,
        R: ConsensusRpc + 'static,
        T: TimeProvider + 'static,
    {
        let base_config = if let Some(network) = self.network {
            network.to_base_config()
        } else {
            let config = self
                .config
                .as_ref()
                .ok_or(anyhow!("missing network config"))?;
            config.to_base_config()
        };

        let consensus_rpc = self
            .consensus_rpc
            .or_else(|| self.config.as_ref().map(|config| config.consensus_rpc.clone()))
            .or(base_config.consensus_rpc)
            .ok_or(anyhow!("missing consensus rpc"))?;

        let checkpoint = self
            .checkpoint
            .or_else(|| self.config.as_ref().and_then(|config| config.checkpoint));

        let default_checkpoint = self
            .config
            .as_ref()
            .map_or(base_config.default_checkpoint, |config| {
                config.default_checkpoint
            });

        let data_dir = self
            .data_dir
            .or_else(|| self.config.as_ref().and_then(|config| config.data_dir.clone()));

        let fallback = self
            .fallback
            .or_else(|| self.config.as_ref().and_then(|config| config.fallback.clone()));

        let strict_checkpoint_age = self.strict_checkpoint_age
            || self
                .config
                .as_ref()
                .is_some_and(|config| config.strict_checkpoint_age);

        let config = Config {
            consensus_rpc,
            checkpoint,
            default_checkpoint,
            data_dir,
            chain: base_config.chain,
            forks: base_config.forks,
            max_checkpoint_age: base_config.max_checkpoint_age,
            fallback,
            strict_checkpoint_age,
        };

        Client::new(config, time)
    }
}

pub struct Client<
    DB: Database,
    R: ConsensusRpc + 'static,
    T: TimeProvider + 'static = SystemTimeProvider,
> {
    node: Arc<RwLock<Node<R, T>>>,
    db: Arc<DB>,
    fallback: Option<String>,
    advance_task: Option<JoinHandle<()>>,
}

impl<DB: Database, R: ConsensusRpc + 'static, T: TimeProvider + 'static> Client<DB, R, T> {
    fn new(mut config: Config, time: T) -> Result<Self> {
        let db = DB::new(&config)?;
        if config.checkpoint.is_none() {
            let checkpoint = db.load_checkpoint()?;
            config.checkpoint = Some(checkpoint);
        }

        let config = Arc::new(config);
        let node = Node::with_time(config.clone(), time);
        let node = Arc::new(RwLock::new(node));

        Ok(Client {
            node,
            db: Arc::new(db),
            fallback: config.fallback.clone(),
            advance_task: None,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let sync_res = self.node.write().await.sync().await;

        if let Err(err) = sync_res {
            if !matches!(
                err.consensus_error(),
                Some(ConsensusError::CheckpointTooOld)
            ) {
                return Err(err.into());
            }

            warn!(
                "failed to sync consensus node with checkpoint: {}",
                hex_encode(
                    self.node
                        .read()
                        .await
                        .config
                        .checkpoint
                        .unwrap_or_default()
                ),
            );

            if let Err(fallback_err) = self.boot_from_fallback().await {
                error!("Invalid checkpoint. Please update your checkpoint to a more recent block. Alternatively, set an explicit checkpoint fallback service url with the `--fallback` flag");
                return Err(fallback_err.context(err));
            }
        }

        let finalized_headers = self.node.write().await.take_finalized_headers();
        record_finalized_headers(self.db.as_ref(), &finalized_headers);

        self.start_advance_thread();

        Ok(())
    }

    fn start_advance_thread(&mut self) {
        let node = self.node.clone();
        let db = self.db.clone();
        let handle = spawn(async move {
            loop {
                let mut node_guard = node.write().await;
                if let Err(err) = node_guard.advance().await {
                    warn!("consensus error: {err}");
                }
                let finalized_headers = node_guard.take_finalized_headers();
                let next_update = node_guard.duration_until_next_update();
                drop(node_guard);

                record_finalized_headers(db.as_ref(), &finalized_headers);

                sleep(next_update).await;
            }
        });
        self.advance_task = Some(handle);
    }

    async fn boot_from_fallback(&self) -> Result<()> {
        let Some(fallback) = &self.fallback else {
            bail!("no explicit fallback specified");
        };

        info!("attempting to load checkpoint from fallback \"{fallback}\"");

        let checkpoint = CheckpointFallback::new()
            .fetch_checkpoint_from_api(fallback)
            .await
            .map_err(|err| anyhow!("Failed to fetch checkpoint from fallback \"{fallback}\": {err}"))?;

        info!(
            "fallback responded with checkpoint {}",
            hex_encode(checkpoint)
        );

        // Try to sync again with the new checkpoint, the node is unrecoverable if this fails too
        let mut node = self.node.write().await;
        node.consensus.reset_checkpoint(checkpoint);
        node.sync().await?;

        Ok(())
    }

    /// Stops following the chain and persists the last epoch boundary checkpoint.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.advance_task.take() {
            handle.abort();
        }

        let node = self.node.read().await;
        let Some(checkpoint) = node.get_last_checkpoint() else {
            return;
        };

        info!("saving last checkpoint hash");
        if let Err(err) = self.db.save_checkpoint(checkpoint) {
            warn!("checkpoint save failed: {err}");
        }
    }

    pub async fn get_header(&self) -> Result<BeaconBlockHeader> {
        Ok(self.node.read().await.get_header()?)
    }

    pub async fn get_finalized_header(&self) -> BeaconBlockHeader {
        self.node.read().await.get_finalized_header().clone()
    }

    pub async fn get_last_checkpoint(&self) -> Option<B256> {
        self.node.read().await.get_last_checkpoint()
    }

    pub async fn chain_id(&self) -> u64 {
        self.node.read().await.chain_id()
    }

    pub fn database(&self) -> &DB {
        &self.db
    }
}

fn record_finalized_headers<DB: Database>(db: &DB, headers: &[BeaconBlockHeader]) {
    for header in headers {
        if let Err(err) = db.append_finalized_header(header) {
            warn!(slot = header.slot, "failed to record finalized header: {err}");
        }
    }
}
