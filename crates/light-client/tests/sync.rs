use std::{fs, path::Path};

use alloy::primitives::B256;
use light_client::{
    clock::ManualTimeProvider,
    config::client_config::Config,
    consensus::{rpc::mock_rpc::MockRpc, types::BeaconBlockHeader},
    database::{Database, FileDB},
    errors::NodeError,
    test_utils::{test_chain_config, test_forks, TestChain, UpdateParams},
    Client, ClientBuilder,
};
use ssz_types::typenum::U512;
use tempfile::TempDir;
use tree_hash::TreeHash;

const BOOTSTRAP_SLOT: u64 = 8000;
const PERIOD: u64 = 8192;
const HEAD_SLOT: u64 = PERIOD + 130;

fn write_json<S: serde::Serialize>(dir: &Path, file: &str, value: &S) {
    fs::write(dir.join(file), serde_json::to_string(value).unwrap()).unwrap();
}

/// Serves a chain bootstrapped late in period 0 whose head has crossed into period 1.
fn write_fixtures(chain: &TestChain<U512>, dir: &Path) -> B256 {
    let (root, bootstrap) = chain.bootstrap(BOOTSTRAP_SLOT);
    let updates = vec![
        chain.update(
            UpdateParams::finality(BOOTSTRAP_SLOT + 64, BOOTSTRAP_SLOT + 32, 480)
                .with_next_sync_committee(),
        ),
        chain.update(
            UpdateParams::finality(PERIOD + 64, PERIOD + 32, 480).with_next_sync_committee(),
        ),
    ];
    let finality = chain.finality_update(UpdateParams::finality(PERIOD + 128, PERIOD + 96, 480));
    let optimistic = chain.optimistic_update(HEAD_SLOT, 480);

    write_json(dir, "bootstrap.json", &bootstrap);
    write_json(dir, "updates.json", &updates);
    write_json(dir, "finality.json", &finality);
    write_json(dir, "optimistic.json", &optimistic);
    write_json(dir, "chain_id.json", &test_chain_config().chain_id);
    root
}

struct Harness {
    chain: TestChain<U512>,
    fixtures: TempDir,
    data: TempDir,
    checkpoint: B256,
    time: ManualTimeProvider,
}

impl Harness {
    fn new() -> Self {
        let chain = TestChain::new(3);
        let fixtures = tempfile::tempdir().unwrap();
        let checkpoint = write_fixtures(&chain, fixtures.path());
        let time = ManualTimeProvider::new(test_chain_config().genesis_time + (HEAD_SLOT + 1) * 12);

        Self {
            chain,
            fixtures,
            data: tempfile::tempdir().unwrap(),
            checkpoint,
            time,
        }
    }

    fn config(&self, strict_checkpoint_age: bool) -> Config {
        Config {
            consensus_rpc: self.fixtures.path().display().to_string(),
            default_checkpoint: B256::ZERO,
            checkpoint: Some(self.checkpoint),
            data_dir: Some(self.data.path().to_path_buf()),
            chain: test_chain_config(),
            forks: test_forks(),
            max_checkpoint_age: 1_209_600,
            fallback: None,
            strict_checkpoint_age,
        }
    }

    fn client(&self, config: Config) -> Client<FileDB, MockRpc, ManualTimeProvider> {
        ClientBuilder::new()
            .config(config)
            .build_with_time(self.time.clone())
            .unwrap()
    }
}

#[test_log::test(tokio::test)]
async fn client_syncs_across_committee_rotation() {
    let harness = Harness::new();
    let mut client = harness.client(harness.config(false));
    client.start().await.unwrap();

    assert_eq!(client.chain_id().await, 1);
    assert_eq!(client.get_header().await.unwrap().slot, HEAD_SLOT);

    let finalized = client.get_finalized_header().await;
    assert_eq!(finalized.slot, PERIOD + 96);
    assert_eq!(client.get_last_checkpoint().await, Some(finalized.tree_hash_root()));

    // Every finalization reached during the initial sync is on disk.
    let logged: Vec<u64> = client
        .database()
        .load_finalized_headers()
        .unwrap()
        .into_iter()
        .map(|header| header.slot)
        .collect();
    assert_eq!(
        logged,
        vec![BOOTSTRAP_SLOT, BOOTSTRAP_SLOT + 32, PERIOD + 32, PERIOD + 96]
    );

    client.shutdown().await;
    let db = FileDB::new(&harness.config(false)).unwrap();
    assert_eq!(db.load_checkpoint().unwrap(), finalized.tree_hash_root());
    assert_eq!(db.load_finalized_headers().unwrap().len(), 4);
}

#[test_log::test(tokio::test)]
async fn stale_head_is_not_served() {
    let harness = Harness::new();
    let mut client = harness.client(harness.config(false));
    client.start().await.unwrap();

    harness.time.advance(20 * 12);
    let err = client.get_header().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NodeError>(),
        Some(NodeError::OutOfSync(_))
    ));
    client.shutdown().await;
}

#[test_log::test(tokio::test)]
async fn old_checkpoint_without_fallback_fails_in_strict_mode() {
    let harness = Harness::new();
    harness.time.advance(1_209_600 + PERIOD * 12);
    let mut client = harness.client(harness.config(true));

    let err = client.start().await.unwrap_err();
    assert!(format!("{err:#}").contains("checkpoint is too old"));
}

#[test_log::test(tokio::test)]
async fn forged_bootstrap_is_refused() {
    let harness = Harness::new();
    let (_, mut bootstrap) = harness.chain.bootstrap(BOOTSTRAP_SLOT);
    bootstrap.current_sync_committee = harness.chain.committees[1].sync_committee();
    write_json(harness.fixtures.path(), "bootstrap.json", &bootstrap);

    let mut client = harness.client(harness.config(false));
    let err = client.start().await.unwrap_err();
    assert!(format!("{err:#}").contains("current sync committee"));
}

#[test]
fn finalized_log_is_append_only() {
    let harness = Harness::new();
    let db = FileDB::new(&harness.config(false)).unwrap();
    let header = |slot| BeaconBlockHeader {
        slot,
        ..Default::default()
    };
    db.append_finalized_header(&header(32)).unwrap();
    db.append_finalized_header(&header(64)).unwrap();

    let reopened = FileDB::new(&harness.config(false)).unwrap();
    reopened.append_finalized_header(&header(96)).unwrap();
    let slots: Vec<u64> = reopened
        .load_finalized_headers()
        .unwrap()
        .into_iter()
        .map(|header| header.slot)
        .collect();
    assert_eq!(slots, vec![32, 64, 96]);
}
