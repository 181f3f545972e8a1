//! Deterministic fixtures for exercising the sync protocol with real keys, proofs and
//! signatures.

use std::{collections::BTreeMap, marker::PhantomData};

use alloy::primitives::{FixedBytes, B256};
use ethereum_hashing::hash32_concat;
use milagro_bls::{AggregateSignature, PublicKey, SecretKey, Signature};
use ssz_types::{typenum::Unsigned, BitVector, FixedVector};
use tree_hash::TreeHash;

use crate::{
    clock::calc_sync_period,
    config::{ChainConfig, Fork, Forks},
    consensus::{
        types::{
            BeaconBlockHeader, BlsSignature, LightClientBootstrap, LightClientFinalityUpdate,
            LightClientHeader, LightClientOptimisticUpdate, LightClientUpdate, PubKey,
            SyncAggregate, SyncCommittee,
        },
        utils::compute_committee_sign_root,
    },
};

/// Genesis validators root shared by all fixtures.
pub const TEST_GENESIS_ROOT: B256 = B256::repeat_byte(0x42);

/// Fork schedule for fixtures: Altair proofs throughout, Deneb signing from epoch 1000.
pub fn test_forks() -> Forks {
    let fork = |epoch, version: [u8; 4]| Fork {
        epoch,
        fork_version: FixedBytes::from(version),
    };
    Forks {
        genesis: fork(0, [0, 0, 0, 0]),
        altair: fork(0, [1, 0, 0, 0]),
        bellatrix: fork(0, [2, 0, 0, 0]),
        capella: fork(0, [3, 0, 0, 0]),
        deneb: fork(1000, [4, 0, 0, 0]),
        electra: fork(u64::MAX, [5, 0, 0, 0]),
    }
}

pub fn test_chain_config() -> ChainConfig {
    ChainConfig {
        chain_id: 1,
        genesis_time: 1_606_824_023,
        genesis_root: TEST_GENESIS_ROOT,
    }
}

fn secret_key(scalar: u64) -> SecretKey {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&scalar.to_be_bytes());
    SecretKey::from_bytes(&bytes).expect("small non-zero scalars are valid secret keys")
}

/// A sync committee with known secret keys.
///
/// Member `i` of the committee built from `seed` holds the scalar `seed * 10_000 + i + 1`. Since
/// every member signs the same root, the aggregate of the first `k` signatures equals a single
/// signature under the sum of their scalars.
pub struct TestCommittee<N: Unsigned> {
    scalars: Vec<u64>,
    pub public_keys: Vec<PublicKey>,
    _size: PhantomData<N>,
}

impl<N: Unsigned> TestCommittee<N> {
    /// Committees built from different seeds share no keys.
    pub fn new(seed: u64) -> Self {
        let scalars: Vec<u64> = (0..N::to_u64()).map(|i| seed * 10_000 + i + 1).collect();
        let public_keys = scalars
            .iter()
            .map(|scalar| PublicKey::from_secret_key(&secret_key(*scalar)))
            .collect();
        Self {
            scalars,
            public_keys,
            _size: PhantomData,
        }
    }

    pub fn sync_committee(&self) -> SyncCommittee<N> {
        let pubkeys = self
            .public_keys
            .iter()
            .map(|key| PubKey::from_bytes(&key.as_bytes()).expect("48 byte key"))
            .collect::<Vec<_>>();
        SyncCommittee {
            pubkeys: FixedVector::new(pubkeys).expect("one key per member"),
            // Not consulted by the sync protocol.
            aggregate_pubkey: PubKey::default(),
        }
    }

    /// Signs `header` with the first `participants` members.
    pub fn sign(
        &self,
        header: &BeaconBlockHeader,
        participants: usize,
        fork_version: FixedBytes<4>,
        genesis_root: B256,
    ) -> SyncAggregate<N> {
        let mut bits = BitVector::<N>::new();
        for i in 0..participants {
            bits.set(i, true).expect("index within committee");
        }

        let mut aggregate = AggregateSignature::new();
        if participants > 0 {
            let signing_root = compute_committee_sign_root(header, fork_version, genesis_root);
            let scalar = self.scalars.iter().take(participants).sum();
            aggregate.add(&Signature::new(signing_root.as_slice(), &secret_key(scalar)));
        }

        SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature {
                signature: aggregate.as_bytes(),
            },
        }
    }
}

/// Sparse binary merkle tree addressed by generalized index. Nodes without a leaf below them
/// hold a filler value derived from their index.
#[derive(Debug, Default, Clone)]
pub struct StateTree {
    leaves: BTreeMap<u64, B256>,
}

fn depth_of(gindex: u64) -> u32 {
    63 - gindex.leading_zeros()
}

impl StateTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gindex: u64, leaf: B256) -> &mut Self {
        self.leaves.insert(gindex, leaf);
        self
    }

    pub fn root(&self) -> B256 {
        self.node(1)
    }

    /// Sibling path from the leaf at `gindex` up to the root.
    pub fn branch(&self, gindex: u64) -> Vec<B256> {
        let mut branch = Vec::with_capacity(depth_of(gindex) as usize);
        let mut index = gindex;
        while index > 1 {
            branch.push(self.node(index ^ 1));
            index >>= 1;
        }
        branch
    }

    fn has_leaf_below(&self, gindex: u64) -> bool {
        let depth = depth_of(gindex);
        self.leaves.keys().any(|&leaf| {
            let leaf_depth = depth_of(leaf);
            leaf_depth >= depth && leaf >> (leaf_depth - depth) == gindex
        })
    }

    fn node(&self, gindex: u64) -> B256 {
        if let Some(leaf) = self.leaves.get(&gindex) {
            return *leaf;
        }
        if !self.has_leaf_below(gindex) {
            let mut filler = [0u8; 32];
            filler[..8].copy_from_slice(&gindex.to_le_bytes());
            filler[31] = 0xff;
            return B256::from(filler);
        }
        B256::from_slice(&hash32_concat(
            self.node(gindex * 2).as_slice(),
            self.node(gindex * 2 + 1).as_slice(),
        ))
    }
}

/// What a fixture update should carry.
#[derive(Debug, Clone, Copy)]
pub struct UpdateParams {
    pub attested_slot: u64,
    pub finalized_slot: Option<u64>,
    pub with_next_sync_committee: bool,
    pub participants: usize,
}

impl UpdateParams {
    pub fn optimistic(attested_slot: u64, participants: usize) -> Self {
        Self {
            attested_slot,
            finalized_slot: None,
            with_next_sync_committee: false,
            participants,
        }
    }

    pub fn finality(attested_slot: u64, finalized_slot: u64, participants: usize) -> Self {
        Self {
            finalized_slot: Some(finalized_slot),
            ..Self::optimistic(attested_slot, participants)
        }
    }

    pub fn with_next_sync_committee(mut self) -> Self {
        self.with_next_sync_committee = true;
        self
    }
}

/// A chain with one key set per sync committee period.
pub struct TestChain<N: Unsigned> {
    pub forks: Forks,
    pub genesis_root: B256,
    pub committees: Vec<TestCommittee<N>>,
}

impl<N: Unsigned> TestChain<N> {
    pub fn new(periods: u64) -> Self {
        Self {
            forks: test_forks(),
            genesis_root: TEST_GENESIS_ROOT,
            committees: (0..periods).map(TestCommittee::new).collect(),
        }
    }

    /// Committee serving the period `slot` belongs to.
    pub fn committee_at(&self, slot: u64) -> &TestCommittee<N> {
        &self.committees[calc_sync_period(slot) as usize]
    }

    pub fn header(&self, slot: u64, state_root: B256) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot,
            proposer_index: slot % 1000,
            parent_root: B256::with_last_byte((slot % 251) as u8),
            state_root,
            body_root: B256::repeat_byte(0xbb),
        }
    }

    /// A bootstrap for the block at `slot` and the root to trust it by.
    pub fn bootstrap(&self, slot: u64) -> (B256, LightClientBootstrap<N>) {
        let geometry = self.forks.proof_geometry(slot).current_sync_committee;
        let committee = self.committee_at(slot).sync_committee();

        let mut tree = StateTree::new();
        tree.insert(geometry.generalized_index(), committee.tree_hash_root());
        let header = self.header(slot, tree.root());

        let bootstrap = LightClientBootstrap {
            header: LightClientHeader {
                beacon: header.clone(),
            },
            current_sync_committee: committee,
            current_sync_committee_branch: tree.branch(geometry.generalized_index()),
        };
        (header.tree_hash_root(), bootstrap)
    }

    /// A fully proven and signed update.
    ///
    /// The finalized block of a finality update is itself proven against its own state, so that
    /// it is distinct per slot.
    pub fn update(&self, params: UpdateParams) -> LightClientUpdate<N> {
        let geometry = self.forks.proof_geometry(params.attested_slot);
        let finalized_gindex = geometry.finalized_root.generalized_index();
        let next_gindex = geometry.next_sync_committee.generalized_index();

        let finalized_header = params
            .finalized_slot
            .map(|slot| self.header(slot, B256::with_last_byte(0x0f)))
            .unwrap_or_default();
        let next_sync_committee = if params.with_next_sync_committee {
            let next_period = calc_sync_period(params.attested_slot) as usize + 1;
            self.committees[next_period].sync_committee()
        } else {
            SyncCommittee::default()
        };

        let mut tree = StateTree::new();
        if params.finalized_slot.is_some() {
            tree.insert(finalized_gindex, finalized_header.tree_hash_root());
        }
        if params.with_next_sync_committee {
            tree.insert(next_gindex, next_sync_committee.tree_hash_root());
        }
        let attested_header = self.header(params.attested_slot, tree.root());

        let finality_branch = match params.finalized_slot {
            Some(_) => tree.branch(finalized_gindex),
            None => vec![B256::ZERO; geometry.finalized_root.depth],
        };
        let next_sync_committee_branch = if params.with_next_sync_committee {
            tree.branch(next_gindex)
        } else {
            vec![B256::ZERO; geometry.next_sync_committee.depth]
        };

        let sync_aggregate = self.committee_at(params.attested_slot).sign(
            &attested_header,
            params.participants,
            self.forks.fork_version(params.attested_slot),
            self.genesis_root,
        );

        LightClientUpdate {
            attested_header: LightClientHeader {
                beacon: attested_header,
            },
            next_sync_committee,
            next_sync_committee_branch,
            finalized_header: LightClientHeader {
                beacon: finalized_header,
            },
            finality_branch,
            sync_aggregate,
            signature_slot: params.attested_slot + 1,
        }
    }

    pub fn finality_update(&self, params: UpdateParams) -> LightClientFinalityUpdate<N> {
        let update = self.update(params);
        LightClientFinalityUpdate {
            attested_header: update.attested_header,
            finalized_header: update.finalized_header,
            finality_branch: update.finality_branch,
            sync_aggregate: update.sync_aggregate,
            signature_slot: update.signature_slot,
        }
    }

    pub fn optimistic_update(
        &self,
        attested_slot: u64,
        participants: usize,
    ) -> LightClientOptimisticUpdate<N> {
        let update = self.update(UpdateParams::optimistic(attested_slot, participants));
        LightClientOptimisticUpdate {
            attested_header: update.attested_header,
            sync_aggregate: update.sync_aggregate,
            signature_slot: update.signature_slot,
        }
    }
}
