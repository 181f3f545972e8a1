//! The light client sync protocol over a [`LightClientStore`].
//!
//! https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md
//!
//! Validation never touches the store. Only [`apply_light_client_update`] mutates it, reached
//! through [`process_light_client_update`] after a successful validation or through the timeout
//! in [`process_slot_for_light_client_store`] for a previously validated update.

use std::cmp;

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_types::typenum::{Unsigned, U512};
use tracing::{debug, info};
use tree_hash::TreeHash;

use super::{
    constants::{MAX_CLOCK_DISPARITY_SLOTS, MIN_SYNC_COMMITTEE_PARTICIPANTS, UPDATE_TIMEOUT},
    errors::ConsensusError,
    merkle::{ensure_branch_length, verify_merkle_proof},
    types::{
        is_zero_branch, BeaconBlockHeader, GenericUpdate, LightClientBootstrap, SyncCommittee,
    },
    utils::{get_participating_keys, verify_sync_committee_signature},
};
use crate::{clock::calc_sync_period, config::Forks};

/// `LightClientStore` object for the light client sync protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct LightClientStore<N: Unsigned = U512> {
    pub finalized_header: BeaconBlockHeader,
    pub current_sync_committee: SyncCommittee<N>,
    pub next_sync_committee: Option<SyncCommittee<N>>,
    pub best_valid_update: Option<GenericUpdate<N>>,
    pub optimistic_header: BeaconBlockHeader,
    pub previous_max_active_participants: u64,
    pub current_max_active_participants: u64,
}

impl<N: Unsigned> Default for LightClientStore<N> {
    fn default() -> Self {
        Self {
            finalized_header: BeaconBlockHeader::default(),
            current_sync_committee: SyncCommittee::default(),
            next_sync_committee: None,
            best_valid_update: None,
            optimistic_header: BeaconBlockHeader::default(),
            previous_max_active_participants: 0,
            current_max_active_participants: 0,
        }
    }
}

impl<N: Unsigned> LightClientStore<N> {
    pub fn finalized_period(&self) -> u64 {
        calc_sync_period(self.finalized_header.slot)
    }

    pub fn is_next_sync_committee_known(&self) -> bool {
        self.next_sync_committee.is_some()
    }

    /// Signers an update has to exceed before it may move the optimistic header early.
    pub fn safety_threshold(&self) -> u64 {
        cmp::max(
            self.previous_max_active_participants,
            self.current_max_active_participants,
        ) / 2
    }
}

/// Builds the initial store from a trusted block root and the server-supplied bootstrap.
pub fn bootstrap<N: Unsigned>(
    checkpoint_root: B256,
    bootstrap: &LightClientBootstrap<N>,
    forks: &Forks,
) -> Result<LightClientStore<N>, ConsensusError> {
    let header = &bootstrap.header.beacon;
    let geometry = forks.proof_geometry(header.slot).current_sync_committee;
    ensure_branch_length(&bootstrap.current_sync_committee_branch, geometry)?;

    let header_root = header.tree_hash_root();
    if header_root != checkpoint_root {
        return Err(ConsensusError::InvalidHeaderHash {
            expected: checkpoint_root,
            actual: header_root,
        });
    }

    let committee_valid = verify_merkle_proof(
        bootstrap.current_sync_committee.tree_hash_root(),
        &bootstrap.current_sync_committee_branch,
        geometry,
        header.state_root,
    )?;
    if !committee_valid {
        return Err(ConsensusError::InvalidCurrentSyncCommitteeProof);
    }

    Ok(LightClientStore {
        finalized_header: header.clone(),
        current_sync_committee: bootstrap.current_sync_committee.clone(),
        next_sync_committee: None,
        best_valid_update: None,
        optimistic_header: header.clone(),
        previous_max_active_participants: 0,
        current_max_active_participants: 0,
    })
}

// implements the checks of validate_light_client_update, rejecting the whole update on the first
// failure
pub fn verify_generic_update<N: Unsigned>(
    store: &LightClientStore<N>,
    update: &GenericUpdate<N>,
    current_slot: u64,
    genesis_root: B256,
    forks: &Forks,
) -> Result<(), ConsensusError> {
    let geometry = forks.proof_geometry(update.attested_header.slot);
    let active_header = update.active_header();

    // Shape checks come before any hashing.
    if let Some(branch) = &update.finality_branch {
        ensure_branch_length(branch, geometry.finalized_root)?;
    }
    if let Some(branch) = &update.next_sync_committee_branch {
        ensure_branch_length(branch, geometry.next_sync_committee)?;
    }
    let headers_ordered = update.signature_slot > update.attested_header.slot
        && update.attested_header.slot >= active_header.slot();
    if !headers_ordered {
        return Err(ConsensusError::MalformedHeaderOrder);
    }

    let latest_acceptable_slot = current_slot + MAX_CLOCK_DISPARITY_SLOTS;
    if active_header.slot() > latest_acceptable_slot || update.signature_slot > latest_acceptable_slot
    {
        return Err(ConsensusError::InvalidTimestamp);
    }
    let store_period = store.finalized_period();
    // An update for the current period may still teach the store its next committee even when
    // its finalized header is behind the store.
    let learns_next_committee = !store.is_next_sync_committee_known()
        && update.has_next_sync_committee()
        && calc_sync_period(update.attested_header.slot) == store_period;
    if active_header.slot() < store.finalized_header.slot && !learns_next_committee {
        return Err(ConsensusError::NotRelevant);
    }

    let update_period = calc_sync_period(active_header.slot());
    let valid_period = if store.is_next_sync_committee_known() {
        update_period == store_period || update_period == store_period + 1
    } else {
        update_period == store_period
    };
    if !valid_period || calc_sync_period(update.signature_slot) != update_period {
        return Err(ConsensusError::InvalidPeriod);
    }

    match (&update.finalized_header, &update.finality_branch) {
        (Some(finalized_header), Some(branch)) => {
            let is_valid = verify_merkle_proof(
                finalized_header.tree_hash_root(),
                branch,
                geometry.finalized_root,
                update.attested_header.state_root,
            )?;
            if !is_valid {
                return Err(ConsensusError::InvalidFinalityProof);
            }
        }
        (Some(_), None) => return Err(ConsensusError::InvalidFinalityProof),
        (None, Some(branch)) if !is_zero_branch(branch) => {
            return Err(ConsensusError::InvalidFinalityProof)
        }
        (None, _) => {}
    }

    match (&update.next_sync_committee, &update.next_sync_committee_branch) {
        (Some(next_committee), Some(branch)) => {
            if update_period == store_period {
                if let Some(known) = &store.next_sync_committee {
                    if known != next_committee {
                        return Err(ConsensusError::NextSyncCommitteeMismatch);
                    }
                }
            }
            let is_valid = verify_merkle_proof(
                next_committee.tree_hash_root(),
                branch,
                geometry.next_sync_committee,
                update.attested_header.state_root,
            )?;
            if !is_valid {
                return Err(ConsensusError::InvalidNextSyncCommitteeProof);
            }
        }
        (Some(_), None) => return Err(ConsensusError::InvalidNextSyncCommitteeProof),
        (None, Some(branch)) if !is_zero_branch(branch) => {
            return Err(ConsensusError::InvalidNextSyncCommitteeProof)
        }
        (None, _) => {}
    }

    let participants = update.num_participants();
    if participants < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(ConsensusError::InsufficientParticipation(participants));
    }

    let sync_committee = match (&store.next_sync_committee, update_period == store_period) {
        (Some(next_committee), false) => next_committee,
        _ => &store.current_sync_committee,
    };
    let public_keys =
        get_participating_keys(sync_committee, &update.sync_aggregate.sync_committee_bits)?;
    let is_valid_signature = verify_sync_committee_signature(
        &public_keys,
        &update.attested_header,
        &update.sync_aggregate.sync_committee_signature,
        forks.fork_version(update.attested_header.slot),
        genesis_root,
    );
    if !is_valid_signature {
        return Err(ConsensusError::InvalidSignature);
    }

    Ok(())
}

/// Commits `update` into the store.
///
/// Rotation is keyed off the stored finalized period at call time, so applying the same update
/// twice leaves the store as it was after the first application.
pub fn apply_light_client_update<N: Unsigned>(
    store: &mut LightClientStore<N>,
    update: &GenericUpdate<N>,
) {
    let store_period = store.finalized_period();
    let active_header = update.active_header();
    let update_period = calc_sync_period(active_header.slot());

    match store.next_sync_committee.take() {
        None => {
            store
                .next_sync_committee
                .clone_from(&update.next_sync_committee);
        }
        Some(next_committee) if update_period == store_period + 1 => {
            info!(period = update_period, "sync committee updated");
            store.current_sync_committee = next_committee;
            store
                .next_sync_committee
                .clone_from(&update.next_sync_committee);
        }
        Some(next_committee) => store.next_sync_committee = Some(next_committee),
    }

    if active_header.slot() >= store.finalized_header.slot {
        store.finalized_header = active_header.header().clone();
        if store.finalized_header.slot > store.optimistic_header.slot {
            store.optimistic_header = store.finalized_header.clone();
        }
    }
}

/// Validates `update`, tracks it as best pending update and commits it once it is safe to do so.
pub fn process_light_client_update<N: Unsigned>(
    store: &mut LightClientStore<N>,
    update: &GenericUpdate<N>,
    current_slot: u64,
    genesis_root: B256,
    forks: &Forks,
) -> Result<(), ConsensusError> {
    verify_generic_update(store, update, current_slot, genesis_root, forks)?;

    let participants = update.num_participants();
    let is_better = store
        .best_valid_update
        .as_ref()
        .is_none_or(|best| participants > best.num_participants());
    if is_better {
        store.best_valid_update = Some(update.clone());
    }

    store.current_max_active_participants =
        cmp::max(store.current_max_active_participants, participants);

    if participants > store.safety_threshold()
        && update.attested_header.slot > store.optimistic_header.slot
    {
        store.optimistic_header = update.attested_header.clone();
        debug!(
            slot = store.optimistic_header.slot,
            participants, "updated optimistic head"
        );
    }

    let has_supermajority = participants * 3 >= SyncCommittee::<N>::size() * 2;
    if has_supermajority && update.has_finality() {
        apply_light_client_update(store, update);
        store.best_valid_update = None;
        debug!(
            slot = store.finalized_header.slot,
            participants, "updated finalized head"
        );
    } else {
        debug!(
            participants,
            has_finality = update.has_finality(),
            "update retained as pending"
        );
    }

    Ok(())
}

/// Per-slot bookkeeping: rolls the participation window and force-applies the best pending
/// update when finality has stalled for longer than [`UPDATE_TIMEOUT`].
pub fn process_slot_for_light_client_store<N: Unsigned>(
    store: &mut LightClientStore<N>,
    current_slot: u64,
) {
    if current_slot % UPDATE_TIMEOUT == 0 {
        store.previous_max_active_participants = store.current_max_active_participants;
        store.current_max_active_participants = 0;
    }

    if current_slot > store.finalized_header.slot + UPDATE_TIMEOUT {
        if let Some(mut best) = store.best_valid_update.take() {
            // A finalized header that does not move finality forward is replaced by the
            // attested one.
            let stale_finality = best
                .finalized_header
                .as_ref()
                .is_some_and(|header| header.slot <= store.finalized_header.slot);
            if stale_finality {
                best.finalized_header = None;
            }
            apply_light_client_update(store, &best);
            info!(
                slot = store.finalized_header.slot,
                "forced update after timeout"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::FixedBytes;
    use quickcheck::QuickCheck;
    use rstest::rstest;
    use ssz_types::typenum::{U4, U512};

    use super::*;
    use crate::{
        consensus::errors::ErrorKind,
        test_utils::{TestChain, UpdateParams},
    };

    const PERIOD: u64 = UPDATE_TIMEOUT;

    fn bootstrapped(chain: &TestChain<U4>, slot: u64) -> LightClientStore<U4> {
        let (root, snapshot) = chain.bootstrap(slot);
        bootstrap(root, &snapshot, &chain.forks).unwrap()
    }

    fn generic(chain: &TestChain<U4>, params: UpdateParams) -> GenericUpdate<U4> {
        GenericUpdate::from(&chain.update(params))
    }

    fn process(
        chain: &TestChain<U4>,
        store: &mut LightClientStore<U4>,
        update: &GenericUpdate<U4>,
    ) -> Result<(), ConsensusError> {
        let current_slot = update.signature_slot + 1;
        process_light_client_update(store, update, current_slot, chain.genesis_root, &chain.forks)
    }

    #[test]
    fn bootstrap_from_trusted_root() {
        let chain = TestChain::<U4>::new(1);
        let (root, snapshot) = chain.bootstrap(100);
        assert_eq!(snapshot.current_sync_committee_branch.len(), 5);

        let store = bootstrap(root, &snapshot, &chain.forks).unwrap();
        assert_eq!(store.finalized_header.slot, 100);
        assert_eq!(store.optimistic_header, store.finalized_header);
        assert_eq!(
            store.current_sync_committee,
            chain.committees[0].sync_committee()
        );
        assert!(store.next_sync_committee.is_none());
        assert!(store.best_valid_update.is_none());
    }

    #[test]
    fn bootstrap_rejects_flipped_branch_byte() {
        let chain = TestChain::<U4>::new(1);
        let (root, mut snapshot) = chain.bootstrap(100);
        snapshot.current_sync_committee_branch[2].0[7] ^= 0x01;

        let err = bootstrap(root, &snapshot, &chain.forks).unwrap_err();
        assert_eq!(err, ConsensusError::InvalidCurrentSyncCommitteeProof);
        assert_eq!(err.kind(), ErrorKind::BootstrapMismatch);
    }

    #[test]
    fn bootstrap_rejects_untrusted_header() {
        let chain = TestChain::<U4>::new(1);
        let (_, snapshot) = chain.bootstrap(100);

        let err = bootstrap(B256::repeat_byte(9), &snapshot, &chain.forks).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BootstrapMismatch);
    }

    #[test]
    fn timeout_forces_best_update() {
        let chain = TestChain::<U4>::new(1);
        let mut store = bootstrapped(&chain, 1000);
        let update = generic(&chain, UpdateParams::optimistic(1100, 2));
        process(&chain, &mut store, &update).unwrap();
        assert_eq!(store.finalized_header.slot, 1000);
        assert!(store.best_valid_update.is_some());

        process_slot_for_light_client_store(&mut store, 1000 + UPDATE_TIMEOUT);
        assert_eq!(store.finalized_header.slot, 1000);

        process_slot_for_light_client_store(&mut store, 1000 + UPDATE_TIMEOUT + 1);
        assert_eq!(store.finalized_header.slot, 1100);
        assert!(store.best_valid_update.is_none());
    }

    #[test]
    fn timeout_uses_attested_header_when_finality_is_stale() {
        let chain = TestChain::<U4>::new(1);
        let mut store = bootstrapped(&chain, 1000);
        let mut best = generic(&chain, UpdateParams::finality(1100, 1050, 2));
        best.finalized_header.as_mut().unwrap().slot = 900;
        store.best_valid_update = Some(best);

        process_slot_for_light_client_store(&mut store, 1000 + UPDATE_TIMEOUT + 1);
        assert_eq!(store.finalized_header.slot, 1100);
    }

    #[test]
    fn supermajority_commits_immediately() {
        let chain = TestChain::<U512>::new(1);
        let (root, snapshot) = chain.bootstrap(100);
        let mut store = bootstrap(root, &snapshot, &chain.forks).unwrap();

        let weak = GenericUpdate::from(&chain.update(UpdateParams::finality(300, 200, 341)));
        process_light_client_update(&mut store, &weak, 400, chain.genesis_root, &chain.forks)
            .unwrap();
        assert_eq!(store.finalized_header.slot, 100);
        assert_eq!(store.best_valid_update.as_ref(), Some(&weak));

        let strong = GenericUpdate::from(&chain.update(UpdateParams::finality(300, 200, 342)));
        process_light_client_update(&mut store, &strong, 400, chain.genesis_root, &chain.forks)
            .unwrap();
        assert_eq!(store.finalized_header.slot, 200);
        assert_eq!(store.optimistic_header.slot, 300);
        assert!(store.best_valid_update.is_none());
    }

    #[test]
    fn committee_rotates_at_period_boundary() {
        let chain = TestChain::<U4>::new(3);
        let mut store = bootstrapped(&chain, 100);

        let learn = generic(
            &chain,
            UpdateParams::finality(300, 200, 3).with_next_sync_committee(),
        );
        process(&chain, &mut store, &learn).unwrap();
        assert_eq!(store.finalized_header.slot, 200);
        assert_eq!(
            store.next_sync_committee,
            Some(chain.committees[1].sync_committee())
        );

        let rotate = generic(
            &chain,
            UpdateParams::finality(PERIOD + 300, PERIOD + 200, 3).with_next_sync_committee(),
        );
        process(&chain, &mut store, &rotate).unwrap();
        assert_eq!(store.finalized_period(), 1);
        assert_eq!(
            store.current_sync_committee,
            chain.committees[1].sync_committee()
        );
        assert_eq!(
            store.next_sync_committee,
            Some(chain.committees[2].sync_committee())
        );
    }

    #[test]
    fn period_without_next_committee_is_not_skipped() {
        let chain = TestChain::<U4>::new(3);
        let mut store = bootstrapped(&chain, 100);

        let ahead = generic(&chain, UpdateParams::finality(PERIOD + 300, PERIOD + 200, 3));
        let err = process(&chain, &mut store, &ahead).unwrap_err();
        assert_eq!(err, ConsensusError::InvalidPeriod);

        let learn = generic(
            &chain,
            UpdateParams::finality(300, 200, 3).with_next_sync_committee(),
        );
        process(&chain, &mut store, &learn).unwrap();

        let two_ahead = generic(
            &chain,
            UpdateParams::finality(2 * PERIOD + 300, 2 * PERIOD + 200, 3),
        );
        let err = process(&chain, &mut store, &two_ahead).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleOrFutureUpdate);
        assert_eq!(store.finalized_period(), 0);
    }

    #[test]
    fn next_committee_learned_from_older_finality() {
        let chain = TestChain::<U4>::new(2);
        let mut store = bootstrapped(&chain, 1000);

        let update = generic(
            &chain,
            UpdateParams::finality(1300, 900, 3).with_next_sync_committee(),
        );
        process(&chain, &mut store, &update).unwrap();
        assert_eq!(store.finalized_header.slot, 1000);
        assert_eq!(
            store.next_sync_committee,
            Some(chain.committees[1].sync_committee())
        );

        let again = generic(&chain, UpdateParams::finality(1300, 900, 3));
        let err = process(&chain, &mut store, &again).unwrap_err();
        assert_eq!(err, ConsensusError::NotRelevant);
    }

    #[rstest]
    #[case::weaker_first(1, 2)]
    #[case::stronger_first(2, 1)]
    fn best_update_keeps_most_participants(#[case] first: usize, #[case] second: usize) {
        let chain = TestChain::<U4>::new(1);
        let mut store = bootstrapped(&chain, 100);

        let first = generic(&chain, UpdateParams::optimistic(200, first));
        let second = generic(&chain, UpdateParams::optimistic(210, second));
        process(&chain, &mut store, &first).unwrap();
        process(&chain, &mut store, &second).unwrap();

        let best = store.best_valid_update.unwrap();
        assert_eq!(best.num_participants(), 2);
    }

    #[test]
    fn equal_participation_keeps_first_update() {
        let chain = TestChain::<U4>::new(1);
        let mut store = bootstrapped(&chain, 100);

        let first = generic(&chain, UpdateParams::optimistic(200, 2));
        let second = generic(&chain, UpdateParams::optimistic(210, 2));
        process(&chain, &mut store, &first).unwrap();
        process(&chain, &mut store, &second).unwrap();

        assert_eq!(store.best_valid_update, Some(first));
    }

    #[test]
    fn finalized_slot_never_decreases() {
        fn prop(steps: Vec<(u16, u8, u8)>) -> bool {
            let chain = TestChain::<U4>::new(1);
            let mut store = bootstrapped(&chain, 100);

            for (attested, lag, participants) in steps.into_iter().take(6) {
                let attested_slot = 101 + u64::from(attested) % 4000;
                let participants = usize::from(participants % 5);
                let params = if lag % 2 == 0 {
                    let finalized_slot = attested_slot.saturating_sub(u64::from(lag));
                    UpdateParams::finality(attested_slot, finalized_slot, participants)
                } else {
                    UpdateParams::optimistic(attested_slot, participants)
                };
                let update = generic(&chain, params);

                let before = store.finalized_header.slot;
                let _ = process(&chain, &mut store, &update);
                process_slot_for_light_client_store(
                    &mut store,
                    before + UPDATE_TIMEOUT + u64::from(lag),
                );
                if store.finalized_header.slot < before
                    || store.optimistic_header.slot < store.finalized_header.slot
                {
                    return false;
                }
            }
            true
        }

        QuickCheck::new()
            .tests(30)
            .quickcheck(prop as fn(Vec<(u16, u8, u8)>) -> bool);
    }

    #[test]
    fn apply_is_idempotent() {
        let chain = TestChain::<U4>::new(3);
        let mut store = bootstrapped(&chain, 100);
        let learn = generic(
            &chain,
            UpdateParams::finality(300, 200, 3).with_next_sync_committee(),
        );
        let rotate = generic(
            &chain,
            UpdateParams::finality(PERIOD + 300, PERIOD + 200, 3).with_next_sync_committee(),
        );

        for update in [&learn, &rotate] {
            apply_light_client_update(&mut store, update);
            let once = store.clone();
            apply_light_client_update(&mut store, update);
            assert_eq!(store, once);
        }
        assert_eq!(
            store.current_sync_committee,
            chain.committees[1].sync_committee()
        );
    }

    #[test]
    fn optimistic_head_needs_safety_threshold() {
        let chain = TestChain::<U4>::new(1);
        let mut store = bootstrapped(&chain, 100);
        store.previous_max_active_participants = 4;
        assert_eq!(store.safety_threshold(), 2);

        let weak = generic(&chain, UpdateParams::optimistic(200, 2));
        process(&chain, &mut store, &weak).unwrap();
        assert_eq!(store.optimistic_header.slot, 100);

        let strong = generic(&chain, UpdateParams::optimistic(210, 3));
        process(&chain, &mut store, &strong).unwrap();
        assert_eq!(store.optimistic_header.slot, 210);
        assert_eq!(store.finalized_header.slot, 100);
        assert_eq!(store.current_max_active_participants, 3);
    }

    #[test]
    fn participation_window_rolls_on_timeout_boundary() {
        let mut store = LightClientStore::<U4> {
            current_max_active_participants: 3,
            previous_max_active_participants: 1,
            ..Default::default()
        };

        process_slot_for_light_client_store(&mut store, UPDATE_TIMEOUT - 1);
        assert_eq!(store.current_max_active_participants, 3);

        process_slot_for_light_client_store(&mut store, UPDATE_TIMEOUT);
        assert_eq!(store.previous_max_active_participants, 3);
        assert_eq!(store.current_max_active_participants, 0);
    }

    #[test]
    fn rejection_leaves_store_untouched() {
        let chain = TestChain::<U4>::new(1);
        let mut store = bootstrapped(&chain, 100);
        let before = store.clone();

        let mut update = generic(&chain, UpdateParams::finality(300, 200, 3));
        update.sync_aggregate.sync_committee_signature.signature[10] ^= 0x01;
        assert!(process(&chain, &mut store, &update).is_err());
        assert_eq!(store, before);
    }

    enum Tamper {
        FutureSlot,
        OlderThanFinalized,
        SignatureBeforeAttested,
        ShortFinalityBranch,
        FlippedFinalityBranch,
        NonZeroAbsentFinality,
        NonZeroAbsentCommittee,
        MismatchedNextCommittee,
        NoParticipants,
        WrongGenesisRoot,
        ForeignForkVersion,
    }

    #[rstest]
    #[case::future_slot(Tamper::FutureSlot, ConsensusError::InvalidTimestamp)]
    #[case::older_than_finalized(Tamper::OlderThanFinalized, ConsensusError::NotRelevant)]
    #[case::signature_before_attested(
        Tamper::SignatureBeforeAttested,
        ConsensusError::MalformedHeaderOrder
    )]
    #[case::short_finality_branch(
        Tamper::ShortFinalityBranch,
        ConsensusError::InvalidBranchLength { expected: 6, actual: 5 }
    )]
    #[case::flipped_finality_branch(
        Tamper::FlippedFinalityBranch,
        ConsensusError::InvalidFinalityProof
    )]
    #[case::non_zero_absent_finality(
        Tamper::NonZeroAbsentFinality,
        ConsensusError::InvalidFinalityProof
    )]
    #[case::non_zero_absent_committee(
        Tamper::NonZeroAbsentCommittee,
        ConsensusError::InvalidNextSyncCommitteeProof
    )]
    #[case::mismatched_next_committee(
        Tamper::MismatchedNextCommittee,
        ConsensusError::NextSyncCommitteeMismatch
    )]
    #[case::no_participants(Tamper::NoParticipants, ConsensusError::InsufficientParticipation(0))]
    #[case::wrong_genesis_root(Tamper::WrongGenesisRoot, ConsensusError::InvalidSignature)]
    #[case::foreign_fork_version(Tamper::ForeignForkVersion, ConsensusError::InvalidSignature)]
    fn invalid_updates_are_rejected(#[case] tamper: Tamper, #[case] expected: ConsensusError) {
        let chain = TestChain::<U4>::new(3);
        let mut store = bootstrapped(&chain, 1000);
        store.next_sync_committee = Some(chain.committees[1].sync_committee());

        let mut current_slot = 1400;
        let mut genesis_root = chain.genesis_root;
        let mut forks = chain.forks.clone();
        let mut update = generic(&chain, UpdateParams::finality(1300, 1200, 3));
        match tamper {
            Tamper::FutureSlot => current_slot = 1100,
            Tamper::OlderThanFinalized => {
                update = generic(&chain, UpdateParams::finality(1300, 900, 3))
            }
            Tamper::SignatureBeforeAttested => update.signature_slot = 1300,
            Tamper::ShortFinalityBranch => {
                update.finality_branch.as_mut().unwrap().pop();
            }
            Tamper::FlippedFinalityBranch => {
                update.finality_branch.as_mut().unwrap()[3].0[0] ^= 0x01
            }
            Tamper::NonZeroAbsentFinality => {
                update = generic(&chain, UpdateParams::optimistic(1300, 3));
                update.finality_branch = Some(vec![B256::repeat_byte(1); 6]);
            }
            Tamper::NonZeroAbsentCommittee => {
                update.next_sync_committee_branch = Some(vec![B256::repeat_byte(1); 5]);
            }
            Tamper::MismatchedNextCommittee => {
                update.next_sync_committee = Some(chain.committees[2].sync_committee());
                update.next_sync_committee_branch = Some(vec![B256::repeat_byte(1); 5]);
            }
            Tamper::NoParticipants => {
                update = generic(&chain, UpdateParams::finality(1300, 1200, 0))
            }
            Tamper::WrongGenesisRoot => genesis_root = B256::repeat_byte(0x43),
            Tamper::ForeignForkVersion => forks.capella.fork_version = FixedBytes::from([9, 0, 0, 0]),
        }

        let before = store.clone();
        let err = verify_generic_update(&store, &update, current_slot, genesis_root, &forks)
            .unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(store, before);
        assert!(
            process_light_client_update(&mut store, &update, current_slot, genesis_root, &forks)
                .is_err()
        );
        assert_eq!(store, before);
    }
}
