use alloy::primitives::{FixedBytes, B256};
use milagro_bls::{AggregateSignature, PublicKey};
use ssz_types::{
    typenum::{Unsigned, U4},
    BitVector, FixedVector,
};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use super::{
    constants::DOMAIN_SYNC_COMMITTEE,
    errors::ConsensusError,
    types::{BeaconBlockHeader, BlsSignature, SyncCommittee},
};

#[derive(Default, Debug, TreeHash)]
struct SigningData {
    object_root: B256,
    domain: B256,
}

#[derive(Default, Debug, TreeHash)]
struct ForkData {
    current_version: FixedVector<u8, U4>,
    genesis_validator_root: B256,
}

pub fn compute_fork_data_root(current_version: FixedBytes<4>, genesis_validator_root: B256) -> B256 {
    let fork_data = ForkData {
        current_version: FixedVector::from(current_version.to_vec()),
        genesis_validator_root,
    };
    fork_data.tree_hash_root()
}

/// `domain_type[0:4] || fork_data_root[0:28]`
pub fn compute_domain(
    domain_type: [u8; 4],
    fork_version: FixedBytes<4>,
    genesis_root: B256,
) -> B256 {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_root);
    let mut domain = B256::ZERO;
    domain[..4].copy_from_slice(&domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

pub fn compute_signing_root(object_root: B256, domain: B256) -> B256 {
    let data = SigningData {
        object_root,
        domain,
    };
    data.tree_hash_root()
}

/// Signing root of `attested_header` under the sync committee domain of `fork_version`.
pub fn compute_committee_sign_root(
    attested_header: &BeaconBlockHeader,
    fork_version: FixedBytes<4>,
    genesis_root: B256,
) -> B256 {
    let domain = compute_domain(DOMAIN_SYNC_COMMITTEE, fork_version, genesis_root);
    compute_signing_root(attested_header.tree_hash_root(), domain)
}

/// Public keys of the committee members whose bit is set, in committee order.
pub fn get_participating_keys<N: Unsigned>(
    committee: &SyncCommittee<N>,
    bitfield: &BitVector<N>,
) -> Result<Vec<PublicKey>, ConsensusError> {
    bitfield
        .iter()
        .zip(committee.pubkeys.iter())
        .enumerate()
        .filter(|(_, (bit, _))| *bit)
        .map(|(i, (_, pk))| {
            PublicKey::from_bytes_unchecked(pk.as_slice())
                .map_err(|_| ConsensusError::InvalidPublicKey(i))
        })
        .collect()
}

pub fn get_bits<N: Unsigned>(bitfield: &BitVector<N>) -> u64 {
    bitfield.num_set_bits() as u64
}

pub fn is_aggregate_valid(sig_bytes: &BlsSignature, msg: &[u8], pks: &[&PublicKey]) -> bool {
    match AggregateSignature::from_bytes(&sig_bytes.signature) {
        Ok(sig) => sig.fast_aggregate_verify(msg, pks),
        Err(_) => false,
    }
}

pub fn verify_sync_committee_signature(
    pks: &[PublicKey],
    attested_header: &BeaconBlockHeader,
    signature: &BlsSignature,
    fork_version: FixedBytes<4>,
    genesis_root: B256,
) -> bool {
    let public_keys: Vec<&PublicKey> = pks.iter().collect();
    let signing_root = compute_committee_sign_root(attested_header, fork_version, genesis_root);
    is_aggregate_valid(signature, signing_root.as_slice(), &public_keys)
}
