use alloy::primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_this_or_that::as_u64;
use ssz_types::{
    typenum::{Unsigned, U48, U512},
    BitVector, FixedVector,
};
use tree_hash_derive::TreeHash;

use crate::utils::{hex_decode, hex_encode};

/// Compressed BLS12-381 public key.
#[derive(Debug, PartialEq, Eq, Clone, TreeHash)]
pub struct PubKey {
    pub inner: FixedVector<u8, U48>,
}

impl Default for PubKey {
    fn default() -> Self {
        Self {
            inner: FixedVector::from_elem(0),
        }
    }
}

impl PubKey {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        FixedVector::new(bytes.to_vec())
            .ok()
            .map(|inner| Self { inner })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner[..]
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        let result = hex_decode(&result).map_err(serde::de::Error::custom)?;
        let len = result.len();
        Self::from_bytes(&result)
            .ok_or_else(|| serde::de::Error::custom(format!("expected 48 byte pubkey, got {len}")))
    }
}

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex_encode(self.as_slice()))
    }
}

/// Compressed BLS12-381 signature.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BlsSignature {
    pub signature: [u8; 96],
}

impl Default for BlsSignature {
    fn default() -> Self {
        Self {
            signature: [0u8; 96],
        }
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let result: String = Deserialize::deserialize(deserializer)?;
        let result = hex_decode(&result).map_err(serde::de::Error::custom)?;
        let signature: [u8; 96] = result.as_slice().try_into().map_err(|_| {
            serde::de::Error::custom(format!("expected 96 byte signature, got {}", result.len()))
        })?;
        Ok(Self { signature })
    }
}

impl Serialize for BlsSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex_encode(self.signature))
    }
}

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#beaconblockheader
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize, TreeHash)]
pub struct BeaconBlockHeader {
    #[serde(deserialize_with = "as_u64")]
    pub slot: u64,
    #[serde(deserialize_with = "as_u64")]
    pub proposer_index: u64,
    pub parent_root: B256,
    pub state_root: B256,
    pub body_root: B256,
}

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/beacon-chain.md#synccommittee
#[derive(Debug, Clone, Serialize, Deserialize, TreeHash)]
#[serde(bound = "N: Unsigned")]
pub struct SyncCommittee<N: Unsigned = U512> {
    pub pubkeys: FixedVector<PubKey, N>,
    pub aggregate_pubkey: PubKey,
}

impl<N: Unsigned> PartialEq for SyncCommittee<N> {
    fn eq(&self, other: &Self) -> bool {
        self.pubkeys == other.pubkeys && self.aggregate_pubkey == other.aggregate_pubkey
    }
}

impl<N: Unsigned> Default for SyncCommittee<N> {
    fn default() -> Self {
        Self {
            pubkeys: FixedVector::from_elem(PubKey::default()),
            aggregate_pubkey: PubKey::default(),
        }
    }
}

impl<N: Unsigned> SyncCommittee<N> {
    pub fn size() -> u64 {
        N::to_u64()
    }
}

/// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/beacon-chain.md#syncaggregate
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct SyncAggregate<N: Unsigned = U512> {
    pub sync_committee_bits: BitVector<N>,
    pub sync_committee_signature: BlsSignature,
}

impl<N: Unsigned> Default for SyncAggregate<N> {
    fn default() -> Self {
        Self {
            sync_committee_bits: BitVector::new(),
            sync_committee_signature: BlsSignature::default(),
        }
    }
}

impl<N: Unsigned> SyncAggregate<N> {
    /// Number of committee members that signed.
    pub fn num_participants(&self) -> u64 {
        self.sync_committee_bits.num_set_bits() as u64
    }
}

/// Light client view of a block header. Execution payload fields are not used by the sync
/// protocol and are skipped when decoding.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct LightClientHeader {
    pub beacon: BeaconBlockHeader,
}

/// `LightClientBootstrap` object for the configured trusted block root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct LightClientBootstrap<N: Unsigned = U512> {
    /// Header matching the requested beacon block root
    pub header: LightClientHeader,
    /// Current sync committee corresponding to `header.beacon.state_root`
    pub current_sync_committee: SyncCommittee<N>,
    pub current_sync_committee_branch: Vec<B256>,
}

/// A sync committee period update as served by `/eth/v1/beacon/light_client/updates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct LightClientUpdate<N: Unsigned = U512> {
    pub attested_header: LightClientHeader,
    pub next_sync_committee: SyncCommittee<N>,
    pub next_sync_committee_branch: Vec<B256>,
    pub finalized_header: LightClientHeader,
    pub finality_branch: Vec<B256>,
    pub sync_aggregate: SyncAggregate<N>,
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct LightClientFinalityUpdate<N: Unsigned = U512> {
    pub attested_header: LightClientHeader,
    pub finalized_header: LightClientHeader,
    pub finality_branch: Vec<B256>,
    pub sync_aggregate: SyncAggregate<N>,
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct LightClientOptimisticUpdate<N: Unsigned = U512> {
    pub attested_header: LightClientHeader,
    pub sync_aggregate: SyncAggregate<N>,
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

/// The header an update asks the client to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveHeader<'a> {
    Attested(&'a BeaconBlockHeader),
    Finalized(&'a BeaconBlockHeader),
}

impl<'a> ActiveHeader<'a> {
    pub fn header(&self) -> &'a BeaconBlockHeader {
        match self {
            Self::Attested(header) | Self::Finalized(header) => header,
        }
    }

    pub fn slot(&self) -> u64 {
        self.header().slot
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized(_))
    }
}

/// Fork agnostic update consumed by the sync protocol.
///
/// Optional parts that are absent on the wire are `None`. A branch may still be present for an
/// absent object, in which case it has to prove the absence by being all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "N: Unsigned")]
pub struct GenericUpdate<N: Unsigned = U512> {
    pub attested_header: BeaconBlockHeader,
    pub sync_aggregate: SyncAggregate<N>,
    pub signature_slot: u64,
    pub next_sync_committee: Option<SyncCommittee<N>>,
    pub next_sync_committee_branch: Option<Vec<B256>>,
    pub finalized_header: Option<BeaconBlockHeader>,
    pub finality_branch: Option<Vec<B256>>,
}

impl<N: Unsigned> GenericUpdate<N> {
    pub fn active_header(&self) -> ActiveHeader<'_> {
        match &self.finalized_header {
            Some(header) => ActiveHeader::Finalized(header),
            None => ActiveHeader::Attested(&self.attested_header),
        }
    }

    pub fn num_participants(&self) -> u64 {
        self.sync_aggregate.num_participants()
    }

    pub fn has_finality(&self) -> bool {
        self.finalized_header.is_some()
    }

    pub fn has_next_sync_committee(&self) -> bool {
        self.next_sync_committee.is_some()
    }
}

pub fn is_zero_branch(branch: &[B256]) -> bool {
    branch.iter().all(|node| node.is_zero())
}

fn finalized_from_wire(header: &LightClientHeader, branch: &[B256]) -> Option<BeaconBlockHeader> {
    let absent = is_zero_branch(branch) && header.beacon == BeaconBlockHeader::default();
    (!absent).then(|| header.beacon.clone())
}

fn committee_from_wire<N: Unsigned>(
    committee: &SyncCommittee<N>,
    branch: &[B256],
) -> Option<SyncCommittee<N>> {
    let absent = is_zero_branch(branch) && *committee == SyncCommittee::default();
    (!absent).then(|| committee.clone())
}

impl<N: Unsigned> From<&LightClientUpdate<N>> for GenericUpdate<N> {
    fn from(update: &LightClientUpdate<N>) -> Self {
        Self {
            attested_header: update.attested_header.beacon.clone(),
            sync_aggregate: update.sync_aggregate.clone(),
            signature_slot: update.signature_slot,
            next_sync_committee: committee_from_wire(
                &update.next_sync_committee,
                &update.next_sync_committee_branch,
            ),
            next_sync_committee_branch: Some(update.next_sync_committee_branch.clone()),
            finalized_header: finalized_from_wire(&update.finalized_header, &update.finality_branch),
            finality_branch: Some(update.finality_branch.clone()),
        }
    }
}

impl<N: Unsigned> From<&LightClientFinalityUpdate<N>> for GenericUpdate<N> {
    fn from(update: &LightClientFinalityUpdate<N>) -> Self {
        Self {
            attested_header: update.attested_header.beacon.clone(),
            sync_aggregate: update.sync_aggregate.clone(),
            signature_slot: update.signature_slot,
            next_sync_committee: None,
            next_sync_committee_branch: None,
            finalized_header: finalized_from_wire(&update.finalized_header, &update.finality_branch),
            finality_branch: Some(update.finality_branch.clone()),
        }
    }
}

impl<N: Unsigned> From<&LightClientOptimisticUpdate<N>> for GenericUpdate<N> {
    fn from(update: &LightClientOptimisticUpdate<N>) -> Self {
        Self {
            attested_header: update.attested_header.beacon.clone(),
            sync_aggregate: update.sync_aggregate.clone(),
            signature_slot: update.signature_slot,
            next_sync_committee: None,
            next_sync_committee_branch: None,
            finalized_header: None,
            finality_branch: None,
        }
    }
}
