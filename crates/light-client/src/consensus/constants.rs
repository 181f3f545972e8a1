//! Sync protocol constants.
//!
//! Mostly taken from:
//! https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md
//! and the mainnet presets.

/// Number of slots per epoch.
///
/// 2**5 (= 32) slots 6.4 minutes
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Number of epochs a sync committee stays responsible for signing.
///
/// 2**8 (= 256) epochs ~27 hours
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;

/// Seconds per slot.
pub const SECONDS_PER_SLOT: u64 = 12;

/// Slots without finality progress after which the best pending update is force-applied.
/// Also the length of the participant tracking window.
pub const UPDATE_TIMEOUT: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: u64 = 1;

/// How far ahead of the local clock an update's active header may be.
pub const MAX_CLOCK_DISPARITY_SLOTS: u64 = 1;

/// `DOMAIN_SYNC_COMMITTEE`
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

pub const MAX_REQUEST_LIGHT_CLIENT_UPDATES: u8 = 128;

/// Position of a leaf in a fixed-shape state tree.
///
/// `index` is the leaf position at `depth`, i.e. the generalized index with its leading bit
/// removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofGeometry {
    pub depth: usize,
    pub index: u64,
}

impl ProofGeometry {
    pub const fn new(depth: usize, index: u64) -> Self {
        Self { depth, index }
    }

    pub const fn generalized_index(&self) -> u64 {
        (1 << self.depth) + self.index
    }
}

/// Altair through Deneb: `FINALIZED_ROOT_GINDEX` = 105
pub const FINALIZED_ROOT_ALTAIR: ProofGeometry = ProofGeometry::new(6, 41);
/// Altair through Deneb: `CURRENT_SYNC_COMMITTEE_GINDEX` = 54
pub const CURRENT_SYNC_COMMITTEE_ALTAIR: ProofGeometry = ProofGeometry::new(5, 22);
/// Altair through Deneb: `NEXT_SYNC_COMMITTEE_GINDEX` = 55
pub const NEXT_SYNC_COMMITTEE_ALTAIR: ProofGeometry = ProofGeometry::new(5, 23);

/// Electra: `FINALIZED_ROOT_GINDEX_ELECTRA` = 169
pub const FINALIZED_ROOT_ELECTRA: ProofGeometry = ProofGeometry::new(7, 41);
/// Electra: `CURRENT_SYNC_COMMITTEE_GINDEX_ELECTRA` = 86
pub const CURRENT_SYNC_COMMITTEE_ELECTRA: ProofGeometry = ProofGeometry::new(6, 22);
/// Electra: `NEXT_SYNC_COMMITTEE_GINDEX_ELECTRA` = 87
pub const NEXT_SYNC_COMMITTEE_ELECTRA: ProofGeometry = ProofGeometry::new(6, 23);

/// The set of proof geometries valid for a given fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateProofGeometry {
    pub finalized_root: ProofGeometry,
    pub current_sync_committee: ProofGeometry,
    pub next_sync_committee: ProofGeometry,
}

pub const ALTAIR_PROOF_GEOMETRY: StateProofGeometry = StateProofGeometry {
    finalized_root: FINALIZED_ROOT_ALTAIR,
    current_sync_committee: CURRENT_SYNC_COMMITTEE_ALTAIR,
    next_sync_committee: NEXT_SYNC_COMMITTEE_ALTAIR,
};

pub const ELECTRA_PROOF_GEOMETRY: StateProofGeometry = StateProofGeometry {
    finalized_root: FINALIZED_ROOT_ELECTRA,
    current_sync_committee: CURRENT_SYNC_COMMITTEE_ELECTRA,
    next_sync_committee: NEXT_SYNC_COMMITTEE_ELECTRA,
};
