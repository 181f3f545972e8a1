use alloy::primitives::{FixedBytes, B256};
use serde::{Deserialize, Serialize};

use crate::{
    clock::compute_epoch_at_slot,
    consensus::constants::{StateProofGeometry, ALTAIR_PROOF_GEOMETRY, ELECTRA_PROOF_GEOMETRY},
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub genesis_time: u64,
    pub genesis_root: B256,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Forks {
    pub genesis: Fork,
    pub altair: Fork,
    pub bellatrix: Fork,
    pub capella: Fork,
    pub deneb: Fork,
    pub electra: Fork,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Fork {
    pub epoch: u64,
    pub fork_version: FixedBytes<4>,
}

impl Forks {
    /// Fork version active at `slot`.
    pub fn fork_version(&self, slot: u64) -> FixedBytes<4> {
        let epoch = compute_epoch_at_slot(slot);

        if epoch >= self.electra.epoch {
            self.electra.fork_version
        } else if epoch >= self.deneb.epoch {
            self.deneb.fork_version
        } else if epoch >= self.capella.epoch {
            self.capella.fork_version
        } else if epoch >= self.bellatrix.epoch {
            self.bellatrix.fork_version
        } else if epoch >= self.altair.epoch {
            self.altair.fork_version
        } else {
            self.genesis.fork_version
        }
    }

    /// Shape of the state tree proofs for a state at `slot`.
    pub fn proof_geometry(&self, slot: u64) -> StateProofGeometry {
        if compute_epoch_at_slot(slot) >= self.electra.epoch {
            ELECTRA_PROOF_GEOMETRY
        } else {
            ALTAIR_PROOF_GEOMETRY
        }
    }
}
