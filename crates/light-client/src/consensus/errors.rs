use alloy::primitives::B256;
use thiserror::Error;

/// Coarse classification of a [`ConsensusError`], telling the caller how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any cryptographic work.
    MalformedInput,
    /// Rejected on freshness or period continuity, the caller may retry later.
    StaleOrFutureUpdate,
    /// Merkle or signature verification failed, the source should be downscored.
    InvalidProof,
    /// Not enough signers, not necessarily malicious.
    InsufficientParticipation,
    /// The bootstrap attempt is unusable, pick another checkpoint source.
    BootstrapMismatch,
    /// Driver-level failures that are not about a particular update.
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("invalid merkle branch length: expected {expected}, got {actual}")]
    InvalidBranchLength { expected: usize, actual: usize },
    #[error("update headers are out of order")]
    MalformedHeaderOrder,
    #[error("public key at committee position {0} could not be decoded")]
    InvalidPublicKey(usize),
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("invalid sync committee period")]
    InvalidPeriod,
    #[error("update not relevant")]
    NotRelevant,
    #[error("invalid finality proof")]
    InvalidFinalityProof,
    #[error("invalid next sync committee proof")]
    InvalidNextSyncCommitteeProof,
    #[error("next sync committee does not match the known one")]
    NextSyncCommitteeMismatch,
    #[error("invalid sync committee signature")]
    InvalidSignature,
    #[error("insufficient participation: {0} signers")]
    InsufficientParticipation(u64),
    #[error("invalid header hash found: {actual}, expected: {expected}")]
    InvalidHeaderHash { expected: B256, actual: B256 },
    #[error("invalid current sync committee proof")]
    InvalidCurrentSyncCommitteeProof,
    #[error("checkpoint is too old")]
    CheckpointTooOld,
    #[error("consensus rpc is for the incorrect network")]
    IncorrectRpcNetwork,
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBranchLength { .. }
            | Self::MalformedHeaderOrder
            | Self::InvalidPublicKey(_) => ErrorKind::MalformedInput,
            Self::InvalidTimestamp | Self::InvalidPeriod | Self::NotRelevant => {
                ErrorKind::StaleOrFutureUpdate
            }
            Self::InvalidFinalityProof
            | Self::InvalidNextSyncCommitteeProof
            | Self::NextSyncCommitteeMismatch
            | Self::InvalidSignature => ErrorKind::InvalidProof,
            Self::InsufficientParticipation(_) => ErrorKind::InsufficientParticipation,
            Self::InvalidHeaderHash { .. } | Self::InvalidCurrentSyncCommitteeProof => {
                ErrorKind::BootstrapMismatch
            }
            Self::CheckpointTooOld | Self::IncorrectRpcNetwork => ErrorKind::Environment,
        }
    }
}
