use commit_registry_types::{AccountId, Commitment, RegistryInterface, Timepoint};
use thiserror::Error;

use crate::config::DuplicatePolicy;

/// Errors from registry operations. Every variant aborts the call with no state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("caller {caller} may not commit on behalf of {committer}: {reason}")]
    Unauthorized {
        caller: AccountId,
        committer: AccountId,
        reason: AuthFailure,
    },

    #[error("duplicate commitment {commitment} from {committer} under {policy} policy")]
    DuplicateCommitment {
        commitment: Commitment,
        committer: AccountId,
        policy: DuplicatePolicy,
    },

    #[error("invalid extra data: {0}")]
    InvalidExtraData(String),

    #[error("commitment not found: {0}")]
    NotFound(Commitment),

    #[error("ordering clock fault: {0}")]
    ClockRegression(#[from] ClockError),

    #[error("interface not enabled: {0}")]
    InterfaceDisabled(RegistryInterface),

    #[error("snapshot rejected: {0}")]
    InvalidSnapshot(String),
}

/// Internal-consistency faults of the ordering clock.
///
/// These are fatal for the call: the clock never hands out a timepoint that
/// would break monotonicity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("time hint {hint} is {behind} ticks behind last timepoint {last} (max {max_regression})")]
    Regression {
        hint: u64,
        last: Timepoint,
        behind: u64,
        max_regression: u64,
    },

    #[error("tie-break counter exhausted at tick {tick}")]
    TieBreakExhausted { tick: u64 },
}

/// Why an on-behalf-of submission was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("no proof supplied")]
    MissingProof,

    #[error("proof kind does not match the committer's account kind")]
    WrongProofKind,

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("public key does not control the committer account")]
    KeyMismatch,

    #[error("signature verification failed")]
    BadSignature,

    #[error("programmatic account rejected the authorization")]
    Rejected,
}

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
