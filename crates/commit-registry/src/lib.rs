//! Commitment Registry: ordered, authorized acceptance of commit-reveal commitments.
//!
//! Callers submit opaque 32-byte commitments. The registry assigns each an
//! ordering timepoint, optionally checks that a third-party submitter is
//! authorized by the committer, stores the record and notifies observers.
//! Revealing a commitment is up to the caller's own protocol; the registry only
//! exposes `remove` so the reveal path can retire consumed commitments.
//!
//! ## Invariants
//!
//! - **Monotonic ordering**: timepoints never decrease; in strict mode they
//!   strictly increase even when the host time hint repeats.
//! - **Immutable records**: a stored record is never modified, only removed whole.
//! - **Explicit duplicate policy**: store-wide or per-committer uniqueness, chosen
//!   by configuration.
//! - **Fail-closed authorization**: on-behalf-of submissions need a valid proof.
//! - **All-or-nothing calls**: a failed call stores nothing and publishes nothing.
//!
//! ## Call flow
//!
//! 1. **Validate** extra data
//! 2. **Authorize** through the [`AuthorizationGate`] when the caller is not the committer
//! 3. **Record** in the [`CommitmentStore`], which takes a timepoint from the [`OrderingClock`]
//! 4. **Publish** a [`CommitEvent`] to every attached [`EventEmitter`]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod mocks;
pub mod registry;
pub mod store;

pub use auth::{
    AccountKind, AccountVerifier, AuthorizationGate, AuthorizationProof, AuthorizationRequest,
    ProgrammaticAccount,
};
pub use clock::{ClockState, OrderingClock};
pub use config::{DuplicatePolicy, InterfaceConfig, MissingRemoval, OrderingMode, RegistryConfig};
pub use error::{AuthFailure, ClockError, ConfigError, RegistryError, RegistryResult};
pub use events::{EventEmitter, EventFilter, EventJournal, EventRouter, SubscriptionId};
pub use mocks::MockProgrammaticAccount;
pub use registry::{CallContext, CommitmentRegistry, RegistrySnapshot};
pub use store::{CommitmentStore, RecordFilter, RetiredKey, StorePolicy, StoreSnapshot};

pub use commit_registry_types::{
    AccountId, CommitEvent, Commitment, CommitmentRecord, ExtraData, InterfaceId,
    RegistryInterface, Timepoint, TypesError,
};
pub use ed25519_dalek::SigningKey;
