//! Core type definitions for the commitment registry.
//!
//! This crate holds the shared value types: commitments, account identities,
//! timepoints, records, events and interface identifiers. No registry logic.

pub mod account;
pub mod commitment;
pub mod error;
pub mod interface;
pub mod record;
pub mod timepoint;

pub use account::AccountId;
pub use commitment::{Commitment, ExtraData};
pub use error::TypesError;
pub use interface::{InterfaceId, RegistryInterface};
pub use record::{CommitEvent, CommitmentRecord};
pub use timepoint::Timepoint;

/// Decode a hex string into a fixed-size array, accepting an optional `0x` prefix.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypesError> {
    let bytes = decode_hex(s)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| TypesError::InvalidLength { expected: N, actual })
}

pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>, TypesError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(trimmed).map_err(|e| TypesError::InvalidHex(e.to_string()))
}
