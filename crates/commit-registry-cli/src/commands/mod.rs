//! CLI command implementations

pub mod keys;
pub mod registry;

use commit_registry::{ExtraData, TypesError};

use crate::error::{CliError, CliResult};

/// clap value parser for hex-encoded extra data.
pub(crate) fn parse_extra(s: &str) -> Result<ExtraData, TypesError> {
    ExtraData::from_hex(s)
}

/// Decode hex (optional `0x` prefix) into exactly `N` bytes.
pub(crate) fn decode_array<const N: usize>(what: &str, s: &str) -> CliResult<[u8; N]> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| CliError::InvalidArgument(format!("{what}: {e}")))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| {
        CliError::InvalidArgument(format!("{what}: expected {N} bytes, got {actual}"))
    })
}
