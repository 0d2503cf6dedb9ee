use serde::{Deserialize, Serialize};

use crate::error::TypesError;

const ACCOUNT_DOMAIN: &[u8] = b"commit-registry-account-v1:";

/// Principal identity on whose behalf a commitment is made.
///
/// Simple accounts derive their identity from an Ed25519 public key, so a
/// signature proof can be checked against the identity without a directory.
/// Programmatic accounts use any 32-byte identifier the host assigns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the account identity controlled by an Ed25519 public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ACCOUNT_DOMAIN);
        hasher.update(public_key);
        Self(*hasher.finalize().as_bytes())
    }

    /// Check whether `public_key` controls this account.
    pub fn is_controlled_by(&self, public_key: &[u8; 32]) -> bool {
        Self::from_public_key(public_key) == *self
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        crate::decode_fixed::<32>(s).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short display form (first 8 bytes hex).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "acct:{}", self.short_id())
    }
}

impl std::str::FromStr for AccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_hex()
    }
}
