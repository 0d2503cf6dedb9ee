use serde::{Deserialize, Serialize};

use crate::error::TypesError;

const SEAL_DOMAIN: &[u8] = b"commit-registry-seal-v1:";

/// An opaque 32-byte commitment, typically the hash of a secret and an intended action.
///
/// The registry never interprets the bytes; the value is only a lookup key.
/// Serializes as a lowercase hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from hex, with or without a `0x` prefix.
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

    /// Build a commitment over a secret salt and a payload.
    ///
    /// The salt is length-prefixed so `(salt, payload)` splits cannot collide.
    /// This is a client-side helper; the registry accepts any 32-byte value.
    pub fn seal(salt: &[u8], payload: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SEAL_DOMAIN);
        hasher.update(&(salt.len() as u64).to_le_bytes());
        hasher.update(salt);
        hasher.update(payload);
        Self(*hasher.finalize().as_bytes())
    }

    /// Check a revealed `(salt, payload)` pair against this commitment.
    pub fn matches_reveal(&self, salt: &[u8], payload: &[u8]) -> bool {
        Self::seal(salt, payload) == *self
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::str::FromStr for Commitment {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Commitment {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Commitment> for String {
    fn from(c: Commitment) -> Self {
        c.to_hex()
    }
}

impl From<[u8; 32]> for Commitment {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Opaque caller-supplied bytes stored alongside a commitment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtraData(Vec<u8>);

impl ExtraData {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        crate::decode_hex(s).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for ExtraData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ExtraData {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl TryFrom<String> for ExtraData {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ExtraData> for String {
    fn from(d: ExtraData) -> Self {
        d.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_accepts_optional_prefix() {
        let c = Commitment::from_bytes([0xab; 32]);
        assert_eq!(Commitment::from_hex(&c.to_hex()).unwrap(), c);
        assert_eq!(Commitment::from_hex(&format!("0x{}", c.to_hex())).unwrap(), c);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = Commitment::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypesError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
        assert!(matches!(
            Commitment::from_hex("zz"),
            Err(TypesError::InvalidHex(_))
        ));
    }

    #[test]
    fn seal_binds_salt_and_payload() {
        let c = Commitment::seal(b"salt", b"vote:yes");
        assert!(c.matches_reveal(b"salt", b"vote:yes"));
        assert!(!c.matches_reveal(b"salt", b"vote:no"));
        assert!(!c.matches_reveal(b"other", b"vote:yes"));
        // Moving bytes between salt and payload changes the commitment.
        assert_ne!(Commitment::seal(b"sal", b"tvote:yes"), c);
    }

    #[test]
    fn serializes_as_hex_string() {
        let c = Commitment::from_bytes([1u8; 32]);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let restored: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, c);
    }

    #[test]
    fn extra_data_hex() {
        let d = ExtraData::from(vec![0x01, 0xff]);
        assert_eq!(d.to_hex(), "01ff");
        assert_eq!(ExtraData::from_hex("0x01ff").unwrap(), d);
        assert!(ExtraData::empty().is_empty());
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"01ff\"");
    }

    #[test]
    fn display_has_prefix() {
        let c = Commitment::from_bytes([0u8; 32]);
        assert!(format!("{}", c).starts_with("0x00"));
        assert_eq!(c.short_id(), "0000000000000000");
    }
}
