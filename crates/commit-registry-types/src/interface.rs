use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Four-byte identifier of a capability interface, used for introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceId([u8; 4]);

impl InterfaceId {
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Derive an identifier from a canonical signature: the first four bytes of
    /// its BLAKE3 hash. Signatures of several operations are joined with `;`.
    pub fn derive(signature: &str) -> Self {
        let hash = blake3::hash(signature.as_bytes());
        let mut id = [0u8; 4];
        id.copy_from_slice(&hash.as_bytes()[..4]);
        Self(id)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        crate::decode_fixed::<4>(s).map(Self)
    }
}

impl std::fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl TryFrom<String> for InterfaceId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<InterfaceId> for String {
    fn from(id: InterfaceId) -> Self {
        id.to_string()
    }
}

/// The interfaces a registry can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryInterface {
    /// `supportsInterface(bytes4)`; always available.
    Introspection,
    /// `commit(bytes32)`.
    Minimal,
    /// `commitFrom(address,bytes32,bytes)` plus the commit event.
    General,
}

impl RegistryInterface {
    pub const ALL: [RegistryInterface; 3] = [
        RegistryInterface::Introspection,
        RegistryInterface::Minimal,
        RegistryInterface::General,
    ];

    /// Canonical signature the identifier is derived from.
    pub fn signature(&self) -> &'static str {
        match self {
            RegistryInterface::Introspection => "supportsInterface(bytes4)",
            RegistryInterface::Minimal => "commit(bytes32)",
            RegistryInterface::General => {
                "commitFrom(address,bytes32,bytes);Commit(uint256,address,bytes32,bytes)"
            }
        }
    }

    pub fn id(&self) -> InterfaceId {
        InterfaceId::derive(self.signature())
    }

    /// Resolve an identifier back to a known interface.
    pub fn from_id(id: &InterfaceId) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.id() == *id)
    }
}

impl std::fmt::Display for RegistryInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegistryInterface::Introspection => "introspection",
            RegistryInterface::Minimal => "minimal",
            RegistryInterface::General => "general",
        };
        f.write_str(name)
    }
}
