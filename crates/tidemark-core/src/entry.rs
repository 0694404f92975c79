//! Entry and agent identifiers.

use serde::{Deserialize, Serialize};

/// A 32-byte content-derived entry identifier (Blake3 hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(pub [u8; 32]);

/// A 32-byte agent identifier (Blake3 hash of the agent's name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(pub [u8; 32]);

macro_rules! hex_id {
    ($ty:ident) => {
        impl $ty {
            /// Create an identifier from raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }

            /// XOR distance to another 32-byte identifier.
            pub fn distance(&self, other: &[u8; 32]) -> [u8; 32] {
                let mut out = [0u8; 32];
                for (i, byte) in out.iter_mut().enumerate() {
                    *byte = self.0[i] ^ other[i];
                }
                out
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // Show first 8 hex chars
                write!(f, "{}...", &self.to_hex()[..8])
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> String {
                id.to_hex()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = hex::FromHexError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::from_hex(&s)
            }
        }
    };
}

hex_id!(EntryId);
hex_id!(AgentId);

impl EntryId {
    /// Content-derived identifier for an entry.
    pub fn for_content(content: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"entry:");
        hasher.update(content.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl AgentId {
    /// Identifier for an agent with the given instance name.
    pub fn for_name(name: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"agent:");
        hasher.update(name.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

/// Kind of a source-chain entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// The application definition every chain starts with.
    Dna,
    /// The agent's own identity entry.
    AgentId,
    /// A capability grant made by the agent.
    CapTokenGrant,
    /// Application content.
    App,
    /// A link from one entry to another.
    LinkAdd,
}

impl EntryKind {
    /// System entries are private to the authoring node and never replicated.
    pub fn is_system(&self) -> bool {
        matches!(self, EntryKind::Dna | EntryKind::CapTokenGrant)
    }
}

/// One entry on a node's source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub address: EntryId,
    pub kind: EntryKind,
}

impl ChainEntry {
    pub fn new(address: EntryId, kind: EntryKind) -> Self {
        Self { address, kind }
    }

    pub fn app(address: EntryId) -> Self {
        Self::new(address, EntryKind::App)
    }
}
