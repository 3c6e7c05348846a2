//! Ciphertext handles and the typed wrappers the rest of the code handles.
//!
//! A [`Handle`] is a 32-byte reference into the coprocessor's sealed store.
//! Its last byte is the [`FheType`] tag, so a handle's type is public and
//! checkable without touching the ciphertext.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Encrypted value types. The discriminant is the handle type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FheType {
    Bool = 0,
    Uint64 = 5,
}

impl FheType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(FheType::Bool),
            5 => Some(FheType::Uint64),
            _ => None,
        }
    }
}

/// Opaque reference to a sealed ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle([u8; 32]);

impl Handle {
    /// Build a handle from a digest, overwriting the last byte with the type
    /// tag.
    pub(crate) fn new(mut digest: [u8; 32], fhe_type: FheType) -> Self {
        digest[31] = fhe_type as u8;
        Self(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Type carried in the tag byte, `None` for a forged or corrupted tag.
    pub fn fhe_type(&self) -> Option<FheType> {
        FheType::from_tag(self.0[31])
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(0x{}..)", &hex::encode(&self.0[..6]))
    }
}

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::custom("handle must be 32 bytes"))?;
        Ok(Handle(arr))
    }
}

/// An encrypted unsigned 64-bit integer. The ConfidentialValue of the
/// ledger: balances, frozen amounts, allowances and transfer amounts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Euint64(Handle);

/// An encrypted boolean, produced by comparisons and consumed by `select`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ebool(Handle);

impl Euint64 {
    pub(crate) fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> Handle {
        self.0
    }
}

impl Ebool {
    pub(crate) fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> Handle {
        self.0
    }
}

impl From<Euint64> for Handle {
    fn from(value: Euint64) -> Self {
        value.0
    }
}

impl From<Ebool> for Handle {
    fn from(value: Ebool) -> Self {
        value.0
    }
}

impl fmt::Display for Euint64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "euint64({})", self.0)
    }
}
