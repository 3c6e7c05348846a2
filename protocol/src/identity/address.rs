//! # Addresses
//!
//! Every participant in SHROUD — wallets, tokens, compliance engines,
//! compliance modules, approval managers — is named by a 32-byte
//! [`Address`]:
//!
//! ```text
//! wallet:   BLAKE3-derive-key(WALLET_ADDRESS_DOMAIN,   ed25519 public key)
//! contract: BLAKE3-derive-key(CONTRACT_ADDRESS_DOMAIN, label)
//! ```
//!
//! The all-zero address is the null address. Mint and burn use it as the
//! counterparty, and every entry point that takes a counterparty rejects it.
//!
//! Addresses serialize as `0x`-prefixed lowercase hex.

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{CONTRACT_ADDRESS_DOMAIN, WALLET_ADDRESS_DOMAIN};
use crate::crypto::hash::tagged_hash;
use crate::crypto::keys::PublicKey;

/// Errors that can occur while parsing an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid address length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte public address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 32]);

impl Address {
    /// The null address.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `true` for the null address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Address of the wallet controlling `public_key`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(tagged_hash(WALLET_ADDRESS_DOMAIN, &[public_key.as_bytes()]))
    }

    /// Deterministic contract address for a label, e.g. `"token/ACME"`.
    /// Also handy for naming scripted participants in the CLI harness.
    pub fn derive(label: &str) -> Self {
        Self(tagged_hash(CONTRACT_ADDRESS_DOMAIN, &[label.as_bytes()]))
    }

    /// A random address from the OS CSPRNG, for contracts created without a
    /// meaningful label.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(f, "Address(0x{}..{})", &hex[..8], &hex[56..])
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::derive("alice").is_zero());
    }

    #[test]
    fn derive_is_deterministic_and_label_sensitive() {
        assert_eq!(Address::derive("alice"), Address::derive("alice"));
        assert_ne!(Address::derive("alice"), Address::derive("bob"));
    }

    #[test]
    fn wallet_and_contract_domains_differ() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let wallet = Address::from_public_key(&kp.public_key());
        let contract = Address(tagged_hash(
            CONTRACT_ADDRESS_DOMAIN,
            &[kp.public_key().as_bytes()],
        ));
        assert_ne!(wallet, contract);
    }

    #[test]
    fn hex_roundtrip_with_and_without_prefix() {
        let addr = Address::derive("token/ACME");
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
        assert_eq!(Address::from_hex(&addr.to_hex()[2..]).unwrap(), addr);
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(
            Address::from_hex("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
        assert_eq!(
            Address::from_hex("0xabcd"),
            Err(AddressError::InvalidLength(2))
        );
    }

    #[test]
    fn serde_uses_hex_strings() {
        let addr = Address::derive("alice");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
