//! # Cryptographic Primitives for SHROUD
//!
//! Boring, well-audited building blocks:
//!
//! - **AES-256-GCM** seals every plaintext held by the confidential-value
//!   coprocessor.
//! - **BLAKE3** derives handles, addresses and criteria fingerprints.
//! - **SHA-256** derives externally recomputable identifiers.
//! - **Ed25519** verifies delegated approvals.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations. We don't roll our own.

pub mod encryption;
pub mod hash;
pub mod keys;

pub use encryption::{open, seal};
pub use hash::{blake3_hash, sha256, sha256_concat, tagged_hash};
pub use keys::{Keypair, PublicKey, Signature};
