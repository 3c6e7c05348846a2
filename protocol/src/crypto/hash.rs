//! # Hashing Utilities
//!
//! Two hash functions, each with a job:
//!
//! - **BLAKE3** — everything internal: ciphertext handles, addresses,
//!   approval-criteria fingerprints. Used in derive-key mode so every use
//!   site gets its own domain and digests from different contexts can never
//!   be confused for one another.
//!
//! - **SHA-256** — anything an external party has to recompute with
//!   off-the-shelf tooling: DVA transfer identifiers and the digest that
//!   delegated approvers sign.

use sha2::{Digest, Sha256};

use crate::config::HASH_OUTPUT_LENGTH;

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use shroud_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"SHROUD protocol");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated BLAKE3 digest over several byte strings.
///
/// Uses BLAKE3's derive-key mode with `domain` as the context string. Each
/// part is length-prefixed (u64, little endian) so that `["ab", "c"]` and
/// `["a", "bc"]` never hash to the same digest.
///
/// `domain` must be a hardcoded constant from [`crate::config`].
pub fn tagged_hash(domain: &str, parts: &[&[u8]]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = blake3::Hasher::new_derive_key(domain);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute the SHA-256 hash of the input data as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// SHA-256 over the concatenation of `parts`.
///
/// Unlike [`tagged_hash`] this does not length-prefix; callers must only
/// pass fixed-width fields (addresses, handles, big-endian integers) after a
/// constant prefix.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}
