//! # Protocol Configuration & Constants
//!
//! Every magic number in SHROUD lives here. If you're hardcoding a constant
//! somewhere else, move it here and give it a name.
//!
//! Most of these values are part of the compliance surface of an issued
//! asset. Changing them after an asset is live changes what its investors
//! agreed to, so treat every edit here as a governance decision.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the protocol primitives.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Protocol fingerprint, mixed into every domain-separation tag below so
/// hashes from one protocol generation never collide with another.
pub const PROTOCOL_FINGERPRINT: &str = "SHROUD-2026";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// AES-256-GCM key length in bytes. Used to seal plaintexts inside the
/// confidential-value coprocessor.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. Twelve, always.
pub const AES_NONCE_LENGTH: usize = 12;

/// Hash output length in bytes. BLAKE3 and SHA-256 both produce 32 bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Domain Separation Tags
// ---------------------------------------------------------------------------
//
// BLAKE3 derive-key contexts. Each context must be globally unique and
// hardcoded; never build one from user input.

/// Context for ciphertext handle derivation.
pub const HANDLE_DOMAIN: &str = "SHROUD-2026 fhe handle v1";

/// Context for deriving the input-proof MAC key from the sealing key.
pub const INPUT_PROOF_DOMAIN: &str = "SHROUD-2026 fhe input proof v1";

/// Context for wallet addresses derived from Ed25519 public keys.
pub const WALLET_ADDRESS_DOMAIN: &str = "SHROUD-2026 wallet address v1";

/// Context for contract addresses derived from a label.
pub const CONTRACT_ADDRESS_DOMAIN: &str = "SHROUD-2026 contract address v1";

/// Context for approval-criteria fingerprints.
pub const CRITERIA_HASH_DOMAIN: &str = "SHROUD-2026 approval criteria v1";

/// Prefix of the SHA-256 preimage for DVA transfer identifiers.
pub const TRANSFER_ID_PREFIX: &[u8] = b"SHROUD-2026/dva/transfer-id";

/// Prefix of the SHA-256 preimage signed by delegated approvers.
pub const DELEGATED_APPROVAL_PREFIX: &[u8] = b"SHROUD-2026/dva/delegated-approval";

// ---------------------------------------------------------------------------
// Compliance Limits
// ---------------------------------------------------------------------------

/// Maximum number of modules a single compliance engine may hold. Every
/// module runs on every transfer, so this is also a bound on the work a
/// single transfer can trigger.
pub const MAX_COMPLIANCE_MODULES: usize = 25;

/// Length of an exchange monthly-limit window: 30 days, in seconds.
pub const EXCHANGE_MONTH_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Maximum number of time-windowed limits configurable per exchange.
pub const MAX_TIME_LIMITS_PER_EXCHANGE: usize = 4;

// ---------------------------------------------------------------------------
// Approval (DVA) Limits
// ---------------------------------------------------------------------------

/// Maximum number of additional approvers in an asset's approval criteria.
pub const MAX_ADDITIONAL_APPROVERS: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_are_distinct() {
        let domains = [
            HANDLE_DOMAIN,
            INPUT_PROOF_DOMAIN,
            WALLET_ADDRESS_DOMAIN,
            CONTRACT_ADDRESS_DOMAIN,
            CRITERIA_HASH_DOMAIN,
        ];
        for (i, a) in domains.iter().enumerate() {
            for b in &domains[i + 1..] {
                assert_ne!(a, b);
            }
            assert!(a.starts_with(PROTOCOL_FINGERPRINT));
        }
        assert_ne!(TRANSFER_ID_PREFIX, DELEGATED_APPROVAL_PREFIX);
    }

    #[test]
    fn month_window_is_thirty_days() {
        assert_eq!(EXCHANGE_MONTH_WINDOW_SECS, 2_592_000);
    }
}
