//! Integration tests for confidential values.
//!
//! These exercise the coprocessor the way the ledger does: wallets submit
//! encrypted inputs, contracts clamp amounts without ever seeing them, and
//! only accounts on a handle's access list can read the result.

use shroud_protocol::fhe::{clamp, FheContext, FheError, Verdict};
use shroud_protocol::identity::Address;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn alice() -> Address {
    Address::derive("wallet/alice")
}

fn bob() -> Address {
    Address::derive("wallet/bob")
}

// ---------------------------------------------------------------------------
// Clamped transfer
// ---------------------------------------------------------------------------

#[test]
fn over_balance_transfer_moves_only_what_is_free() {
    let fhe = FheContext::new();

    let balance = fhe.trivial_encrypt(100).unwrap();
    let frozen = fhe.trivial_encrypt(40).unwrap();
    let request = fhe.encrypt_input(500, alice()).unwrap();
    let amount = fhe.verify_input(&request, alice()).unwrap();

    let free = clamp::available(&fhe, balance, frozen).unwrap();
    let actual = clamp::min(&fhe, amount, free).unwrap();
    let new_balance = fhe.sub(balance, actual).unwrap();

    fhe.allow(actual, alice()).unwrap();
    fhe.allow(new_balance, alice()).unwrap();
    assert_eq!(fhe.decrypt(actual, alice()).unwrap(), 60);
    assert_eq!(fhe.decrypt(new_balance, alice()).unwrap(), 40);
}

#[test]
fn denied_verdict_moves_nothing() {
    let fhe = FheContext::new();
    let amount = fhe.trivial_encrypt(10).unwrap();

    let limit = fhe.trivial_encrypt(5).unwrap();
    let used = fhe.trivial_encrypt(0).unwrap();
    let within = clamp::fits_within(&fhe, used, amount, limit).unwrap();

    let verdict = Verdict::ALLOW.and(within.into(), &fhe).unwrap();
    let actual = verdict.apply(&fhe, amount).unwrap();
    fhe.allow(actual, bob()).unwrap();
    assert_eq!(fhe.decrypt(actual, bob()).unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[test]
fn stolen_input_cannot_be_replayed() {
    let fhe = FheContext::new();
    let input = fhe.encrypt_input(7, alice()).unwrap();

    let err = fhe.verify_input(&input, bob()).unwrap_err();
    assert!(matches!(err, FheError::InvalidInputProof(_)));
}

#[test]
fn only_granted_accounts_decrypt() {
    let fhe = FheContext::new();
    let input = fhe.encrypt_input(7, alice()).unwrap();
    let amount = fhe.verify_input(&input, alice()).unwrap();

    assert!(fhe.decrypt(amount, bob()).is_err());
    fhe.allow(amount, bob()).unwrap();
    assert_eq!(fhe.decrypt(amount, bob()).unwrap(), 7);
}
