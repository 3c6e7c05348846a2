//! Clamped arithmetic on confidential values.
//!
//! The ledger never rejects a transfer because an encrypted amount is too
//! large: doing so would leak the comparison. Instead every amount is clamped
//! to what the sender can actually move, and an amount that fails a check
//! becomes an encrypted zero. These helpers name the handful of shapes that
//! clamping takes so token and module code reads as intent, not as a soup of
//! `select` calls.

use super::context::{FheContext, FheError};
use super::handle::{Ebool, Euint64};

/// A fresh encrypted zero.
pub fn zero(fhe: &FheContext) -> Result<Euint64, FheError> {
    fhe.trivial_encrypt(0)
}

/// `min(a, b)` under encryption.
pub fn min(fhe: &FheContext, a: Euint64, b: Euint64) -> Result<Euint64, FheError> {
    let a_smaller = fhe.le(a, b)?;
    fhe.select(a_smaller, a, b)
}

/// What a holder may move: `balance - frozen`, floored at zero.
pub fn available(fhe: &FheContext, balance: Euint64, frozen: Euint64) -> Result<Euint64, FheError> {
    fhe.sub(balance, frozen)
}

/// `base + amount <= limit`. The addition saturates, so an overflowing
/// `base + amount` compares as `u64::MAX` and still fails any smaller limit.
pub fn fits_within(
    fhe: &FheContext,
    base: Euint64,
    amount: Euint64,
    limit: Euint64,
) -> Result<Ebool, FheError> {
    let total = fhe.add(base, amount)?;
    fhe.le(total, limit)
}

/// `cond ? amount : 0`.
pub fn gate(fhe: &FheContext, cond: Ebool, amount: Euint64) -> Result<Euint64, FheError> {
    let zero = zero(fhe)?;
    fhe.select(cond, amount, zero)
}

/// How far `amount` exceeds `available`, zero if it does not.
pub fn shortfall(
    fhe: &FheContext,
    amount: Euint64,
    available: Euint64,
) -> Result<Euint64, FheError> {
    fhe.sub(amount, available)
}
