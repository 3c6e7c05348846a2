//! # Confidential Values
//!
//! Balances, frozen amounts, allowances and transfer amounts are never held
//! in the clear. Code outside the coprocessor works with opaque handles:
//!
//! - [`Euint64`] / [`Ebool`] — typed handles into the sealed store.
//! - [`FheContext`] — the coprocessor. It evaluates arithmetic, comparison
//!   and `select` on handles and enforces who may decrypt what.
//! - [`clamp`] — the clamping idioms the ledger is built from.
//! - [`Verdict`] — a compliance answer that may itself be encrypted.
//!
//! The coprocessor models a fully homomorphic backend with AES-256-GCM
//! sealing. Everything above this module is written against handles only,
//! so swapping in a real FHE backend is a change to this module alone.

pub mod clamp;
pub mod context;
pub mod handle;
pub mod input;
pub mod verdict;

pub use context::{FheContext, FheError};
pub use handle::{Ebool, Euint64, FheType, Handle};
pub use input::EncryptedInput;
pub use verdict::Verdict;
