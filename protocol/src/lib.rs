// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SHROUD Protocol — Core Library
//!
//! The primitives every SHROUD contract is written against: confidential
//! values that never appear in the clear, the identity collaborators a
//! regulated asset has to consult, and the boring cryptography underneath.
//!
//! ## Architecture
//!
//! - **fhe** — Encrypted values, the coprocessor that computes on them, and
//!   the clamped arithmetic the ledger is built from.
//! - **identity** — Addresses, the identity oracle and agent roles.
//! - **crypto** — AES-256-GCM, BLAKE3, SHA-256 and Ed25519. Don't roll your own.
//! - **clock** — Injected time, so limit windows are testable.
//! - **config** — Protocol constants and domain-separation tags.
//!
//! ## Design Philosophy
//!
//! 1. An encrypted amount is never compared in the clear. Clamp, don't reject.
//! 2. Public state (who, where, whether paused) may fail fast. Private state
//!    (how much) may not.
//! 3. If it touches money, it has tests. Plural.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod fhe;
pub mod identity;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fhe::{Ebool, EncryptedInput, Euint64, FheContext, FheError, Verdict};
pub use identity::{Address, AgentRoles, IdentityId, IdentityOracle};
