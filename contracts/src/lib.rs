//! # SHROUD Contracts
//!
//! The contract layer of a confidential, compliance-gated asset ledger:
//!
//! - **Token** — [`ConfidentialToken`](token::ConfidentialToken): encrypted
//!   balances, frozen amounts and allowances, with transfer, mint, burn and
//!   freeze primitives that clamp instead of failing.
//! - **Compliance** — [`ComplianceEngine`](compliance::ComplianceEngine): an
//!   ordered set of pluggable modules that authorize or silently zero a
//!   movement without saying why.
//! - **DVA** — [`ApprovalTransferManager`](dva::ApprovalTransferManager):
//!   escrowed transfers that settle only after a quorum of approvers signs
//!   off.
//! - **Events** — the effect records every contract emits.
//!
//! ## Design Principles
//!
//! 1. Amounts are never compared in the clear. A shortfall moves less,
//!    possibly zero, and still succeeds.
//! 2. Public preconditions (paused, frozen address, unverified recipient,
//!    missing role) reject before any state is touched.
//! 3. State transitions are explicit: enum variants, not boolean flags.
//! 4. Every event and every stored record is serializable (serde) for
//!    audit tooling.

pub mod compliance;
pub mod dva;
pub mod events;
pub mod token;

pub use compliance::{ComplianceEngine, ComplianceError, ComplianceModule};
pub use dva::{ApprovalTransferManager, DvaError};
pub use events::{Event, EventLog};
pub use token::{ConfidentialToken, TokenConfig, TokenError, TokenServices};
