//! # Identity Module
//!
//! Who is who, and who may do what.
//!
//! 1. **Address** — 32-byte names for wallets and contracts.
//! 2. **Oracles** — the read-only [`IdentityOracle`] and [`AgentRoles`]
//!    traits the ledger consults. SHROUD never writes to them.
//! 3. **Registries** — in-memory implementations of both traits for tests
//!    and the scenario harness.

pub mod address;
pub mod oracle;
pub mod registry;

pub use address::{Address, AddressError};
pub use oracle::{AgentRoles, IdentityId, IdentityOracle};
pub use registry::{AgentRegistry, IdentityRegistry};
