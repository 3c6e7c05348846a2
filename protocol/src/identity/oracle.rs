//! Read-only collaborators the ledger consults for identity and roles.
//!
//! Neither trait is ever mutated by the ledger, the compliance engine or the
//! approval manager. They answer questions; someone else (an identity
//! registry operator, a token owner) decides the answers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;

/// The on-chain identity behind one or more wallets. Several wallets of the
/// same investor share an `IdentityId`, which is what per-investor limits
/// are keyed on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub Address);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity:{}", self.0)
    }
}

impl fmt::Debug for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityId({:?})", self.0)
    }
}

/// Answers "is this wallet verified for this asset", plus the two identity
/// attributes compliance modules key on.
pub trait IdentityOracle: Send + Sync {
    /// `true` if `wallet` holds a verified identity for `asset`.
    fn is_verified(&self, asset: Address, wallet: Address) -> bool;

    /// The identity `wallet` is registered under, if any.
    fn identity_of(&self, wallet: Address) -> Option<IdentityId>;

    /// ISO-3166 numeric country code of the investor behind `wallet`.
    fn investor_country(&self, wallet: Address) -> Option<u16>;
}

/// Answers "may this account act as an agent of this asset".
pub trait AgentRoles: Send + Sync {
    fn has_agent_role(&self, asset: Address, account: Address) -> bool;
}
