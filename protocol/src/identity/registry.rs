//! In-memory reference implementations of [`IdentityOracle`] and
//! [`AgentRoles`].
//!
//! The production identity stack (claim issuers, claim topics, on-chain
//! identity contracts) lives outside SHROUD. These registries hold the
//! *outcome* of that stack — who is verified for what — and are what the
//! test-suites and the CLI harness plug into a token.
//!
//! Both are `Send + Sync` and use interior mutability, so one `Arc` can be
//! shared with every token while the operator keeps updating it.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use super::address::Address;
use super::oracle::{AgentRoles, IdentityId, IdentityOracle};

#[derive(Debug, Clone, Copy)]
struct Registration {
    identity: IdentityId,
    country: u16,
}

#[derive(Debug, Default)]
struct RegistryState {
    wallets: HashMap<Address, Registration>,
    verified: HashSet<(Address, Address)>,
}

/// Wallet → identity registrations plus per-asset verification status.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    state: RwLock<RegistryState>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `wallet` under `identity` with an investor country. Replaces
    /// any previous registration of the wallet.
    pub fn register(&self, wallet: Address, identity: IdentityId, country: u16) {
        self.state
            .write()
            .wallets
            .insert(wallet, Registration { identity, country });
    }

    /// Mark a registered wallet as verified for `asset`. Returns `false`
    /// (and changes nothing) if the wallet has no registration.
    pub fn verify(&self, asset: Address, wallet: Address) -> bool {
        let mut state = self.state.write();
        if !state.wallets.contains_key(&wallet) {
            return false;
        }
        state.verified.insert((asset, wallet));
        true
    }

    /// Revoke the verification of `wallet` for `asset`.
    pub fn revoke(&self, asset: Address, wallet: Address) {
        self.state.write().verified.remove(&(asset, wallet));
    }

    /// Delete a wallet's registration along with every verification it had.
    pub fn remove(&self, wallet: Address) {
        let mut state = self.state.write();
        state.wallets.remove(&wallet);
        state.verified.retain(|(_, w)| *w != wallet);
    }

    /// Register `wallet` as its own identity and verify it for `asset`.
    /// Shorthand for the common one-wallet-per-investor case.
    pub fn enroll(&self, asset: Address, wallet: Address, country: u16) {
        self.register(wallet, IdentityId(wallet), country);
        self.verify(asset, wallet);
    }
}

impl IdentityOracle for IdentityRegistry {
    fn is_verified(&self, asset: Address, wallet: Address) -> bool {
        self.state.read().verified.contains(&(asset, wallet))
    }

    fn identity_of(&self, wallet: Address) -> Option<IdentityId> {
        self.state.read().wallets.get(&wallet).map(|r| r.identity)
    }

    fn investor_country(&self, wallet: Address) -> Option<u16> {
        self.state.read().wallets.get(&wallet).map(|r| r.country)
    }
}

/// Per-asset agent assignments.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashSet<(Address, Address)>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agent(&self, asset: Address, account: Address) {
        self.agents.write().insert((asset, account));
    }

    pub fn remove_agent(&self, asset: Address, account: Address) {
        self.agents.write().remove(&(asset, account));
    }
}

impl AgentRoles for AgentRegistry {
    fn has_agent_role(&self, asset: Address, account: Address) -> bool {
        self.agents.read().contains(&(asset, account))
    }
}
