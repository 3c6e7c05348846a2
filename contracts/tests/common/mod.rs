//! Shared setup for the contract integration tests: one token wired to
//! in-memory identity, agent and clock collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use shroud_contracts::compliance::{ComplianceModule, ModuleCall};
use shroud_contracts::{ComplianceEngine, ConfidentialToken, TokenConfig, TokenServices};
use shroud_protocol::clock::ManualClock;
use shroud_protocol::fhe::{EncryptedInput, Euint64, FheContext};
use shroud_protocol::identity::{AgentRegistry, Address, IdentityRegistry};

pub const FRANCE: u16 = 250;
pub const USA: u16 = 840;

pub struct Ledger {
    pub token: ConfidentialToken,
    pub fhe: Arc<FheContext>,
    pub identity: Arc<IdentityRegistry>,
    pub agents: Arc<AgentRegistry>,
    pub clock: Arc<ManualClock>,
    pub owner: Address,
    pub agent: Address,
}

impl Ledger {
    pub fn new() -> Self {
        let fhe = Arc::new(FheContext::new());
        let identity = Arc::new(IdentityRegistry::new());
        let agents = Arc::new(AgentRegistry::new());
        let clock = Arc::new(ManualClock::default());
        let owner = Address::derive("issuer");
        let agent = Address::derive("transfer-agent");

        let config = TokenConfig {
            name: "Acme Preferred".into(),
            symbol: "ACME".into(),
            decimals: 6,
            owner,
        };
        agents.add_agent(config.address(), agent);
        let compliance =
            ComplianceEngine::new(Address::derive("compliance/ACME"), owner, Arc::clone(&fhe));
        let services = TokenServices {
            fhe: Arc::clone(&fhe),
            identity: identity.clone(),
            agents: agents.clone(),
            clock: clock.clone(),
        };
        let token = ConfidentialToken::new(config, services, compliance).unwrap();

        Self {
            token,
            fhe,
            identity,
            agents,
            clock,
            owner,
            agent,
        }
    }

    /// A wallet verified for the token, resident in France.
    pub fn holder(&self, label: &str) -> Address {
        self.holder_in(label, FRANCE)
    }

    pub fn holder_in(&self, label: &str, country: u16) -> Address {
        let wallet = Address::derive(label);
        self.identity.enroll(self.token.address(), wallet, country);
        wallet
    }

    /// A verified encrypted amount usable by `account`.
    pub fn amount(&self, account: Address, v: u64) -> Euint64 {
        let input = self.input(account, v);
        self.fhe.verify_input(&input, account).unwrap()
    }

    pub fn input(&self, account: Address, v: u64) -> EncryptedInput {
        self.fhe.encrypt_input(v, account).unwrap()
    }

    /// Mint as the agent; returns what was actually minted.
    pub fn mint(&mut self, to: Address, v: u64) -> u64 {
        let amount = self.amount(self.agent, v);
        let minted = self.token.mint(self.agent, to, amount).unwrap();
        self.read(minted, self.agent)
    }

    /// Transfer as `from`; returns what actually moved.
    pub fn transfer(&mut self, from: Address, to: Address, v: u64) -> u64 {
        let amount = self.amount(from, v);
        let moved = self.token.transfer(from, to, amount).unwrap();
        self.read(moved, from)
    }

    pub fn balance(&self, account: Address) -> u64 {
        let b = self.token.balance_of(account).unwrap();
        self.read(b, account)
    }

    pub fn frozen(&self, account: Address) -> u64 {
        let f = self.token.frozen_tokens(account).unwrap();
        self.read(f, account)
    }

    pub fn read(&self, v: Euint64, account: Address) -> u64 {
        self.fhe.decrypt(v, account).unwrap()
    }

    pub fn add_module(&mut self, module: Box<dyn ComplianceModule>) {
        self.token
            .compliance_mut()
            .add_module(self.owner, module)
            .unwrap();
    }

    pub fn call_module(&mut self, module: Address, call: ModuleCall) {
        self.token
            .compliance_mut()
            .call_module_function(self.owner, module, call)
            .unwrap();
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }
}
