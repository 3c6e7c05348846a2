//! # Confidential Token
//!
//! A permissioned token whose balances, frozen amounts and allowances are
//! encrypted. Every holder `h` carries:
//!
//! ```text
//! balance[h]  : euint64
//! frozen[h]   : euint64      invariant: frozen[h] <= balance[h]
//! is_frozen[h]: bool         address-level freeze, public
//! allowance[(owner, spender)]: euint64
//! ```
//!
//! ## Rejections versus clamps
//!
//! A call is *rejected* only for something anyone could have checked
//! beforehand: the token is paused, an address is frozen, a recipient is not
//! verified, the caller lacks a role, an encrypted argument is not the
//! caller's to use. Everything that depends on an amount is *clamped*: the
//! operation moves the largest amount it can, possibly zero, succeeds, and
//! emits the same records either way.
//!
//! ## Access to handles
//!
//! After each operation the token grants decryption rights on the new
//! values: a holder can read their own balance and frozen amount; both
//! parties (and the spender, for `transfer_from`) can read the amount that
//! actually moved.

// Build a `TokenEnv` borrowing only the token's collaborator fields, so the
// compliance engine and the balance maps stay independently borrowable.
macro_rules! token_env {
    ($token:expr) => {
        $crate::compliance::TokenEnv {
            token: $token.address,
            identity: &*$token.identity,
            agents: &*$token.agents,
            now: $token.clock.now(),
            total_supply: $token.total_supply,
        }
    };
}

mod supply;
mod transfer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use shroud_protocol::clock::Clock;
use shroud_protocol::fhe::{Euint64, FheContext, FheError, Handle};
use shroud_protocol::identity::{Address, AgentRoles, IdentityOracle};

use crate::compliance::{ComplianceEngine, ComplianceError};
use crate::events::{Event, EventLog};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token operations. None of them is ever
/// caused by an amount.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is paused")]
    Paused,

    #[error("token is not paused")]
    NotPaused,

    #[error("address {0} is frozen")]
    AddressFrozen(Address),

    #[error("identity of {0} is not verified for this token")]
    UnverifiedIdentity(Address),

    #[error("{0} is not an agent of this token")]
    NotAgent(Address),

    #[error("{0} is not the owner of this token")]
    NotOwner(Address),

    #[error("zero address")]
    ZeroAddress,

    /// An encrypted argument is not on the caller's access list.
    #[error("caller {account} may not use handle {handle}")]
    HandleNotAllowed { handle: Handle, account: Address },

    #[error(transparent)]
    Fhe(#[from] FheError),

    #[error(transparent)]
    Compliance(#[from] ComplianceError),
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Public token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
}

impl TokenConfig {
    /// Deterministic token address, derived from the symbol.
    pub fn address(&self) -> Address {
        Address::derive(&format!("token/{}", self.symbol))
    }
}

/// Collaborators a token consults. All of them are shared.
#[derive(Clone)]
pub struct TokenServices {
    pub fhe: Arc<FheContext>,
    pub identity: Arc<dyn IdentityOracle>,
    pub agents: Arc<dyn AgentRoles>,
    pub clock: Arc<dyn Clock>,
}

/// The confidential token.
pub struct ConfidentialToken {
    address: Address,
    owner: Address,
    name: String,
    symbol: String,
    decimals: u8,
    paused: bool,
    total_supply: Euint64,
    balances: HashMap<Address, Euint64>,
    frozen_tokens: HashMap<Address, Euint64>,
    frozen_addresses: HashSet<Address>,
    allowances: HashMap<(Address, Address), Euint64>,
    compliance: ComplianceEngine,
    fhe: Arc<FheContext>,
    identity: Arc<dyn IdentityOracle>,
    agents: Arc<dyn AgentRoles>,
    clock: Arc<dyn Clock>,
    events: EventLog,
}

impl ConfidentialToken {
    /// Create a token and bind `compliance` to it.
    ///
    /// # Errors
    ///
    /// Fails if `compliance` is already bound to another token.
    pub fn new(
        config: TokenConfig,
        services: TokenServices,
        mut compliance: ComplianceEngine,
    ) -> Result<Self, TokenError> {
        let address = config.address();
        compliance.bind_token(address, address)?;
        let total_supply = services.fhe.trivial_encrypt(0)?;
        services.fhe.allow(total_supply, config.owner)?;

        let mut events = EventLog::new();
        events.emit(Event::ComplianceAdded {
            token: address,
            compliance: compliance.address(),
        });
        info!(token = %address, symbol = %config.symbol, "token created");

        Ok(Self {
            address,
            owner: config.owner,
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            paused: false,
            total_supply,
            balances: HashMap::new(),
            frozen_tokens: HashMap::new(),
            frozen_addresses: HashSet::new(),
            allowances: HashMap::new(),
            compliance,
            fhe: services.fhe,
            identity: services.identity,
            agents: services.agents,
            clock: services.clock,
            events,
        })
    }

    // -----------------------------------------------------------------------
    // Plaintext controls
    // -----------------------------------------------------------------------

    pub fn pause(&mut self, agent: Address) -> Result<(), TokenError> {
        self.require_agent(agent)?;
        if self.paused {
            return Err(TokenError::Paused);
        }
        self.paused = true;
        info!(token = %self.address, %agent, "token paused");
        self.events.emit(Event::Paused { agent });
        Ok(())
    }

    pub fn unpause(&mut self, agent: Address) -> Result<(), TokenError> {
        self.require_agent(agent)?;
        if !self.paused {
            return Err(TokenError::NotPaused);
        }
        self.paused = false;
        info!(token = %self.address, %agent, "token unpaused");
        self.events.emit(Event::Unpaused { agent });
        Ok(())
    }

    /// Freeze or unfreeze an address. A frozen address can neither send nor
    /// receive through ordinary transfers.
    pub fn set_address_frozen(
        &mut self,
        agent: Address,
        account: Address,
        frozen: bool,
    ) -> Result<(), TokenError> {
        self.require_agent(agent)?;
        if account.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if frozen {
            self.frozen_addresses.insert(account);
        } else {
            self.frozen_addresses.remove(&account);
        }
        self.events.emit(Event::AddressFrozen {
            account,
            frozen,
            agent,
        });
        Ok(())
    }

    /// Swap the compliance engine, returning the old one unbound.
    pub fn set_compliance(
        &mut self,
        caller: Address,
        mut compliance: ComplianceEngine,
    ) -> Result<ComplianceEngine, TokenError> {
        if caller != self.owner {
            return Err(TokenError::NotOwner(caller));
        }
        compliance.bind_token(self.address, self.address)?;
        let mut old = std::mem::replace(&mut self.compliance, compliance);
        old.unbind_token(self.address, self.address)?;

        info!(token = %self.address, compliance = %self.compliance.address(), "compliance replaced");
        self.events.emit(Event::ComplianceAdded {
            token: self.address,
            compliance: self.compliance.address(),
        });
        Ok(old)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_frozen(&self, account: Address) -> bool {
        self.frozen_addresses.contains(&account)
    }

    /// Encrypted balance of `account`. Accounts that never held anything get
    /// a fresh encrypted zero they can decrypt.
    pub fn balance_of(&self, account: Address) -> Result<Euint64, TokenError> {
        Self::stored_or_zero(&self.fhe, &self.balances, account)
    }

    pub fn frozen_tokens(&self, account: Address) -> Result<Euint64, TokenError> {
        Self::stored_or_zero(&self.fhe, &self.frozen_tokens, account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Result<Euint64, TokenError> {
        match self.allowances.get(&(owner, spender)) {
            Some(&v) => Ok(v),
            None => {
                let zero = self.fhe.trivial_encrypt(0)?;
                self.fhe.allow(zero, owner)?;
                self.fhe.allow(zero, spender)?;
                Ok(zero)
            }
        }
    }

    pub fn total_supply(&self) -> Euint64 {
        self.total_supply
    }

    pub fn compliance(&self) -> &ComplianceEngine {
        &self.compliance
    }

    pub fn compliance_mut(&mut self) -> &mut ComplianceEngine {
        &mut self.compliance
    }

    pub fn fhe(&self) -> &Arc<FheContext> {
        &self.fhe
    }

    pub fn identity(&self) -> &dyn IdentityOracle {
        &*self.identity
    }

    pub fn agents(&self) -> &dyn AgentRoles {
        &*self.agents
    }

    /// Current time as seen by the token's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Guards & helpers
    // -----------------------------------------------------------------------

    fn require_agent(&self, account: Address) -> Result<(), TokenError> {
        if !self.agents.has_agent_role(self.address, account) {
            return Err(TokenError::NotAgent(account));
        }
        Ok(())
    }

    fn require_verified(&self, wallet: Address) -> Result<(), TokenError> {
        if !self.identity.is_verified(self.address, wallet) {
            return Err(TokenError::UnverifiedIdentity(wallet));
        }
        Ok(())
    }

    fn require_not_frozen(&self, account: Address) -> Result<(), TokenError> {
        if self.is_frozen(account) {
            return Err(TokenError::AddressFrozen(account));
        }
        Ok(())
    }

    fn require_handle(&self, value: Euint64, account: Address) -> Result<(), TokenError> {
        if !self.fhe.is_allowed(value, account) {
            return Err(TokenError::HandleNotAllowed {
                handle: value.handle(),
                account,
            });
        }
        Ok(())
    }

    fn stored_or_zero(
        fhe: &FheContext,
        map: &HashMap<Address, Euint64>,
        account: Address,
    ) -> Result<Euint64, TokenError> {
        match map.get(&account) {
            Some(&v) => Ok(v),
            None => {
                let zero = fhe.trivial_encrypt(0)?;
                fhe.allow(zero, account)?;
                Ok(zero)
            }
        }
    }

    /// Store a holder's new balance and let them read it.
    fn store_balance(&mut self, account: Address, value: Euint64) -> Result<(), TokenError> {
        self.fhe.allow(value, account)?;
        self.balances.insert(account, value);
        Ok(())
    }

    fn store_frozen(&mut self, account: Address, value: Euint64) -> Result<(), TokenError> {
        self.fhe.allow(value, account)?;
        self.frozen_tokens.insert(account, value);
        Ok(())
    }

    fn store_total_supply(&mut self, value: Euint64) -> Result<(), TokenError> {
        self.fhe.allow(value, self.owner)?;
        self.total_supply = value;
        Ok(())
    }

    /// Grant every listed account read access to `value`.
    fn share(&self, value: Euint64, accounts: &[Address]) -> Result<(), TokenError> {
        for &account in accounts {
            self.fhe.allow(value, account)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ConfidentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfidentialToken")
            .field("address", &self.address)
            .field("symbol", &self.symbol)
            .field("paused", &self.paused)
            .field("holders", &self.balances.len())
            .field("compliance", &self.compliance.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A token wired to in-memory collaborators.

    use super::*;
    use shroud_protocol::clock::ManualClock;
    use shroud_protocol::identity::{AgentRegistry, IdentityRegistry};

    pub const FRANCE: u16 = 250;

    pub struct Harness {
        pub token: ConfidentialToken,
        pub fhe: Arc<FheContext>,
        pub identity: Arc<IdentityRegistry>,
        pub agents: Arc<AgentRegistry>,
        pub clock: Arc<ManualClock>,
        pub owner: Address,
        pub agent: Address,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_symbol("TST")
        }

        pub fn with_symbol(symbol: &str) -> Self {
            let fhe = Arc::new(FheContext::new());
            let identity = Arc::new(IdentityRegistry::new());
            let agents = Arc::new(AgentRegistry::new());
            let clock = Arc::new(ManualClock::default());
            let owner = Address::derive("owner");
            let agent = Address::derive("agent");

            let config = TokenConfig {
                name: "Test Share".into(),
                symbol: symbol.into(),
                decimals: 6,
                owner,
            };
            agents.add_agent(config.address(), agent);
            let compliance = ComplianceEngine::new(
                Address::derive(&format!("compliance/{symbol}")),
                owner,
                Arc::clone(&fhe),
            );
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

        pub fn holder(&self, label: &str) -> Address {
            let wallet = Address::derive(label);
            self.identity.enroll(self.token.address(), wallet, FRANCE);
            wallet
        }

        /// An amount `account` may use.
        pub fn amount(&self, account: Address, v: u64) -> Euint64 {
            let input = self.fhe.encrypt_input(v, account).unwrap();
            self.fhe.verify_input(&input, account).unwrap()
        }

        pub fn mint(&mut self, to: Address, v: u64) {
            let amount = self.amount(self.agent, v);
            self.token.mint(self.agent, to, amount).unwrap();
        }

        pub fn balance(&self, account: Address) -> u64 {
            let b = self.token.balance_of(account).unwrap();
            self.fhe.decrypt(b, account).unwrap()
        }

        pub fn frozen(&self, account: Address) -> u64 {
            let f = self.token.frozen_tokens(account).unwrap();
            self.fhe.decrypt(f, account).unwrap()
        }

        pub fn read(&self, v: Euint64, account: Address) -> u64 {
            self.fhe.decrypt(v, account).unwrap()
        }
    }
}
