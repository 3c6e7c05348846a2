//! # Compliance Engine
//!
//! Holds an ordered list of at most [`MAX_COMPLIANCE_MODULES`] modules and
//! exactly one bound token. The token asks the engine for a [`Verdict`]
//! before every movement and notifies it after every committed one; the
//! engine fans both out to its modules in insertion order.
//!
//! ## Authorization
//!
//! | operation               | who may call                                   |
//! |-------------------------|------------------------------------------------|
//! | `bind_token`            | owner, or the token itself while unbound       |
//! | `unbind_token`          | owner, or the bound token                      |
//! | `add_module`            | owner                                          |
//! | `remove_module`         | owner                                          |
//! | `call_module_function`  | owner                                          |
//! | `transferred` & friends | the bound token only                           |

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use shroud_protocol::config::MAX_COMPLIANCE_MODULES;
use shroud_protocol::fhe::{Euint64, FheContext, FheError, Handle, Verdict};
use shroud_protocol::identity::{Address, AgentRoles, IdentityOracle};

use super::module::{ComplianceModule, ModuleCall, ModuleEnv, ModuleError};
use crate::events::{Event, EventLog};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during compliance engine operations.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("only the compliance owner may do this (caller {0})")]
    OnlyOwner(Address),

    #[error("only the owner or the token may do this (caller {0})")]
    OnlyOwnerOrToken(Address),

    #[error("zero address")]
    ZeroAddress,

    /// `unbind_token` named a token that is not the bound one.
    #[error("token {0} is not bound to this compliance")]
    TokenNotBound(Address),

    /// A token hook was called by something other than the bound token.
    #[error("only the bound token may call this (caller {0})")]
    OnlyBoundToken(Address),

    #[error("module {0} is already bound")]
    ModuleAlreadyBound(Address),

    #[error("module {0} is not bound to this compliance")]
    ModuleNotBound(Address),

    #[error("cannot add more than {MAX_COMPLIANCE_MODULES} modules")]
    ModuleLimitReached,

    /// A non-plug-and-play module has not been prepared for this engine.
    #[error("module {0} cannot be bound to this compliance")]
    ComplianceNotBindable(Address),

    /// An encrypted argument is not on the caller's access list.
    #[error("caller {account} may not use handle {handle}")]
    HandleNotAllowed { handle: Handle, account: Address },

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Fhe(#[from] FheError),
}

// ---------------------------------------------------------------------------
// Token context
// ---------------------------------------------------------------------------

/// What the token passes the engine on every check and notification.
#[derive(Clone, Copy)]
pub struct TokenEnv<'a> {
    /// Address of the calling token.
    pub token: Address,
    pub identity: &'a dyn IdentityOracle,
    pub agents: &'a dyn AgentRoles,
    pub now: DateTime<Utc>,
    pub total_supply: Euint64,
}

fn module_env<'a>(compliance: Address, fhe: &'a FheContext, env: &TokenEnv<'a>) -> ModuleEnv<'a> {
    ModuleEnv {
        compliance,
        token: env.token,
        fhe,
        identity: env.identity,
        agents: env.agents,
        now: env.now,
        total_supply: env.total_supply,
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A modular compliance engine.
pub struct ComplianceEngine {
    address: Address,
    owner: Address,
    token_bound: Option<Address>,
    modules: Vec<Box<dyn ComplianceModule>>,
    fhe: Arc<FheContext>,
    events: EventLog,
}

impl ComplianceEngine {
    pub fn new(address: Address, owner: Address, fhe: Arc<FheContext>) -> Self {
        Self {
            address,
            owner,
            token_bound: None,
            modules: Vec::new(),
            fhe,
            events: EventLog::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn token_bound(&self) -> Option<Address> {
        self.token_bound
    }

    // -----------------------------------------------------------------------
    // Token binding
    // -----------------------------------------------------------------------

    /// Bind `token` to this engine.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::OnlyOwnerOrToken`] unless the caller is the
    /// owner, or is `token` itself while no token is bound.
    pub fn bind_token(&mut self, caller: Address, token: Address) -> Result<(), ComplianceError> {
        let self_bind = self.token_bound.is_none() && caller == token;
        if caller != self.owner && !self_bind {
            return Err(ComplianceError::OnlyOwnerOrToken(caller));
        }
        if token.is_zero() {
            return Err(ComplianceError::ZeroAddress);
        }

        self.token_bound = Some(token);
        info!(compliance = %self.address, %token, "token bound");
        self.events.emit(Event::TokenBound {
            compliance: self.address,
            token,
        });
        Ok(())
    }

    pub fn unbind_token(&mut self, caller: Address, token: Address) -> Result<(), ComplianceError> {
        if caller != self.owner && Some(caller) != self.token_bound {
            return Err(ComplianceError::OnlyOwnerOrToken(caller));
        }
        if token.is_zero() {
            return Err(ComplianceError::ZeroAddress);
        }
        if Some(token) != self.token_bound {
            return Err(ComplianceError::TokenNotBound(token));
        }

        self.token_bound = None;
        info!(compliance = %self.address, %token, "token unbound");
        self.events.emit(Event::TokenUnbound {
            compliance: self.address,
            token,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Module management
    // -----------------------------------------------------------------------

    /// Append `module` and bind it to this engine.
    pub fn add_module(
        &mut self,
        caller: Address,
        mut module: Box<dyn ComplianceModule>,
    ) -> Result<(), ComplianceError> {
        self.require_owner(caller)?;
        let id = module.id();
        if id.is_zero() {
            return Err(ComplianceError::ZeroAddress);
        }
        if self.is_module_bound(id) || module.binding().bound_to().is_some() {
            return Err(ComplianceError::ModuleAlreadyBound(id));
        }
        if self.modules.len() >= MAX_COMPLIANCE_MODULES {
            return Err(ComplianceError::ModuleLimitReached);
        }
        if !module.is_plug_and_play() && !module.can_compliance_bind(self.address) {
            return Err(ComplianceError::ComplianceNotBindable(id));
        }

        module.bind_compliance(self.address)?;
        let name = module.name();
        self.modules.push(module);

        info!(compliance = %self.address, module = %id, name, "module added");
        self.events.emit(Event::ModuleAdded {
            compliance: self.address,
            module: id,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Remove a module, preserving the order of the rest, and hand it back
    /// unbound.
    pub fn remove_module(
        &mut self,
        caller: Address,
        module_id: Address,
    ) -> Result<Box<dyn ComplianceModule>, ComplianceError> {
        self.require_owner(caller)?;
        let pos = self
            .modules
            .iter()
            .position(|m| m.id() == module_id)
            .ok_or(ComplianceError::ModuleNotBound(module_id))?;

        self.modules[pos].unbind_compliance(self.address)?;
        let module = self.modules.remove(pos);

        info!(compliance = %self.address, module = %module_id, "module removed");
        self.events.emit(Event::ModuleRemoved {
            compliance: self.address,
            module: module_id,
        });
        Ok(module)
    }

    pub fn is_module_bound(&self, module_id: Address) -> bool {
        self.modules.iter().any(|m| m.id() == module_id)
    }

    pub fn module(&self, module_id: Address) -> Option<&dyn ComplianceModule> {
        self.modules
            .iter()
            .find(|m| m.id() == module_id)
            .map(|m| m.as_ref())
    }

    /// Module ids in insertion order.
    pub fn module_ids(&self) -> Vec<Address> {
        self.modules.iter().map(|m| m.id()).collect()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Relay an administrative call to a bound module, as if the engine
    /// itself sent it.
    ///
    /// Every encrypted handle in `call` must be on the owner's access list;
    /// the module is granted access to those handles.
    pub fn call_module_function(
        &mut self,
        caller: Address,
        module_id: Address,
        call: ModuleCall,
    ) -> Result<(), ComplianceError> {
        self.require_owner(caller)?;
        let pos = self
            .modules
            .iter()
            .position(|m| m.id() == module_id && m.is_compliance_bound(self.address))
            .ok_or(ComplianceError::ModuleNotBound(module_id))?;

        let handles = call.handles();
        if let Some(&handle) = handles.iter().find(|h| !self.fhe.is_allowed(**h, caller)) {
            return Err(ComplianceError::HandleNotAllowed {
                handle,
                account: caller,
            });
        }
        for handle in handles {
            self.fhe.allow(handle, module_id)?;
        }

        let selector = call.selector();
        self.modules[pos].handle_call(self.address, &self.fhe, call)?;

        debug!(compliance = %self.address, module = %module_id, selector, "module call");
        self.events.emit(Event::ModuleInteraction {
            compliance: self.address,
            module: module_id,
            selector: selector.to_string(),
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Checks & notifications
    // -----------------------------------------------------------------------

    /// Conjunction of every module's verdict, in insertion order. A plaintext
    /// denial stops evaluation.
    pub fn can_transfer(
        &self,
        env: &TokenEnv<'_>,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Verdict, ComplianceError> {
        let menv = module_env(self.address, &self.fhe, env);
        let mut verdict = Verdict::ALLOW;
        for module in &self.modules {
            let v = module.module_check(&menv, from, to, amount)?;
            verdict = verdict.and(v, &self.fhe)?;
            if verdict.is_denied() {
                debug!(compliance = %self.address, module = module.name(), "movement denied");
                break;
            }
        }
        Ok(verdict)
    }

    /// Post-transfer notification from the bound token.
    pub fn transferred(
        &mut self,
        env: &TokenEnv<'_>,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<(), ComplianceError> {
        self.require_bound_token(env.token)?;
        if from.is_zero() || to.is_zero() {
            return Err(ComplianceError::ZeroAddress);
        }
        let menv = module_env(self.address, &self.fhe, env);
        for module in self.modules.iter_mut() {
            module.module_transfer_action(&menv, from, to, amount)?;
        }
        Ok(())
    }

    /// Post-mint notification from the bound token.
    pub fn created(
        &mut self,
        env: &TokenEnv<'_>,
        to: Address,
        amount: Euint64,
    ) -> Result<(), ComplianceError> {
        self.require_bound_token(env.token)?;
        if to.is_zero() {
            return Err(ComplianceError::ZeroAddress);
        }
        let menv = module_env(self.address, &self.fhe, env);
        for module in self.modules.iter_mut() {
            module.module_mint_action(&menv, to, amount)?;
        }
        Ok(())
    }

    /// Post-burn notification from the bound token.
    pub fn destroyed(
        &mut self,
        env: &TokenEnv<'_>,
        from: Address,
        amount: Euint64,
    ) -> Result<(), ComplianceError> {
        self.require_bound_token(env.token)?;
        if from.is_zero() {
            return Err(ComplianceError::ZeroAddress);
        }
        let menv = module_env(self.address, &self.fhe, env);
        for module in self.modules.iter_mut() {
            module.module_burn_action(&menv, from, amount)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    fn require_owner(&self, caller: Address) -> Result<(), ComplianceError> {
        if caller != self.owner {
            return Err(ComplianceError::OnlyOwner(caller));
        }
        Ok(())
    }

    fn require_bound_token(&self, caller: Address) -> Result<(), ComplianceError> {
        if self.token_bound != Some(caller) {
            return Err(ComplianceError::OnlyBoundToken(caller));
        }
        Ok(())
    }
}

impl fmt::Debug for ComplianceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplianceEngine")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("token_bound", &self.token_bound)
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
