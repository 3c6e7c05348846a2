//! # Compliance Modules
//!
//! A compliance module is one pluggable policy. The engine calls four hooks
//! on it:
//!
//! 1. [`module_check`](ComplianceModule::module_check) before a movement,
//!    returning a [`Verdict`].
//! 2. [`module_transfer_action`](ComplianceModule::module_transfer_action),
//!    [`module_mint_action`](ComplianceModule::module_mint_action) and
//!    [`module_burn_action`](ComplianceModule::module_burn_action) after a
//!    movement commits, to update private counters.
//!
//! Every hook receives a [`ModuleEnv`] naming the calling engine, and every
//! mutating hook refuses to run for an engine the module is not bound to.
//! Module state is always keyed by the engine address first, so one module
//! type never leaks state between two engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shroud_protocol::fhe::{Euint64, FheContext, FheError, Handle, Verdict};
use shroud_protocol::identity::{Address, AgentRoles, IdentityId, IdentityOracle};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by compliance modules.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The hook was invoked on behalf of an engine this module is not bound to.
    #[error("only the bound compliance may call this module (caller {0})")]
    OnlyBoundCompliance(Address),

    #[error("module is already bound to compliance {0}")]
    AlreadyBound(Address),

    #[error("module is not bound to compliance {0}")]
    NotBound(Address),

    #[error("zero address")]
    ZeroAddress,

    /// The module does not understand the administrative call.
    #[error("module {module} does not support call `{selector}`")]
    UnsupportedCall {
        module: &'static str,
        selector: &'static str,
    },

    /// An exchange already carries the maximum number of time limits.
    #[error("exchange {0} already has the maximum number of time limits")]
    TooManyLimits(IdentityId),

    /// A limit window must be a positive number of seconds that a timestamp
    /// can be offset by.
    #[error("invalid limit window of {0} seconds")]
    InvalidWindow(i64),

    #[error("entry already listed")]
    AlreadyListed,

    #[error("entry not listed")]
    NotListed,

    #[error(transparent)]
    Fhe(#[from] FheError),
}

// ---------------------------------------------------------------------------
// Environment & binding
// ---------------------------------------------------------------------------

/// What a module may look at while its hook runs.
#[derive(Clone, Copy)]
pub struct ModuleEnv<'a> {
    /// The engine invoking the hook.
    pub compliance: Address,
    /// The token the engine is bound to.
    pub token: Address,
    pub fhe: &'a FheContext,
    pub identity: &'a dyn IdentityOracle,
    pub agents: &'a dyn AgentRoles,
    pub now: DateTime<Utc>,
    /// Total supply before the movement being checked.
    pub total_supply: Euint64,
}

impl ModuleEnv<'_> {
    pub fn is_agent(&self, account: Address) -> bool {
        self.agents.has_agent_role(self.token, account)
    }

    pub fn identity_of(&self, wallet: Address) -> Option<IdentityId> {
        self.identity.identity_of(wallet)
    }
}

/// Which engine, if any, a module is bound to. A module belongs to at most
/// one engine at a time; rebinding requires an unbind first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleBinding {
    compliance: Option<Address>,
}

impl ModuleBinding {
    pub fn bound_to(&self) -> Option<Address> {
        self.compliance
    }

    pub fn is_bound_to(&self, compliance: Address) -> bool {
        self.compliance == Some(compliance)
    }

    pub fn bind(&mut self, compliance: Address) -> Result<(), ModuleError> {
        if compliance.is_zero() {
            return Err(ModuleError::ZeroAddress);
        }
        if let Some(current) = self.compliance {
            return Err(ModuleError::AlreadyBound(current));
        }
        self.compliance = Some(compliance);
        Ok(())
    }

    pub fn unbind(&mut self, compliance: Address) -> Result<(), ModuleError> {
        if !self.is_bound_to(compliance) {
            return Err(ModuleError::NotBound(compliance));
        }
        self.compliance = None;
        Ok(())
    }

    /// Guard for hooks: `compliance` must be the bound engine.
    pub fn require(&self, compliance: Address) -> Result<(), ModuleError> {
        if self.is_bound_to(compliance) {
            Ok(())
        } else {
            Err(ModuleError::OnlyBoundCompliance(compliance))
        }
    }
}

// ---------------------------------------------------------------------------
// Administrative calls
// ---------------------------------------------------------------------------

/// Module-specific setup, routed through
/// [`ComplianceEngine::call_module_function`](super::ComplianceEngine::call_module_function).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", content = "args", rename_all = "snake_case")]
pub enum ModuleCall {
    AddExchangeId(IdentityId),
    RemoveExchangeId(IdentityId),
    SetExchangeMonthlyLimit {
        exchange: IdentityId,
        limit: Euint64,
    },
    SetExchangeTimeLimit {
        exchange: IdentityId,
        window_secs: i64,
        limit: Euint64,
    },
    SetSupplyLimit(Euint64),
    AllowUser(Address),
    DisallowUser(Address),
    BatchAllowUsers(Vec<Address>),
    AddAllowedCountry(u16),
    RemoveAllowedCountry(u16),
    BatchAllowCountries(Vec<u16>),
}

impl ModuleCall {
    pub fn selector(&self) -> &'static str {
        match self {
            ModuleCall::AddExchangeId(_) => "add_exchange_id",
            ModuleCall::RemoveExchangeId(_) => "remove_exchange_id",
            ModuleCall::SetExchangeMonthlyLimit { .. } => "set_exchange_monthly_limit",
            ModuleCall::SetExchangeTimeLimit { .. } => "set_exchange_time_limit",
            ModuleCall::SetSupplyLimit(_) => "set_supply_limit",
            ModuleCall::AllowUser(_) => "allow_user",
            ModuleCall::DisallowUser(_) => "disallow_user",
            ModuleCall::BatchAllowUsers(_) => "batch_allow_users",
            ModuleCall::AddAllowedCountry(_) => "add_allowed_country",
            ModuleCall::RemoveAllowedCountry(_) => "remove_allowed_country",
            ModuleCall::BatchAllowCountries(_) => "batch_allow_countries",
        }
    }

    /// Encrypted handles carried by the call.
    pub fn handles(&self) -> Vec<Handle> {
        match self {
            ModuleCall::SetExchangeMonthlyLimit { limit, .. }
            | ModuleCall::SetExchangeTimeLimit { limit, .. }
            | ModuleCall::SetSupplyLimit(limit) => vec![limit.handle()],
            _ => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// The trait
// ---------------------------------------------------------------------------

/// A pluggable compliance policy.
pub trait ComplianceModule: Send + Sync {
    /// Address of the module instance.
    fn id(&self) -> Address;

    fn name(&self) -> &'static str;

    fn binding(&self) -> &ModuleBinding;

    fn binding_mut(&mut self) -> &mut ModuleBinding;

    /// A plug-and-play module can join any engine. Others must first be
    /// prepared for a specific engine, which `can_compliance_bind` reports.
    fn is_plug_and_play(&self) -> bool {
        true
    }

    fn can_compliance_bind(&self, _compliance: Address) -> bool {
        true
    }

    fn bind_compliance(&mut self, compliance: Address) -> Result<(), ModuleError> {
        self.binding_mut().bind(compliance)
    }

    fn unbind_compliance(&mut self, compliance: Address) -> Result<(), ModuleError> {
        self.binding_mut().unbind(compliance)
    }

    fn is_compliance_bound(&self, compliance: Address) -> bool {
        self.binding().is_bound_to(compliance)
    }

    /// Would moving `amount` from `from` to `to` comply? `from` is the zero
    /// address for a mint.
    fn module_check(
        &self,
        env: &ModuleEnv<'_>,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Verdict, ModuleError>;

    fn module_transfer_action(
        &mut self,
        env: &ModuleEnv<'_>,
        _from: Address,
        _to: Address,
        _amount: Euint64,
    ) -> Result<(), ModuleError> {
        self.binding().require(env.compliance)
    }

    fn module_mint_action(
        &mut self,
        env: &ModuleEnv<'_>,
        _to: Address,
        _amount: Euint64,
    ) -> Result<(), ModuleError> {
        self.binding().require(env.compliance)
    }

    fn module_burn_action(
        &mut self,
        env: &ModuleEnv<'_>,
        _from: Address,
        _amount: Euint64,
    ) -> Result<(), ModuleError> {
        self.binding().require(env.compliance)
    }

    /// Administrative setup. `compliance` is the engine relaying the call.
    fn handle_call(
        &mut self,
        _compliance: Address,
        _fhe: &FheContext,
        call: ModuleCall,
    ) -> Result<(), ModuleError> {
        Err(ModuleError::UnsupportedCall {
            module: self.name(),
            selector: call.selector(),
        })
    }
}
