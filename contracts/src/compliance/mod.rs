//! # Modular Compliance
//!
//! A [`ComplianceEngine`] decides whether a movement of value may happen,
//! by asking each of its [`ComplianceModule`]s. Modules answer with a
//! [`Verdict`](shroud_protocol::fhe::Verdict) that may itself be encrypted,
//! so a limit on a hidden counter can deny a transfer without anyone
//! learning that it did.

pub mod engine;
pub mod module;
pub mod modules;

pub use engine::{ComplianceEngine, ComplianceError, TokenEnv};
pub use module::{ComplianceModule, ModuleBinding, ModuleCall, ModuleEnv, ModuleError};
pub use modules::{
    CountryAllowModule, ExchangeMonthlyLimitsModule, SupplyLimitModule, TimeExchangeLimitsModule,
    TransferRestrictModule,
};
