//! # Supply Limit
//!
//! Caps total supply. Only mints are checked; with no limit configured,
//! minting is unrestricted.

use std::collections::HashMap;

use shroud_protocol::fhe::{clamp, Euint64, FheContext, Verdict};
use shroud_protocol::identity::Address;

use crate::compliance::module::{
    ComplianceModule, ModuleBinding, ModuleCall, ModuleEnv, ModuleError,
};

#[derive(Debug)]
pub struct SupplyLimitModule {
    id: Address,
    binding: ModuleBinding,
    limits: HashMap<Address, Euint64>,
}

impl SupplyLimitModule {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            binding: ModuleBinding::default(),
            limits: HashMap::new(),
        }
    }

    pub fn supply_limit(&self, compliance: Address) -> Option<Euint64> {
        self.limits.get(&compliance).copied()
    }
}

impl ComplianceModule for SupplyLimitModule {
    fn id(&self) -> Address {
        self.id
    }

    fn name(&self) -> &'static str {
        "SupplyLimitModule"
    }

    fn binding(&self) -> &ModuleBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ModuleBinding {
        &mut self.binding
    }

    fn module_check(
        &self,
        env: &ModuleEnv<'_>,
        from: Address,
        _to: Address,
        amount: Euint64,
    ) -> Result<Verdict, ModuleError> {
        if !from.is_zero() {
            return Ok(Verdict::ALLOW);
        }
        match self.limits.get(&env.compliance) {
            None => Ok(Verdict::ALLOW),
            Some(&limit) => Ok(Verdict::Encrypted(clamp::fits_within(
                env.fhe,
                env.total_supply,
                amount,
                limit,
            )?)),
        }
    }

    fn handle_call(
        &mut self,
        compliance: Address,
        _fhe: &FheContext,
        call: ModuleCall,
    ) -> Result<(), ModuleError> {
        self.binding.require(compliance)?;
        match call {
            ModuleCall::SetSupplyLimit(limit) => {
                self.limits.insert(compliance, limit);
                Ok(())
            }
            other => Err(ModuleError::UnsupportedCall {
                module: self.name(),
                selector: other.selector(),
            }),
        }
    }
}
