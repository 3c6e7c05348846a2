//! # Transfer Restrict
//!
//! An allow-list of wallets. A movement passes if its sender or its
//! recipient is on the list.

use std::collections::HashSet;

use shroud_protocol::fhe::{Euint64, FheContext, Verdict};
use shroud_protocol::identity::Address;

use crate::compliance::module::{
    ComplianceModule, ModuleBinding, ModuleCall, ModuleEnv, ModuleError,
};

#[derive(Debug)]
pub struct TransferRestrictModule {
    id: Address,
    binding: ModuleBinding,
    allowed: HashSet<(Address, Address)>,
}

impl TransferRestrictModule {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            binding: ModuleBinding::default(),
            allowed: HashSet::new(),
        }
    }

    pub fn is_user_allowed(&self, compliance: Address, user: Address) -> bool {
        self.allowed.contains(&(compliance, user))
    }
}

impl ComplianceModule for TransferRestrictModule {
    fn id(&self) -> Address {
        self.id
    }

    fn name(&self) -> &'static str {
        "TransferRestrictModule"
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
        to: Address,
        _amount: Euint64,
    ) -> Result<Verdict, ModuleError> {
        Ok(Verdict::Plain(
            self.is_user_allowed(env.compliance, from) || self.is_user_allowed(env.compliance, to),
        ))
    }

    fn handle_call(
        &mut self,
        compliance: Address,
        _fhe: &FheContext,
        call: ModuleCall,
    ) -> Result<(), ModuleError> {
        self.binding.require(compliance)?;
        match call {
            ModuleCall::AllowUser(user) => {
                self.allowed.insert((compliance, user));
            }
            ModuleCall::DisallowUser(user) => {
                self.allowed.remove(&(compliance, user));
            }
            ModuleCall::BatchAllowUsers(users) => {
                self.allowed.extend(users.into_iter().map(|u| (compliance, u)));
            }
            other => {
                return Err(ModuleError::UnsupportedCall {
                    module: self.name(),
                    selector: other.selector(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::modules::testing::Fixture;

    #[test]
    fn sender_or_recipient_suffices() {
        let fx = Fixture::new();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let carol = Address::derive("carol");
        let mut module = TransferRestrictModule::new(Address::derive("module/restrict"));
        module.bind_compliance(fx.compliance).unwrap();
        module
            .handle_call(fx.compliance, &fx.fhe, ModuleCall::AllowUser(alice))
            .unwrap();

        let env = fx.env(fx.enc(0));
        let amount = fx.enc(1);
        assert_eq!(module.module_check(&env, alice, bob, amount).unwrap(), Verdict::ALLOW);
        assert_eq!(module.module_check(&env, bob, alice, amount).unwrap(), Verdict::ALLOW);
        assert_eq!(module.module_check(&env, bob, carol, amount).unwrap(), Verdict::DENY);

        module
            .handle_call(fx.compliance, &fx.fhe, ModuleCall::BatchAllowUsers(vec![bob, carol]))
            .unwrap();
        module
            .handle_call(fx.compliance, &fx.fhe, ModuleCall::DisallowUser(alice))
            .unwrap();
        assert!(!module.is_user_allowed(fx.compliance, alice));
        assert_eq!(module.module_check(&env, bob, carol, amount).unwrap(), Verdict::ALLOW);
    }
}
