//! # Country Allow
//!
//! A movement passes only if the recipient's investor country is on the
//! allow-list. Recipients without a registered country never pass.

use std::collections::HashSet;

use shroud_protocol::fhe::{Euint64, FheContext, Verdict};
use shroud_protocol::identity::Address;

use crate::compliance::module::{
    ComplianceModule, ModuleBinding, ModuleCall, ModuleEnv, ModuleError,
};

#[derive(Debug)]
pub struct CountryAllowModule {
    id: Address,
    binding: ModuleBinding,
    allowed: HashSet<(Address, u16)>,
}

impl CountryAllowModule {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            binding: ModuleBinding::default(),
            allowed: HashSet::new(),
        }
    }

    pub fn is_country_allowed(&self, compliance: Address, country: u16) -> bool {
        self.allowed.contains(&(compliance, country))
    }

    fn add(&mut self, compliance: Address, country: u16) -> Result<(), ModuleError> {
        if !self.allowed.insert((compliance, country)) {
            return Err(ModuleError::AlreadyListed);
        }
        Ok(())
    }
}

impl ComplianceModule for CountryAllowModule {
    fn id(&self) -> Address {
        self.id
    }

    fn name(&self) -> &'static str {
        "CountryAllowModule"
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
        _from: Address,
        to: Address,
        _amount: Euint64,
    ) -> Result<Verdict, ModuleError> {
        let allowed = env
            .identity
            .investor_country(to)
            .is_some_and(|c| self.is_country_allowed(env.compliance, c));
        Ok(Verdict::Plain(allowed))
    }

    fn handle_call(
        &mut self,
        compliance: Address,
        _fhe: &FheContext,
        call: ModuleCall,
    ) -> Result<(), ModuleError> {
        self.binding.require(compliance)?;
        match call {
            ModuleCall::AddAllowedCountry(country) => self.add(compliance, country),
            ModuleCall::RemoveAllowedCountry(country) => {
                if !self.allowed.remove(&(compliance, country)) {
                    return Err(ModuleError::NotListed);
                }
                Ok(())
            }
            ModuleCall::BatchAllowCountries(countries) => {
                if countries
                    .iter()
                    .any(|c| self.is_country_allowed(compliance, *c))
                {
                    return Err(ModuleError::AlreadyListed);
                }
                for country in countries {
                    self.allowed.insert((compliance, country));
                }
                Ok(())
            }
            other => Err(ModuleError::UnsupportedCall {
                module: self.name(),
                selector: other.selector(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::modules::testing::Fixture;

    const FRANCE: u16 = 250;
    const JAPAN: u16 = 392;

    #[test]
    fn recipient_country_decides() {
        let fx = Fixture::new();
        let alice = Address::derive("alice");
        let kenji = Address::derive("kenji");
        let nobody = Address::derive("nobody");
        fx.identity.enroll(fx.token, alice, FRANCE);
        fx.identity.enroll(fx.token, kenji, JAPAN);

        let mut module = CountryAllowModule::new(Address::derive("module/country"));
        module.bind_compliance(fx.compliance).unwrap();
        module
            .handle_call(fx.compliance, &fx.fhe, ModuleCall::AddAllowedCountry(FRANCE))
            .unwrap();

        let env = fx.env(fx.enc(0));
        let amount = fx.enc(1);
        assert_eq!(module.module_check(&env, kenji, alice, amount).unwrap(), Verdict::ALLOW);
        assert_eq!(module.module_check(&env, alice, kenji, amount).unwrap(), Verdict::DENY);
        assert_eq!(module.module_check(&env, alice, nobody, amount).unwrap(), Verdict::DENY);
    }

    #[test]
    fn list_maintenance() {
        let fx = Fixture::new();
        let mut module = CountryAllowModule::new(Address::derive("module/country"));
        module.bind_compliance(fx.compliance).unwrap();
        let c = fx.compliance;

        module
            .handle_call(c, &fx.fhe, ModuleCall::BatchAllowCountries(vec![FRANCE, JAPAN]))
            .unwrap();
        assert!(matches!(
            module.handle_call(c, &fx.fhe, ModuleCall::AddAllowedCountry(FRANCE)),
            Err(ModuleError::AlreadyListed)
        ));
        module
            .handle_call(c, &fx.fhe, ModuleCall::RemoveAllowedCountry(JAPAN))
            .unwrap();
        assert!(matches!(
            module.handle_call(c, &fx.fhe, ModuleCall::RemoveAllowedCountry(JAPAN)),
            Err(ModuleError::NotListed)
        ));
        assert!(module.is_country_allowed(c, FRANCE));
        assert!(!module.is_country_allowed(c, JAPAN));
    }
}
