//! # Time Exchange Limits
//!
//! Like the monthly module, but each exchange may carry up to
//! [`MAX_TIME_LIMITS_PER_EXCHANGE`] limits over windows of its own choosing
//! (say, one per day and one per week). A deposit must fit every one of
//! them. An exchange is tracked as soon as it has at least one limit.

use chrono::Duration;
use std::collections::HashMap;

use shroud_protocol::config::MAX_TIME_LIMITS_PER_EXCHANGE;
use shroud_protocol::fhe::{Euint64, FheContext, Verdict};
use shroud_protocol::identity::{Address, IdentityId};

use super::exchange_monthly_limits::ExchangeCounter;
use crate::compliance::module::{
    ComplianceModule, ModuleBinding, ModuleCall, ModuleEnv, ModuleError,
};

/// One `(window, limit)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeLimit {
    pub window_secs: i64,
    pub limit: Euint64,
}

type CounterKey = (Address, IdentityId, IdentityId, i64);

#[derive(Debug)]
pub struct TimeExchangeLimitsModule {
    id: Address,
    binding: ModuleBinding,
    limits: HashMap<(Address, IdentityId), Vec<ExchangeLimit>>,
    counters: HashMap<CounterKey, ExchangeCounter>,
}

impl TimeExchangeLimitsModule {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            binding: ModuleBinding::default(),
            limits: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    pub fn exchange_limits(&self, compliance: Address, exchange: IdentityId) -> &[ExchangeLimit] {
        self.limits
            .get(&(compliance, exchange))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn exchange_counter(
        &self,
        compliance: Address,
        exchange: IdentityId,
        investor: IdentityId,
        window_secs: i64,
    ) -> Option<ExchangeCounter> {
        self.counters
            .get(&(compliance, exchange, investor, window_secs))
            .copied()
    }

    fn is_exchange(&self, compliance: Address, identity: IdentityId) -> bool {
        !self.exchange_limits(compliance, identity).is_empty()
    }

    fn tracked(
        &self,
        env: &ModuleEnv<'_>,
        from: Address,
        to: Address,
    ) -> Option<(IdentityId, IdentityId)> {
        if env.is_agent(from) {
            return None;
        }
        let investor = env.identity_of(from)?;
        let exchange = env.identity_of(to)?;
        if !self.is_exchange(env.compliance, exchange) || self.is_exchange(env.compliance, investor)
        {
            return None;
        }
        Some((exchange, investor))
    }

    fn set_limit(
        &mut self,
        compliance: Address,
        exchange: IdentityId,
        window_secs: i64,
        limit: Euint64,
    ) -> Result<(), ModuleError> {
        if window_secs <= 0 || Duration::try_seconds(window_secs).is_none() {
            return Err(ModuleError::InvalidWindow(window_secs));
        }
        let limits = self.limits.entry((compliance, exchange)).or_default();
        if let Some(existing) = limits.iter_mut().find(|l| l.window_secs == window_secs) {
            existing.limit = limit;
            return Ok(());
        }
        if limits.len() >= MAX_TIME_LIMITS_PER_EXCHANGE {
            return Err(ModuleError::TooManyLimits(exchange));
        }
        limits.push(ExchangeLimit { window_secs, limit });
        Ok(())
    }
}

impl ComplianceModule for TimeExchangeLimitsModule {
    fn id(&self) -> Address {
        self.id
    }

    fn name(&self) -> &'static str {
        "TimeExchangeLimitsModule"
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
        amount: Euint64,
    ) -> Result<Verdict, ModuleError> {
        let Some((exchange, investor)) = self.tracked(env, from, to) else {
            return Ok(Verdict::ALLOW);
        };
        let mut verdict = Verdict::ALLOW;
        for limit in self.exchange_limits(env.compliance, exchange) {
            let key = (env.compliance, exchange, investor, limit.window_secs);
            let v = ExchangeCounter::admits(
                self.counters.get(&key),
                env.fhe,
                env.now,
                limit.window_secs,
                amount,
                limit.limit,
            )?;
            verdict = verdict.and(v, env.fhe)?;
        }
        Ok(verdict)
    }

    fn module_transfer_action(
        &mut self,
        env: &ModuleEnv<'_>,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<(), ModuleError> {
        self.binding.require(env.compliance)?;
        let Some((exchange, investor)) = self.tracked(env, from, to) else {
            return Ok(());
        };
        let windows: Vec<i64> = self
            .exchange_limits(env.compliance, exchange)
            .iter()
            .map(|l| l.window_secs)
            .collect();
        for window_secs in windows {
            let key = (env.compliance, exchange, investor, window_secs);
            let next = ExchangeCounter::advance(
                self.counters.get(&key),
                env.fhe,
                env.now,
                window_secs,
                amount,
            )?;
            env.fhe.allow(next.value, self.id)?;
            self.counters.insert(key, next);
        }
        Ok(())
    }

    fn handle_call(
        &mut self,
        compliance: Address,
        _fhe: &FheContext,
        call: ModuleCall,
    ) -> Result<(), ModuleError> {
        self.binding.require(compliance)?;
        match call {
            ModuleCall::SetExchangeTimeLimit {
                exchange,
                window_secs,
                limit,
            } => self.set_limit(compliance, exchange, window_secs, limit),
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

    const DAY: i64 = 24 * 60 * 60;

    fn set(module: &mut TimeExchangeLimitsModule, fx: &Fixture, ex: Address, window: i64, v: u64) {
        module
            .handle_call(
                fx.compliance,
                &fx.fhe,
                ModuleCall::SetExchangeTimeLimit {
                    exchange: IdentityId(ex),
                    window_secs: window,
                    limit: fx.enc(v),
                },
            )
            .unwrap();
    }

    #[test]
    fn at_most_four_windows() {
        let fx = Fixture::new();
        let ex = Address::derive("exchange");
        let mut module = TimeExchangeLimitsModule::new(Address::derive("module/tel"));
        module.bind_compliance(fx.compliance).unwrap();

        for days in 1..=4 {
            set(&mut module, &fx, ex, days * DAY, 100);
        }
        // Updating an existing window is not a new limit.
        set(&mut module, &fx, ex, DAY, 50);
        assert_eq!(module.exchange_limits(fx.compliance, IdentityId(ex)).len(), 4);

        let err = module
            .handle_call(
                fx.compliance,
                &fx.fhe,
                ModuleCall::SetExchangeTimeLimit {
                    exchange: IdentityId(ex),
                    window_secs: 5 * DAY,
                    limit: fx.enc(1),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ModuleError::TooManyLimits(_)));
    }

    #[test]
    fn windows_must_be_positive_and_representable() {
        let fx = Fixture::new();
        let ex = Address::derive("exchange");
        let mut module = TimeExchangeLimitsModule::new(Address::derive("module/tel"));
        module.bind_compliance(fx.compliance).unwrap();

        for window_secs in [0, -DAY, i64::MAX] {
            let err = module
                .handle_call(
                    fx.compliance,
                    &fx.fhe,
                    ModuleCall::SetExchangeTimeLimit {
                        exchange: IdentityId(ex),
                        window_secs,
                        limit: fx.enc(10),
                    },
                )
                .unwrap_err();
            assert!(matches!(err, ModuleError::InvalidWindow(w) if w == window_secs));
        }
        assert!(module.exchange_limits(fx.compliance, IdentityId(ex)).is_empty());
    }

    #[test]
    fn every_window_must_admit() {
        let mut fx = Fixture::new();
        let ex = Address::derive("exchange");
        let investor = Address::derive("investor");
        fx.identity.enroll(fx.token, ex, 250);
        fx.identity.enroll(fx.token, investor, 250);

        let mut module = TimeExchangeLimitsModule::new(Address::derive("module/tel"));
        module.bind_compliance(fx.compliance).unwrap();
        set(&mut module, &fx, ex, DAY, 30);
        set(&mut module, &fx, ex, 7 * DAY, 50);

        let supply = fx.enc(0);
        let deposit = |fx: &Fixture, module: &mut TimeExchangeLimitsModule, v: u64| {
            let amount = fx.enc(v);
            let env = fx.env(supply);
            let verdict = module.module_check(&env, investor, ex, amount).unwrap();
            let allowed = fx.allows(verdict);
            let actual = verdict.apply(&fx.fhe, amount).unwrap();
            module.module_transfer_action(&env, investor, ex, actual).unwrap();
            allowed
        };

        assert!(deposit(&fx, &mut module, 30));
        assert!(!deposit(&fx, &mut module, 1));

        fx.now += Duration::days(1);
        assert!(deposit(&fx, &mut module, 20));
        // Daily window is fresh, weekly one is at 50.
        assert!(!deposit(&fx, &mut module, 1));

        let weekly = module
            .exchange_counter(fx.compliance, IdentityId(ex), IdentityId(investor), 7 * DAY)
            .unwrap();
        assert_eq!(fx.dec(weekly.value), 50);
    }
}
