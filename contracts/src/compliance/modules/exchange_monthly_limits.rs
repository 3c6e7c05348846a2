//! # Exchange Monthly Limits
//!
//! Caps how much a single investor may deposit into a tagged exchange within
//! a rolling 30-day window. The limit and the running counter are both
//! encrypted, so the verdict is encrypted too: an over-limit deposit moves
//! zero and nobody watching can tell.
//!
//! Only transfers from a non-exchange, non-agent sender into a tagged
//! exchange are tracked. A tagged exchange without a limit accepts nothing.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use shroud_protocol::config::EXCHANGE_MONTH_WINDOW_SECS;
use shroud_protocol::fhe::{clamp, Euint64, FheContext, Verdict};
use shroud_protocol::identity::{Address, IdentityId};

use crate::compliance::module::{
    ComplianceModule, ModuleBinding, ModuleCall, ModuleEnv, ModuleError,
};

/// Running deposit counter of one investor into one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeCounter {
    pub value: Euint64,
    pub window_start: DateTime<Utc>,
}

impl ExchangeCounter {
    /// `true` once `window_secs` have passed since the window opened. A
    /// window whose end is past the representable range never elapses.
    pub fn window_elapsed(&self, now: DateTime<Utc>, window_secs: i64) -> bool {
        Duration::try_seconds(window_secs)
            .and_then(|window| self.window_start.checked_add_signed(window))
            .is_some_and(|end| now >= end)
    }

    /// Counter after adding `amount` at `now`: restarted if the window
    /// elapsed, accumulated (saturating) otherwise.
    pub(crate) fn advance(
        current: Option<&ExchangeCounter>,
        fhe: &FheContext,
        now: DateTime<Utc>,
        window_secs: i64,
        amount: Euint64,
    ) -> Result<ExchangeCounter, ModuleError> {
        Ok(match current {
            Some(c) if !c.window_elapsed(now, window_secs) => ExchangeCounter {
                value: fhe.add(c.value, amount)?,
                window_start: c.window_start,
            },
            _ => ExchangeCounter {
                value: amount,
                window_start: now,
            },
        })
    }

    /// Would `amount` more stay within `limit` at `now`?
    pub(crate) fn admits(
        current: Option<&ExchangeCounter>,
        fhe: &FheContext,
        now: DateTime<Utc>,
        window_secs: i64,
        amount: Euint64,
        limit: Euint64,
    ) -> Result<Verdict, ModuleError> {
        let within = match current {
            Some(c) if !c.window_elapsed(now, window_secs) => {
                clamp::fits_within(fhe, c.value, amount, limit)?
            }
            _ => fhe.le(amount, limit)?,
        };
        Ok(Verdict::Encrypted(within))
    }
}

type ExchangeKey = (Address, IdentityId);
type CounterKey = (Address, IdentityId, IdentityId);

/// Per-investor monthly deposit limits into tagged exchanges.
#[derive(Debug)]
pub struct ExchangeMonthlyLimitsModule {
    id: Address,
    binding: ModuleBinding,
    exchanges: HashSet<ExchangeKey>,
    limits: HashMap<ExchangeKey, Euint64>,
    counters: HashMap<CounterKey, ExchangeCounter>,
}

impl ExchangeMonthlyLimitsModule {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            binding: ModuleBinding::default(),
            exchanges: HashSet::new(),
            limits: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    pub fn is_exchange_id(&self, compliance: Address, identity: IdentityId) -> bool {
        self.exchanges.contains(&(compliance, identity))
    }

    pub fn exchange_monthly_limit(
        &self,
        compliance: Address,
        exchange: IdentityId,
    ) -> Option<Euint64> {
        self.limits.get(&(compliance, exchange)).copied()
    }

    pub fn exchange_counter(
        &self,
        compliance: Address,
        exchange: IdentityId,
        investor: IdentityId,
    ) -> Option<ExchangeCounter> {
        self.counters.get(&(compliance, exchange, investor)).copied()
    }

    /// `(exchange, investor)` if this movement is a tracked deposit.
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
        if !self.is_exchange_id(env.compliance, exchange)
            || self.is_exchange_id(env.compliance, investor)
        {
            return None;
        }
        Some((exchange, investor))
    }
}

impl ComplianceModule for ExchangeMonthlyLimitsModule {
    fn id(&self) -> Address {
        self.id
    }

    fn name(&self) -> &'static str {
        "ExchangeMonthlyLimitsModule"
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
        let Some(&limit) = self.limits.get(&(env.compliance, exchange)) else {
            return Ok(Verdict::DENY);
        };
        ExchangeCounter::admits(
            self.counters.get(&(env.compliance, exchange, investor)),
            env.fhe,
            env.now,
            EXCHANGE_MONTH_WINDOW_SECS,
            amount,
            limit,
        )
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

        let key = (env.compliance, exchange, investor);
        let next = ExchangeCounter::advance(
            self.counters.get(&key),
            env.fhe,
            env.now,
            EXCHANGE_MONTH_WINDOW_SECS,
            amount,
        )?;
        env.fhe.allow(next.value, self.id)?;
        debug!(%exchange, %investor, window_start = %next.window_start, "exchange counter updated");
        self.counters.insert(key, next);
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
            ModuleCall::AddExchangeId(exchange) => {
                if !self.exchanges.insert((compliance, exchange)) {
                    return Err(ModuleError::AlreadyListed);
                }
            }
            ModuleCall::RemoveExchangeId(exchange) => {
                if !self.exchanges.remove(&(compliance, exchange)) {
                    return Err(ModuleError::NotListed);
                }
            }
            ModuleCall::SetExchangeMonthlyLimit { exchange, limit } => {
                self.limits.insert((compliance, exchange), limit);
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
