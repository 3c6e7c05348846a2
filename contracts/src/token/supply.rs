//! Supply changes and partial freezes. All agent-only.

use tracing::info;

use shroud_protocol::fhe::{clamp, Euint64};
use shroud_protocol::identity::Address;

use super::{ConfidentialToken, TokenError};
use crate::events::Event;

impl ConfidentialToken {
    /// Mint up to `amount` to `to`. The compliance verdict is evaluated as a
    /// movement from the zero address and may clamp the mint to zero.
    pub fn mint(
        &mut self,
        agent: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_agent(agent)?;
        self.mint_gates(agent, to, amount)?;
        self.mint_unchecked(agent, to, amount)
    }

    /// Mint to several recipients. Every recipient and amount is checked
    /// before anything is minted; each entry is then clamped on its own.
    pub fn batch_mint(
        &mut self,
        agent: Address,
        entries: &[(Address, Euint64)],
    ) -> Result<Vec<Euint64>, TokenError> {
        self.require_agent(agent)?;
        for &(to, amount) in entries {
            self.mint_gates(agent, to, amount)?;
        }
        entries
            .iter()
            .map(|&(to, amount)| self.mint_unchecked(agent, to, amount))
            .collect()
    }

    /// Burn up to `amount` from `from`, unfreezing whatever part of the burnt
    /// amount was frozen.
    pub fn burn(
        &mut self,
        agent: Address,
        from: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_agent(agent)?;
        self.require_handle(amount, agent)?;
        if from.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.require_verified(from)?;

        let actual = self.take_with_unfreeze(from, amount)?;
        let supply = self.fhe.sub(self.total_supply, actual)?;
        self.store_total_supply(supply)?;
        self.share(actual, &[agent, from])?;

        let env = token_env!(self);
        self.compliance.destroyed(&env, from, actual)?;
        self.events.emit(Event::Transfer {
            from,
            to: Address::ZERO,
            amount: actual,
        });
        Ok(actual)
    }

    /// Freeze up to `amount` more of `account`'s balance. Never freezes more
    /// than is currently unfrozen.
    pub fn freeze_partial_tokens(
        &mut self,
        agent: Address,
        account: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_agent(agent)?;
        self.require_handle(amount, agent)?;

        let free = self.free_balance(account)?;
        let delta = clamp::min(&self.fhe, amount, free)?;
        let frozen = self.frozen_tokens(account)?;
        let frozen = self.fhe.add(frozen, delta)?;
        self.store_frozen(account, frozen)?;
        self.share(delta, &[agent, account])?;

        self.events.emit(Event::TokensFrozen {
            account,
            amount: delta,
        });
        Ok(delta)
    }

    /// Unfreeze up to `amount` of `account`'s frozen tokens.
    pub fn unfreeze_partial_tokens(
        &mut self,
        agent: Address,
        account: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_agent(agent)?;
        self.require_handle(amount, agent)?;

        let frozen = self.frozen_tokens(account)?;
        let delta = clamp::min(&self.fhe, amount, frozen)?;
        let frozen = self.fhe.sub(frozen, delta)?;
        self.store_frozen(account, frozen)?;
        self.share(delta, &[agent, account])?;

        self.events.emit(Event::TokensUnfrozen {
            account,
            amount: delta,
        });
        Ok(delta)
    }

    fn mint_gates(&self, agent: Address, to: Address, amount: Euint64) -> Result<(), TokenError> {
        self.require_handle(amount, agent)?;
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.require_verified(to)
    }

    fn mint_unchecked(
        &mut self,
        agent: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        let env = token_env!(self);
        let verdict = self.compliance.can_transfer(&env, Address::ZERO, to, amount)?;
        let actual = verdict.apply(&self.fhe, amount)?;

        let supply = self.fhe.add(self.total_supply, actual)?;
        self.store_total_supply(supply)?;
        let balance = self.balance_of(to)?;
        let balance = self.fhe.add(balance, actual)?;
        self.store_balance(to, balance)?;
        self.share(actual, &[agent, to])?;

        let env = token_env!(self);
        self.compliance.created(&env, to, actual)?;
        info!(token = %self.address, %to, "minted");
        self.events.emit(Event::Transfer {
            from: Address::ZERO,
            to,
            amount: actual,
        });
        Ok(actual)
    }
}
