//! Transfers and allowances.
//!
//! Every transfer follows the same pipeline:
//!
//! 1. plaintext gates (pause, frozen addresses, verified recipient) reject;
//! 2. the requested amount is clamped to what the sender can move;
//! 3. the compliance verdict clamps it again, possibly to zero;
//! 4. balances commit, the engine is notified and a record is emitted.

use tracing::debug;

use shroud_protocol::fhe::{clamp, Euint64};
use shroud_protocol::identity::Address;

use super::{ConfidentialToken, TokenError};
use crate::events::Event;

impl ConfidentialToken {
    /// Move up to `amount` from `caller` to `to`. Returns the amount that
    /// actually moved.
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_handle(amount, caller)?;
        self.transfer_gates(caller, to)?;

        let free = self.free_balance(caller)?;
        let capped = clamp::min(&self.fhe, amount, free)?;
        let actual = self.settle(caller, to, capped)?;
        self.share(actual, &[caller, to])?;
        Ok(actual)
    }

    /// Move up to `amount` from `from` to `to` on behalf of `spender`. The
    /// allowance shrinks by the amount that actually moved.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_handle(amount, spender)?;
        self.transfer_gates(from, to)?;

        let allowance = self.allowance(from, spender)?;
        let free = self.free_balance(from)?;
        let capped = clamp::min(&self.fhe, amount, free)?;
        let capped = clamp::min(&self.fhe, capped, allowance)?;
        let actual = self.settle(from, to, capped)?;

        let remaining = self.fhe.sub(allowance, actual)?;
        self.share(remaining, &[from, spender])?;
        self.allowances.insert((from, spender), remaining);
        self.share(actual, &[from, to, spender])?;
        Ok(actual)
    }

    /// Set the allowance of `spender` over `owner`'s balance.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Euint64,
    ) -> Result<(), TokenError> {
        self.require_handle(amount, owner)?;
        self.set_allowance(owner, spender, amount)
    }

    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Euint64,
    ) -> Result<(), TokenError> {
        self.require_handle(amount, owner)?;
        let current = self.allowance(owner, spender)?;
        let next = self.fhe.add(current, amount)?;
        self.set_allowance(owner, spender, next)
    }

    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Euint64,
    ) -> Result<(), TokenError> {
        self.require_handle(amount, owner)?;
        let current = self.allowance(owner, spender)?;
        let next = self.fhe.sub(current, amount)?;
        self.set_allowance(owner, spender, next)
    }

    /// Agent transfer. Skips the compliance verdict and address freezes but
    /// still requires a verified recipient. When the free balance does not
    /// cover the amount, exactly the missing part is unfrozen.
    pub fn forced_transfer(
        &mut self,
        agent: Address,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_agent(agent)?;
        self.require_handle(amount, agent)?;
        if from.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.require_verified(to)?;

        let actual = self.take_with_unfreeze(from, amount)?;
        let to_balance = self.balance_of(to)?;
        let to_balance = self.fhe.add(to_balance, actual)?;
        self.store_balance(to, to_balance)?;
        self.share(actual, &[agent, from, to])?;

        let env = token_env!(self);
        self.compliance.transferred(&env, from, to, actual)?;
        self.events.emit(Event::Transfer {
            from,
            to,
            amount: actual,
        });
        Ok(actual)
    }

    // -----------------------------------------------------------------------
    // Escrow
    // -----------------------------------------------------------------------

    /// Move up to `amount` from `from` into `escrow`, spending `escrow`'s
    /// allowance. The compliance verdict is taken for `from -> beneficiary`,
    /// the movement the escrow will eventually complete, and modules are not
    /// notified until [`release_escrow`](Self::release_escrow).
    pub fn escrow_from(
        &mut self,
        escrow: Address,
        from: Address,
        beneficiary: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_handle(amount, escrow)?;
        self.transfer_gates(from, escrow)?;
        self.transfer_gates(from, beneficiary)?;

        let allowance = self.allowance(from, escrow)?;
        let free = self.free_balance(from)?;
        let capped = clamp::min(&self.fhe, amount, free)?;
        let capped = clamp::min(&self.fhe, capped, allowance)?;
        let env = token_env!(self);
        let verdict = self.compliance.can_transfer(&env, from, beneficiary, capped)?;
        let actual = verdict.apply(&self.fhe, capped)?;
        debug!(token = %self.address, %from, %escrow, %beneficiary, ?verdict, "escrowed");

        self.move_balance(from, escrow, actual)?;
        let remaining = self.fhe.sub(allowance, actual)?;
        self.share(remaining, &[from, escrow])?;
        self.allowances.insert((from, escrow), remaining);
        self.share(actual, &[from, escrow, beneficiary])?;
        self.events.emit(Event::Transfer {
            from,
            to: escrow,
            amount: actual,
        });
        Ok(actual)
    }

    /// Pay `amount` held by `escrow` out to `to`, exactly. The verdict was
    /// taken when the funds were escrowed; the engine now learns of the
    /// movement as `from -> to`.
    pub fn release_escrow(
        &mut self,
        escrow: Address,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        let paid = self.pay_out_escrow(escrow, to, amount)?;
        let env = token_env!(self);
        self.compliance.transferred(&env, from, to, paid)?;
        Ok(paid)
    }

    /// Return `amount` held by `escrow` to `to`, the original sender,
    /// exactly. Modules never saw the escrow leg, so they are not told.
    pub fn refund_escrow(
        &mut self,
        escrow: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.pay_out_escrow(escrow, to, amount)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn pay_out_escrow(
        &mut self,
        escrow: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        self.require_handle(amount, escrow)?;
        self.transfer_gates(escrow, to)?;

        let held = self.balance_of(escrow)?;
        let paid = clamp::min(&self.fhe, amount, held)?;
        self.move_balance(escrow, to, paid)?;
        self.share(paid, &[escrow, to])?;
        self.events.emit(Event::Transfer {
            from: escrow,
            to,
            amount: paid,
        });
        Ok(paid)
    }

    fn transfer_gates(&self, from: Address, to: Address) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused);
        }
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.require_not_frozen(from)?;
        self.require_not_frozen(to)?;
        self.require_verified(to)
    }

    /// `balance - frozen` of `account`.
    pub(super) fn free_balance(&self, account: Address) -> Result<Euint64, TokenError> {
        let balance = self.balance_of(account)?;
        let frozen = self.frozen_tokens(account)?;
        Ok(clamp::available(&self.fhe, balance, frozen)?)
    }

    /// Apply the compliance verdict to `capped`, commit both balances and
    /// notify the engine.
    fn settle(
        &mut self,
        from: Address,
        to: Address,
        capped: Euint64,
    ) -> Result<Euint64, TokenError> {
        let env = token_env!(self);
        let verdict = self.compliance.can_transfer(&env, from, to, capped)?;
        let actual = verdict.apply(&self.fhe, capped)?;
        debug!(token = %self.address, %from, %to, ?verdict, "transfer settled");

        self.move_balance(from, to, actual)?;

        let env = token_env!(self);
        self.compliance.transferred(&env, from, to, actual)?;
        self.events.emit(Event::Transfer {
            from,
            to,
            amount: actual,
        });
        Ok(actual)
    }

    fn move_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: Euint64,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from)?;
        let from_balance = self.fhe.sub(from_balance, amount)?;
        self.store_balance(from, from_balance)?;
        let to_balance = self.balance_of(to)?;
        let to_balance = self.fhe.add(to_balance, amount)?;
        self.store_balance(to, to_balance)
    }

    /// Remove up to `amount` from `from`'s balance, unfreezing whatever part
    /// of it was frozen. Used by forced transfers and burns.
    pub(super) fn take_with_unfreeze(
        &mut self,
        from: Address,
        amount: Euint64,
    ) -> Result<Euint64, TokenError> {
        let balance = self.balance_of(from)?;
        let frozen = self.frozen_tokens(from)?;
        let actual = clamp::min(&self.fhe, amount, balance)?;
        let free = clamp::available(&self.fhe, balance, frozen)?;
        let to_unfreeze = clamp::shortfall(&self.fhe, actual, free)?;

        let frozen = self.fhe.sub(frozen, to_unfreeze)?;
        self.store_frozen(from, frozen)?;
        self.share(to_unfreeze, &[from])?;
        self.events.emit(Event::TokensUnfrozen {
            account: from,
            amount: to_unfreeze,
        });

        let balance = self.fhe.sub(balance, actual)?;
        self.store_balance(from, balance)?;
        Ok(actual)
    }

    fn set_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Euint64,
    ) -> Result<(), TokenError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.share(amount, &[owner, spender])?;
        self.allowances.insert((owner, spender), amount);
        self.events.emit(Event::Approval {
            owner,
            spender,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;

    #[test]
    fn transfer_within_balance() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 100);

        let amount = h.amount(alice, 30);
        let actual = h.token.transfer(alice, bob, amount).unwrap();
        assert_eq!(h.read(actual, bob), 30);
        assert_eq!(h.balance(alice), 70);
        assert_eq!(h.balance(bob), 30);
    }

    #[test]
    fn transfer_over_balance_moves_balance() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 40);
        h.mint(bob, 5);

        let amount = h.amount(alice, 1_000);
        let actual = h.token.transfer(alice, bob, amount).unwrap();
        assert_eq!(h.read(actual, alice), 40);
        assert_eq!(h.balance(alice), 0);
        assert_eq!(h.balance(bob), 45);
    }

    #[test]
    fn transfer_respects_frozen_tokens() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 100);
        let freeze = h.amount(h.agent, 80);
        h.token.freeze_partial_tokens(h.agent, alice, freeze).unwrap();

        let amount = h.amount(alice, 50);
        h.token.transfer(alice, bob, amount).unwrap();
        assert_eq!(h.balance(alice), 80);
        assert_eq!(h.balance(bob), 20);
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        h.mint(alice, 10);
        let amount = h.amount(alice, 4);
        h.token.transfer(alice, alice, amount).unwrap();
        assert_eq!(h.balance(alice), 10);
    }

    #[test]
    fn foreign_handle_rejected() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 10);
        let bobs_amount = h.amount(bob, 10);
        assert!(matches!(
            h.token.transfer(alice, bob, bobs_amount),
            Err(TokenError::HandleNotAllowed { .. })
        ));
    }

    #[test]
    fn gates_reject() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let unverified = Address::derive("unverified");
        h.mint(alice, 10);
        let amount = h.amount(alice, 1);

        assert!(matches!(
            h.token.transfer(alice, unverified, amount),
            Err(TokenError::UnverifiedIdentity(_))
        ));
        assert!(matches!(
            h.token.transfer(alice, Address::ZERO, amount),
            Err(TokenError::ZeroAddress)
        ));
        h.token.pause(h.agent).unwrap();
        let bob = h.holder("bob");
        assert!(matches!(
            h.token.transfer(alice, bob, amount),
            Err(TokenError::Paused)
        ));
    }

    #[test]
    fn allowance_lifecycle() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let spender = Address::derive("spender");

        let a = h.amount(alice, 50);
        h.token.approve(alice, spender, a).unwrap();
        let a = h.amount(alice, 20);
        h.token.increase_allowance(alice, spender, a).unwrap();
        assert_eq!(h.read(h.token.allowance(alice, spender).unwrap(), spender), 70);

        let a = h.amount(alice, 100);
        h.token.decrease_allowance(alice, spender, a).unwrap();
        assert_eq!(h.read(h.token.allowance(alice, spender).unwrap(), alice), 0);
    }

    #[test]
    fn transfer_from_clamps_to_allowance() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        let spender = Address::derive("spender");
        h.mint(alice, 100);

        let a = h.amount(alice, 25);
        h.token.approve(alice, spender, a).unwrap();
        let request = h.amount(spender, 60);
        let actual = h.token.transfer_from(spender, alice, bob, request).unwrap();
        assert_eq!(h.read(actual, spender), 25);
        assert_eq!(h.balance(bob), 25);
        assert_eq!(h.read(h.token.allowance(alice, spender).unwrap(), spender), 0);
    }

    #[test]
    fn forced_transfer_unfreezes_shortfall() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 100);
        let freeze = h.amount(h.agent, 60);
        h.token.freeze_partial_tokens(h.agent, alice, freeze).unwrap();
        h.token.set_address_frozen(h.agent, alice, true).unwrap();

        let amount = h.amount(h.agent, 70);
        h.token.forced_transfer(h.agent, alice, bob, amount).unwrap();
        assert_eq!(h.balance(alice), 30);
        assert_eq!(h.frozen(alice), 30);
        assert_eq!(h.balance(bob), 70);

        let unfrozen = h
            .token
            .events()
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::TokensUnfrozen { amount, .. } => Some(*amount),
                _ => None,
            })
            .unwrap();
        assert_eq!(h.read(unfrozen, alice), 30);
    }

    #[test]
    fn forced_transfer_requires_agent_and_verified_recipient() {
        let mut h = Harness::new();
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 10);
        let amount = h.amount(alice, 5);
        assert!(matches!(
            h.token.forced_transfer(alice, alice, bob, amount),
            Err(TokenError::NotAgent(_))
        ));
        let amount = h.amount(h.agent, 5);
        assert!(matches!(
            h.token
                .forced_transfer(h.agent, alice, Address::derive("ghost"), amount),
            Err(TokenError::UnverifiedIdentity(_))
        ));
    }
}
