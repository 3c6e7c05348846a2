//! The approval manager: criteria registry, escrow and transfer records.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use shroud_protocol::config::MAX_ADDITIONAL_APPROVERS;
use shroud_protocol::fhe::{EncryptedInput, Euint64, FheError};
use shroud_protocol::identity::Address;

use super::criteria::{ApprovalCriteria, CriteriaHash};
use super::transfer::{
    ApprovalOutcome, Approver, DelegatedApproval, Transfer, TransferId, TransferStatus,
};
use crate::events::{Event, EventLog};
use crate::token::{ConfidentialToken, TokenError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during approval-gated transfers.
#[derive(Debug, Error)]
pub enum DvaError {
    #[error("no approval criteria registered for token {0}")]
    TokenNotRegistered(Address),

    #[error("{0} is not an agent of the token")]
    NotTokenAgent(Address),

    /// The manager must hold a verified identity to receive escrow.
    #[error("manager {0} is not identity-verified for the token")]
    ManagerNotVerified(Address),

    #[error("too many additional approvers: {count} (max {max})")]
    TooManyApprovers { count: usize, max: usize },

    #[error("criteria would leave transfers without approvers")]
    NoApprovers,

    #[error("zero address")]
    ZeroAddress,

    #[error("recipient {0} is not identity-verified for the token")]
    RecipientNotVerified(Address),

    #[error("unknown transfer {0}")]
    UnknownTransfer(TransferId),

    #[error("transfer {id} is {status}, not pending")]
    TransferNotPending { id: TransferId, status: TransferStatus },

    #[error("{0} is not a pending approver of this transfer")]
    ApproverNotFound(Address),

    #[error("approvals must be given in order; {0} is not next")]
    ApprovalsMustBeSequential(Address),

    #[error("only the sender may cancel (caller {0})")]
    OnlySender(Address),

    #[error("no signatures supplied")]
    EmptySignatures,

    #[error("delegated approval signature does not verify")]
    InvalidSignature,

    /// The token passed in is not the asset of the transfer.
    #[error("transfer belongs to token {expected}, got {actual}")]
    TokenMismatch { expected: Address, actual: Address },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Fhe(#[from] FheError),
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Escrowing, multi-approver transfer manager. One manager may serve any
/// number of tokens; each token registers its own criteria.
#[derive(Debug)]
pub struct ApprovalTransferManager {
    address: Address,
    criteria: HashMap<Address, ApprovalCriteria>,
    transfers: HashMap<TransferId, Transfer>,
    tx_nonce: u64,
    events: EventLog,
}

impl ApprovalTransferManager {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            criteria: HashMap::new(),
            transfers: HashMap::new(),
            tx_nonce: 0,
            events: EventLog::new(),
        }
    }

    /// Register or replace the approval criteria of `token`. Transfers already
    /// in flight pick up the change the next time they are touched.
    pub fn set_approval_criteria(
        &mut self,
        token: &ConfidentialToken,
        caller: Address,
        include_recipient_approver: bool,
        include_agent_approver: bool,
        sequential_approval: bool,
        additional_approvers: Vec<Address>,
    ) -> Result<CriteriaHash, DvaError> {
        let asset = token.address();
        if !token.agents().has_agent_role(asset, caller) {
            return Err(DvaError::NotTokenAgent(caller));
        }
        if !token.identity().is_verified(asset, self.address) {
            return Err(DvaError::ManagerNotVerified(self.address));
        }
        if additional_approvers.len() > MAX_ADDITIONAL_APPROVERS {
            return Err(DvaError::TooManyApprovers {
                count: additional_approvers.len(),
                max: MAX_ADDITIONAL_APPROVERS,
            });
        }
        if additional_approvers.iter().any(Address::is_zero) {
            return Err(DvaError::ZeroAddress);
        }

        let criteria = ApprovalCriteria::new(
            asset,
            include_recipient_approver,
            include_agent_approver,
            sequential_approval,
            additional_approvers,
        );
        if criteria.approver_count() == 0 {
            return Err(DvaError::NoApprovers);
        }

        let hash = criteria.hash;
        info!(token = %asset, %hash, approvers = criteria.approver_count(), "approval criteria set");
        self.events.emit(Event::ApprovalCriteriaSet {
            asset,
            include_recipient_approver: criteria.include_recipient_approver,
            include_agent_approver: criteria.include_agent_approver,
            sequential_approval: criteria.sequential_approval,
            additional_approvers: criteria.additional_approvers.clone(),
            hash,
        });
        self.criteria.insert(asset, criteria);
        Ok(hash)
    }

    /// Escrow up to the encrypted amount from `caller` and open a pending
    /// transfer to `recipient`. The caller must have approved the manager as
    /// a spender. The escrowed amount is clamped like any `transfer_from`,
    /// with compliance judging the `caller -> recipient` movement; settlement
    /// later moves exactly that amount.
    pub fn initiate_transfer(
        &mut self,
        token: &mut ConfidentialToken,
        caller: Address,
        recipient: Address,
        input: &EncryptedInput,
    ) -> Result<TransferId, DvaError> {
        let asset = token.address();
        let criteria = self.criteria_for(asset)?;
        let (criteria_hash, approvers) = (criteria.hash, criteria.approvers_for(recipient));
        if recipient.is_zero() {
            return Err(DvaError::ZeroAddress);
        }
        if !token.identity().is_verified(asset, recipient) {
            return Err(DvaError::RecipientNotVerified(recipient));
        }

        let fhe = token.fhe().clone();
        let requested = fhe.verify_input(input, caller)?;
        fhe.allow(requested, self.address)?;
        let actual = token.escrow_from(self.address, caller, recipient, requested)?;

        let id = TransferId::compute(self.tx_nonce, caller, recipient, requested);
        self.tx_nonce += 1;

        let now = token.now();
        self.transfers.insert(
            id,
            Transfer {
                id,
                asset,
                sender: caller,
                recipient,
                requested_amount: requested,
                actual_amount: actual,
                status: TransferStatus::Pending,
                approvers,
                criteria_hash,
                created_at: now,
                updated_at: now,
            },
        );
        info!(%id, token = %asset, sender = %caller, %recipient, "transfer initiated");
        self.events.emit(Event::TransferInitiated {
            id,
            asset,
            sender: caller,
            recipient,
            requested_amount: requested,
            actual_amount: actual,
            criteria_hash,
        });
        Ok(id)
    }

    /// Record `caller`'s approval. The last approval releases the escrow to
    /// the recipient.
    pub fn approve_transfer(
        &mut self,
        token: &mut ConfidentialToken,
        caller: Address,
        id: TransferId,
    ) -> Result<ApprovalOutcome, DvaError> {
        let now = token.now();
        let mut draft = self.pending(token, id)?.clone();
        let mut staged = Vec::new();

        let outcome = self.stage_approval(token, &mut draft, caller, now, &mut staged)?;
        if outcome == ApprovalOutcome::Completed {
            self.release(token, &mut draft, &mut staged)?;
        }
        self.commit(draft, staged);
        Ok(outcome)
    }

    /// Apply a batch of off-line approvals. Each signature names its approver;
    /// approvals are recorded in order under the same rules as
    /// [`approve_transfer`](Self::approve_transfer). A criteria reset stops the
    /// batch. Either the whole batch applies or nothing does.
    pub fn delegate_approve_transfer(
        &mut self,
        token: &mut ConfidentialToken,
        id: TransferId,
        approvals: &[DelegatedApproval],
    ) -> Result<ApprovalOutcome, DvaError> {
        if approvals.is_empty() {
            return Err(DvaError::EmptySignatures);
        }
        let now = token.now();
        let mut draft = self.pending(token, id)?.clone();
        let mut staged = Vec::new();

        let mut outcome = ApprovalOutcome::Approved {
            remaining: draft.pending_approvals(),
        };
        for approval in approvals {
            let signer = approval
                .recover(self.address, id)
                .ok_or(DvaError::InvalidSignature)?;
            outcome = self.stage_approval(token, &mut draft, signer, now, &mut staged)?;
            if !matches!(outcome, ApprovalOutcome::Approved { .. }) {
                break;
            }
        }
        if outcome == ApprovalOutcome::Completed {
            self.release(token, &mut draft, &mut staged)?;
        }
        self.commit(draft, staged);
        Ok(outcome)
    }

    /// Refuse the transfer and return the escrow to the sender. Only a
    /// pending approver may reject, in order when approvals are sequential.
    pub fn reject_transfer(
        &mut self,
        token: &mut ConfidentialToken,
        caller: Address,
        id: TransferId,
    ) -> Result<ApprovalOutcome, DvaError> {
        let now = token.now();
        let mut draft = self.pending(token, id)?.clone();
        let mut staged = Vec::new();

        let criteria = self.criteria_for(draft.asset)?;
        if Self::reset_if_stale(&mut draft, criteria, now, &mut staged) {
            self.commit(draft, staged);
            return Ok(ApprovalOutcome::Reset);
        }
        let is_agent = token.agents().has_agent_role(draft.asset, caller);
        Self::match_approver(&draft.approvers, criteria.sequential_approval, caller, is_agent)?;

        self.refund(token, &mut draft, TransferStatus::Rejected, now)?;
        info!(%id, rejected_by = %caller, "transfer rejected");
        staged.push(Event::TransferRejected {
            id,
            rejected_by: caller,
        });
        self.commit(draft, staged);
        Ok(ApprovalOutcome::Rejected)
    }

    /// Withdraw a pending transfer. Sender only.
    pub fn cancel_transfer(
        &mut self,
        token: &mut ConfidentialToken,
        caller: Address,
        id: TransferId,
    ) -> Result<(), DvaError> {
        let now = token.now();
        let mut draft = self.pending(token, id)?.clone();
        if caller != draft.sender {
            return Err(DvaError::OnlySender(caller));
        }

        self.refund(token, &mut draft, TransferStatus::Cancelled, now)?;
        info!(%id, "transfer cancelled");
        self.commit(draft, vec![Event::TransferCancelled { id }]);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn get_transfer(&self, id: TransferId) -> Option<&Transfer> {
        self.transfers.get(&id)
    }

    pub fn get_approval_criteria(&self, asset: Address) -> Option<&ApprovalCriteria> {
        self.criteria.get(&asset)
    }

    /// The first approver still to approve, or `None` for unknown or
    /// non-pending transfers.
    pub fn get_next_approver(&self, id: TransferId) -> Option<&Approver> {
        self.transfers
            .get(&id)
            .filter(|t| t.status == TransferStatus::Pending)
            .and_then(Transfer::next_approver)
    }

    pub fn get_next_tx_nonce(&self) -> u64 {
        self.tx_nonce
    }

    /// The id a transfer would get at `nonce`.
    pub fn calculate_transfer_id(
        &self,
        nonce: u64,
        sender: Address,
        recipient: Address,
        amount: Euint64,
    ) -> TransferId {
        TransferId::compute(nonce, sender, recipient, amount)
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn criteria_for(&self, asset: Address) -> Result<&ApprovalCriteria, DvaError> {
        self.criteria
            .get(&asset)
            .ok_or(DvaError::TokenNotRegistered(asset))
    }

    fn pending(&self, token: &ConfidentialToken, id: TransferId) -> Result<&Transfer, DvaError> {
        let transfer = self
            .transfers
            .get(&id)
            .ok_or(DvaError::UnknownTransfer(id))?;
        if transfer.asset != token.address() {
            return Err(DvaError::TokenMismatch {
                expected: transfer.asset,
                actual: token.address(),
            });
        }
        if transfer.status != TransferStatus::Pending {
            return Err(DvaError::TransferNotPending {
                id,
                status: transfer.status,
            });
        }
        Ok(transfer)
    }

    /// Rebuild the approver list if the asset's criteria changed since the
    /// transfer last saw them. Returns whether a reset happened.
    fn reset_if_stale(
        draft: &mut Transfer,
        criteria: &ApprovalCriteria,
        now: DateTime<Utc>,
        staged: &mut Vec<Event>,
    ) -> bool {
        if draft.criteria_hash == criteria.hash {
            return false;
        }
        warn!(id = %draft.id, old = %draft.criteria_hash, new = %criteria.hash, "approval criteria changed; approvals reset");
        draft.approvers = criteria.approvers_for(draft.recipient);
        draft.criteria_hash = criteria.hash;
        draft.updated_at = now;
        staged.push(Event::TransferApprovalStateReset {
            id: draft.id,
            criteria_hash: criteria.hash,
        });
        true
    }

    /// Index of the unapproved slot `caller` fills.
    fn match_approver(
        approvers: &[Approver],
        sequential: bool,
        caller: Address,
        caller_is_agent: bool,
    ) -> Result<usize, DvaError> {
        let mut open = approvers
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.approved)
            .peekable();
        if sequential {
            if let Some(&(index, next)) = open.peek() {
                if next.wallet.matches(caller, caller_is_agent) {
                    return Ok(index);
                }
            }
            return if open.any(|(_, a)| a.wallet.matches(caller, caller_is_agent)) {
                Err(DvaError::ApprovalsMustBeSequential(caller))
            } else {
                Err(DvaError::ApproverNotFound(caller))
            };
        }
        open.find(|(_, a)| a.wallet.matches(caller, caller_is_agent))
            .map(|(index, _)| index)
            .ok_or(DvaError::ApproverNotFound(caller))
    }

    /// Record one approval on the draft, or reset it if criteria changed.
    fn stage_approval(
        &self,
        token: &ConfidentialToken,
        draft: &mut Transfer,
        approver: Address,
        now: DateTime<Utc>,
        staged: &mut Vec<Event>,
    ) -> Result<ApprovalOutcome, DvaError> {
        let criteria = self.criteria_for(draft.asset)?;
        if Self::reset_if_stale(draft, criteria, now, staged) {
            return Ok(ApprovalOutcome::Reset);
        }

        let is_agent = token.agents().has_agent_role(draft.asset, approver);
        let index =
            Self::match_approver(&draft.approvers, criteria.sequential_approval, approver, is_agent)?;
        draft.approvers[index].approved = true;
        draft.updated_at = now;
        debug!(id = %draft.id, %approver, slot = index, "approval recorded");
        staged.push(Event::TransferApproved {
            id: draft.id,
            approver,
        });

        Ok(match draft.pending_approvals() {
            0 => ApprovalOutcome::Completed,
            remaining => ApprovalOutcome::Approved { remaining },
        })
    }

    /// Forward exactly the escrowed amount to the recipient and complete the
    /// draft.
    fn release(
        &self,
        token: &mut ConfidentialToken,
        draft: &mut Transfer,
        staged: &mut Vec<Event>,
    ) -> Result<(), DvaError> {
        let amount = token.release_escrow(
            self.address,
            draft.sender,
            draft.recipient,
            draft.actual_amount,
        )?;
        token.fhe().allow(amount, draft.sender)?;
        draft.status = TransferStatus::Completed;
        info!(id = %draft.id, recipient = %draft.recipient, "transfer completed");
        staged.push(Event::TransferCompleted {
            id: draft.id,
            asset: draft.asset,
            sender: draft.sender,
            recipient: draft.recipient,
            amount,
        });
        Ok(())
    }

    /// Return exactly the escrowed amount to the sender and close the draft.
    fn refund(
        &self,
        token: &mut ConfidentialToken,
        draft: &mut Transfer,
        status: TransferStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DvaError> {
        token.refund_escrow(self.address, draft.sender, draft.actual_amount)?;
        draft.status = status;
        draft.updated_at = now;
        Ok(())
    }

    fn commit(&mut self, draft: Transfer, staged: Vec<Event>) {
        self.transfers.insert(draft.id, draft);
        self.events.extend(staged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::testing::{Harness, FRANCE};
    use shroud_protocol::crypto::keys::Keypair;

    struct Setup {
        h: Harness,
        dva: ApprovalTransferManager,
        alice: Address,
        bob: Address,
    }

    fn setup(include_recipient: bool, include_agent: bool, sequential: bool) -> Setup {
        setup_with(include_recipient, include_agent, sequential, vec![])
    }

    fn setup_with(
        include_recipient: bool,
        include_agent: bool,
        sequential: bool,
        additional: Vec<Address>,
    ) -> Setup {
        let mut h = Harness::new();
        let dva = ApprovalTransferManager::new(Address::derive("dva"));
        h.identity.enroll(h.token.address(), dva.address(), FRANCE);
        let alice = h.holder("alice");
        let bob = h.holder("bob");
        h.mint(alice, 100);

        let mut s = Setup { h, dva, alice, bob };
        s.dva
            .set_approval_criteria(
                &s.h.token,
                s.h.agent,
                include_recipient,
                include_agent,
                sequential,
                additional,
            )
            .unwrap();
        s
    }

    impl Setup {
        fn initiate(&mut self, v: u64) -> TransferId {
            let allowance = self.h.amount(self.alice, v);
            self.h
                .token
                .approve(self.alice, self.dva.address(), allowance)
                .unwrap();
            let input = self.h.fhe.encrypt_input(v, self.alice).unwrap();
            self.dva
                .initiate_transfer(&mut self.h.token, self.alice, self.bob, &input)
                .unwrap()
        }

        fn escrow(&self) -> u64 {
            let b = self.h.token.balance_of(self.dva.address()).unwrap();
            self.h.fhe.decrypt(b, self.dva.address()).unwrap()
        }
    }

    #[test]
    fn criteria_validation() {
        let mut s = setup(true, false, false);
        let token = &s.h.token;
        assert!(matches!(
            s.dva.set_approval_criteria(token, s.alice, true, false, false, vec![]),
            Err(DvaError::NotTokenAgent(_))
        ));
        assert!(matches!(
            s.dva.set_approval_criteria(token, s.h.agent, false, false, false, vec![]),
            Err(DvaError::NoApprovers)
        ));
        let six = (0..6).map(|i| Address::derive(&format!("officer-{i}"))).collect();
        assert!(matches!(
            s.dva.set_approval_criteria(token, s.h.agent, false, false, false, six),
            Err(DvaError::TooManyApprovers { count: 6, max: 5 })
        ));
        assert!(matches!(
            s.dva
                .set_approval_criteria(token, s.h.agent, false, false, false, vec![Address::ZERO]),
            Err(DvaError::ZeroAddress)
        ));

        let mut unverified = ApprovalTransferManager::new(Address::derive("dva-2"));
        assert!(matches!(
            unverified.set_approval_criteria(token, s.h.agent, true, false, false, vec![]),
            Err(DvaError::ManagerNotVerified(_))
        ));
    }

    #[test]
    fn initiate_escrows_and_increments_nonce() {
        let mut s = setup(true, false, false);
        assert_eq!(s.dva.get_next_tx_nonce(), 0);
        let id = s.initiate(40);

        assert_eq!(s.dva.get_next_tx_nonce(), 1);
        assert_eq!(s.escrow(), 40);
        assert_eq!(s.h.balance(s.alice), 60);

        let transfer = s.dva.get_transfer(id).unwrap();
        assert_eq!(transfer.status, TransferStatus::Pending);
        assert_eq!(
            s.dva
                .calculate_transfer_id(0, s.alice, s.bob, transfer.requested_amount),
            id
        );
        assert_eq!(s.h.read(transfer.actual_amount, s.bob), 40);
    }

    #[test]
    fn initiate_requires_registered_token_and_verified_recipient() {
        let mut s = setup(true, false, false);
        let input = s.h.fhe.encrypt_input(1, s.alice).unwrap();
        assert!(matches!(
            s.dva
                .initiate_transfer(&mut s.h.token, s.alice, Address::derive("ghost"), &input),
            Err(DvaError::RecipientNotVerified(_))
        ));

        let mut fresh = ApprovalTransferManager::new(Address::derive("dva-2"));
        assert!(matches!(
            fresh.initiate_transfer(&mut s.h.token, s.alice, s.bob, &input),
            Err(DvaError::TokenNotRegistered(_))
        ));
    }

    #[test]
    fn single_approval_completes() {
        let mut s = setup(true, false, false);
        let id = s.initiate(25);
        assert_eq!(
            s.dva.approve_transfer(&mut s.h.token, s.bob, id).unwrap(),
            ApprovalOutcome::Completed
        );
        assert_eq!(s.h.balance(s.bob), 25);
        assert_eq!(s.escrow(), 0);
        assert_eq!(
            s.dva.get_transfer(id).unwrap().status,
            TransferStatus::Completed
        );
        assert!(matches!(
            s.dva.approve_transfer(&mut s.h.token, s.bob, id),
            Err(DvaError::TransferNotPending { .. })
        ));
        assert!(s.dva.get_next_approver(id).is_none());
    }

    #[test]
    fn stranger_cannot_approve() {
        let mut s = setup(true, true, false);
        let id = s.initiate(5);
        let stranger = Address::derive("stranger");
        assert!(matches!(
            s.dva.approve_transfer(&mut s.h.token, stranger, id),
            Err(DvaError::ApproverNotFound(_))
        ));
        assert!(matches!(
            s.dva.approve_transfer(&mut s.h.token, s.h.agent, id).unwrap(),
            ApprovalOutcome::Approved { remaining: 1 }
        ));
        assert!(matches!(
            s.dva.approve_transfer(&mut s.h.token, s.h.agent, id),
            Err(DvaError::ApproverNotFound(_))
        ));
    }

    #[test]
    fn reject_returns_escrow() {
        let mut s = setup(true, true, true);
        let id = s.initiate(30);
        assert!(matches!(
            s.dva.reject_transfer(&mut s.h.token, s.h.agent, id),
            Err(DvaError::ApprovalsMustBeSequential(_))
        ));
        assert_eq!(
            s.dva.reject_transfer(&mut s.h.token, s.bob, id).unwrap(),
            ApprovalOutcome::Rejected
        );
        assert_eq!(s.h.balance(s.alice), 100);
        assert_eq!(s.escrow(), 0);
        assert_eq!(s.dva.get_transfer(id).unwrap().status, TransferStatus::Rejected);
    }

    #[test]
    fn token_mismatch_rejected() {
        let mut s = setup(true, false, false);
        let id = s.initiate(5);
        let mut other = Harness::with_symbol("OTH");
        assert!(matches!(
            s.dva.approve_transfer(&mut other.token, s.bob, id),
            Err(DvaError::TokenMismatch { .. })
        ));
    }

    #[test]
    fn delegated_batch_is_atomic() {
        let officer = Keypair::generate();
        let auditor = Keypair::generate();
        let outsider = Keypair::generate();
        let approvers = vec![
            Address::from_public_key(&officer.public_key()),
            Address::from_public_key(&auditor.public_key()),
        ];
        let mut s = setup_with(false, false, false, approvers);
        let id = s.initiate(10);
        let manager = s.dva.address();

        assert!(matches!(
            s.dva.delegate_approve_transfer(&mut s.h.token, id, &[]),
            Err(DvaError::EmptySignatures)
        ));

        let events_before = s.dva.events().len();
        let batch = [
            DelegatedApproval::sign(&officer, manager, id),
            DelegatedApproval::sign(&outsider, manager, id),
        ];
        assert!(matches!(
            s.dva.delegate_approve_transfer(&mut s.h.token, id, &batch),
            Err(DvaError::ApproverNotFound(_))
        ));
        assert_eq!(s.dva.events().len(), events_before);
        assert_eq!(s.dva.get_transfer(id).unwrap().pending_approvals(), 2);

        let forged = DelegatedApproval::sign(&officer, Address::derive("elsewhere"), id);
        assert!(matches!(
            s.dva.delegate_approve_transfer(&mut s.h.token, id, &[forged]),
            Err(DvaError::InvalidSignature)
        ));

        let batch = [
            DelegatedApproval::sign(&officer, manager, id),
            DelegatedApproval::sign(&auditor, manager, id),
        ];
        assert_eq!(
            s.dva
                .delegate_approve_transfer(&mut s.h.token, id, &batch)
                .unwrap(),
            ApprovalOutcome::Completed
        );
        assert_eq!(s.h.balance(s.bob), 10);
        assert_eq!(s.escrow(), 0);
    }
}
