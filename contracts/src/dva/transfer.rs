//! Transfer records, approvers and delegated approvals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shroud_protocol::config::{DELEGATED_APPROVAL_PREFIX, TRANSFER_ID_PREFIX};
use shroud_protocol::crypto::hash::sha256_concat;
use shroud_protocol::crypto::keys::{Keypair, PublicKey, Signature};
use shroud_protocol::fhe::Euint64;
use shroud_protocol::identity::Address;

use super::criteria::CriteriaHash;

digest_newtype!(
    /// Deterministic transfer identifier:
    /// `SHA-256(prefix ‖ nonce ‖ sender ‖ recipient ‖ amount handle)`.
    TransferId
);

impl TransferId {
    pub fn compute(nonce: u64, sender: Address, recipient: Address, amount: Euint64) -> Self {
        let nonce = nonce.to_be_bytes();
        let handle = amount.handle();
        Self::from_bytes(sha256_concat(&[
            TRANSFER_ID_PREFIX,
            nonce.as_slice(),
            sender.as_bytes().as_slice(),
            recipient.as_bytes().as_slice(),
            handle.as_bytes().as_slice(),
        ]))
    }
}

/// Lifecycle of an approval-gated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Funds escrowed, waiting for approvals.
    Pending,
    /// Every approver approved; funds released to the recipient.
    Completed,
    /// Withdrawn by the sender; funds returned.
    Cancelled,
    /// Refused by an approver; funds returned.
    Rejected,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Pending => write!(f, "Pending"),
            TransferStatus::Completed => write!(f, "Completed"),
            TransferStatus::Cancelled => write!(f, "Cancelled"),
            TransferStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Who fills an approver slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum ApproverWallet {
    Wallet(Address),
    /// Any account holding the agent role for the asset.
    AnyTokenAgent,
}

impl ApproverWallet {
    pub fn matches(&self, caller: Address, caller_is_agent: bool) -> bool {
        match self {
            ApproverWallet::Wallet(w) => *w == caller,
            ApproverWallet::AnyTokenAgent => caller_is_agent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub wallet: ApproverWallet,
    pub approved: bool,
}

impl Approver {
    pub fn new(wallet: ApproverWallet) -> Self {
        Self {
            wallet,
            approved: false,
        }
    }
}

/// A transfer held by the approval manager. Records are kept forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    /// Address of the token being moved.
    pub asset: Address,
    pub sender: Address,
    pub recipient: Address,
    pub requested_amount: Euint64,
    /// What actually reached escrow after clamping.
    pub actual_amount: Euint64,
    pub status: TransferStatus,
    pub approvers: Vec<Approver>,
    pub criteria_hash: CriteriaHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// First approver that has not approved yet.
    pub fn next_approver(&self) -> Option<&Approver> {
        self.approvers.iter().find(|a| !a.approved)
    }

    pub fn pending_approvals(&self) -> usize {
        self.approvers.iter().filter(|a| !a.approved).count()
    }
}

/// Result of an approve or reject call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Criteria changed; the approver list was rebuilt and nothing recorded.
    Reset,
    /// Approval recorded; `remaining` approvals still needed.
    Approved { remaining: usize },
    /// Last approval recorded; funds released.
    Completed,
    /// Transfer rejected; funds returned.
    Rejected,
}

/// An approval signed off-line by an approver and submitted by anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedApproval {
    pub signer: PublicKey,
    pub signature: Signature,
}

impl DelegatedApproval {
    /// The digest an approver signs: `SHA-256(prefix ‖ manager ‖ id)`.
    pub fn digest(manager: Address, id: TransferId) -> [u8; 32] {
        sha256_concat(&[
            DELEGATED_APPROVAL_PREFIX,
            manager.as_bytes().as_slice(),
            id.as_bytes().as_slice(),
        ])
    }

    pub fn sign(keypair: &Keypair, manager: Address, id: TransferId) -> Self {
        Self {
            signer: keypair.public_key(),
            signature: keypair.sign(&Self::digest(manager, id)),
        }
    }

    /// Wallet address of the signer, or `None` if the signature does not
    /// verify for this manager and transfer.
    pub fn recover(&self, manager: Address, id: TransferId) -> Option<Address> {
        self.signer
            .verify(&Self::digest(manager, id), &self.signature)
            .then(|| Address::from_public_key(&self.signer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shroud_protocol::fhe::FheContext;

    #[test]
    fn id_depends_on_every_input() {
        let fhe = FheContext::new();
        let a = Address::derive("a");
        let b = Address::derive("b");
        let amount = fhe.trivial_encrypt(5).unwrap();
        let other = fhe.trivial_encrypt(5).unwrap();

        let id = TransferId::compute(0, a, b, amount);
        assert_eq!(id, TransferId::compute(0, a, b, amount));
        assert_ne!(id, TransferId::compute(1, a, b, amount));
        assert_ne!(id, TransferId::compute(0, b, a, amount));
        assert_ne!(id, TransferId::compute(0, a, b, other));
    }

    #[test]
    fn delegated_approval_recovers_signer() {
        let kp = Keypair::generate();
        let manager = Address::derive("manager");
        let id = TransferId::from_bytes([7u8; 32]);
        let approval = DelegatedApproval::sign(&kp, manager, id);

        assert_eq!(
            approval.recover(manager, id),
            Some(Address::from_public_key(&kp.public_key()))
        );
        assert_eq!(approval.recover(Address::derive("other"), id), None);
        assert_eq!(approval.recover(manager, TransferId::from_bytes([8u8; 32])), None);
    }

    #[test]
    fn any_agent_slot_matches_agents_only() {
        let caller = Address::derive("caller");
        assert!(ApproverWallet::AnyTokenAgent.matches(caller, true));
        assert!(!ApproverWallet::AnyTokenAgent.matches(caller, false));
        assert!(ApproverWallet::Wallet(caller).matches(caller, false));
        assert!(!ApproverWallet::Wallet(caller).matches(Address::derive("x"), true));
    }

    #[test]
    fn status_display() {
        assert_eq!(TransferStatus::Pending.to_string(), "Pending");
        assert!(TransferStatus::Rejected.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
    }
}
