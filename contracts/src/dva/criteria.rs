//! Per-asset approval criteria.

use serde::{Deserialize, Serialize};

use shroud_protocol::config::CRITERIA_HASH_DOMAIN;
use shroud_protocol::crypto::hash::tagged_hash;
use shroud_protocol::identity::Address;

use super::transfer::{Approver, ApproverWallet};

digest_newtype!(
    /// Content fingerprint of an asset's [`ApprovalCriteria`].
    CriteriaHash
);

/// Who must approve transfers of an asset, and in what order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalCriteria {
    pub asset: Address,
    pub include_recipient_approver: bool,
    pub include_agent_approver: bool,
    pub sequential_approval: bool,
    pub additional_approvers: Vec<Address>,
    pub hash: CriteriaHash,
}

impl ApprovalCriteria {
    pub fn new(
        asset: Address,
        include_recipient_approver: bool,
        include_agent_approver: bool,
        sequential_approval: bool,
        additional_approvers: Vec<Address>,
    ) -> Self {
        let hash = Self::compute_hash(
            asset,
            include_recipient_approver,
            include_agent_approver,
            sequential_approval,
            &additional_approvers,
        );
        Self {
            asset,
            include_recipient_approver,
            include_agent_approver,
            sequential_approval,
            additional_approvers,
            hash,
        }
    }

    /// BLAKE3 over the asset and every field, approvers in order.
    pub fn compute_hash(
        asset: Address,
        include_recipient_approver: bool,
        include_agent_approver: bool,
        sequential_approval: bool,
        additional_approvers: &[Address],
    ) -> CriteriaHash {
        let flags = [
            include_recipient_approver as u8,
            include_agent_approver as u8,
            sequential_approval as u8,
        ];
        let mut parts: Vec<&[u8]> = vec![asset.as_bytes().as_slice(), flags.as_slice()];
        parts.extend(additional_approvers.iter().map(|a| a.as_bytes().as_slice()));
        CriteriaHash::from_bytes(tagged_hash(CRITERIA_HASH_DOMAIN, &parts))
    }

    /// Number of approvers a transfer built from these criteria will have.
    pub fn approver_count(&self) -> usize {
        self.include_recipient_approver as usize
            + self.include_agent_approver as usize
            + self.additional_approvers.len()
    }

    /// Fresh, unapproved approver list for a transfer to `recipient`:
    /// recipient, then any agent, then the additional approvers.
    pub fn approvers_for(&self, recipient: Address) -> Vec<Approver> {
        let mut approvers = Vec::with_capacity(self.approver_count());
        if self.include_recipient_approver {
            approvers.push(Approver::new(ApproverWallet::Wallet(recipient)));
        }
        if self.include_agent_approver {
            approvers.push(Approver::new(ApproverWallet::AnyTokenAgent));
        }
        approvers.extend(
            self.additional_approvers
                .iter()
                .map(|&a| Approver::new(ApproverWallet::Wallet(a))),
        );
        approvers
    }
}
